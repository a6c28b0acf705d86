//! A non-negative memory address, with some convenience functions. A negative address can only
//! arise from a bug in the executed program, so conversion from a signed value is fallible and
//! never clamps or wraps.

use std::fmt::{Display, Formatter};
use std::ops::Add;

use crate::error::AddressError;
use crate::memory::Value;

// `AddressNumberType` is `usize`, as it is naturally an index into a memory store.
pub type AddressNumberType = usize;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
pub struct Address(AddressNumberType);

impl Address {
  pub const ZERO: Address = Address(0);

  pub fn new(idx: AddressNumberType) -> Address {
    Address(idx)
  }

  /// Converts the address to an index into a memory store.
  pub fn idx(&self) -> AddressNumberType {
    self.0
  }
}

impl TryFrom<Value> for Address {
  type Error = AddressError;

  fn try_from(value: Value) -> Result<Address, AddressError> {
    match AddressNumberType::try_from(value) {
      Ok(idx) => Ok(Address(idx)),
      Err(_)  => Err(AddressError(value))
    }
  }
}

impl From<AddressNumberType> for Address {
  fn from(idx: AddressNumberType) -> Address {
    Address(idx)
  }
}

impl From<Address> for Value {
  fn from(address: Address) -> Value {
    address.0 as Value
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{}]", self.0)
  }
}

// Increment an address
impl Add<AddressNumberType> for Address {
  type Output = Address;
  fn add(self, rhs: AddressNumberType) -> Address {
    Address(self.0 + rhs)
  }
}
