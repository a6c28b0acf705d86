//! Turns a raw parameter and its addressing mode into the value an instruction reads or the
//! address it writes.

use crate::address::Address;
use crate::bytecode::ParameterMode;
use crate::error::AddressError;
use crate::memory::{Memory, Value};

/// The address a position or relative parameter refers to.
fn target(mode: ParameterMode, raw: Value, relative_base: Value) -> Result<Address, AddressError> {
  match mode {
    // An overflowing sum is reported saturated, which is out of range either way.
    ParameterMode::Relative => {
      match raw.checked_add(relative_base) {
        Some(absolute) => Address::try_from(absolute),
        None           => Err(AddressError(raw.saturating_add(relative_base)))
      }
    }
    _ => Address::try_from(raw)
  }
}

/// Resolves a parameter that is read.
pub fn resolve_read(
  memory: &Memory,
  mode: ParameterMode,
  raw: Value,
  relative_base: Value
) -> Result<Value, AddressError> {
  match mode {
    ParameterMode::Immediate => Ok(raw),
    _                        => target(mode, raw, relative_base).map(|a| memory.read(a))
  }
}

/**
  Resolves a parameter that is written through.

  Note: Immediate mode is never legal for a destination. The decoder rejects it, so here it is
  treated like position mode rather than checked again.
*/
pub fn resolve_write(
  mode: ParameterMode,
  raw: Value,
  relative_base: Value
) -> Result<Address, AddressError> {
  target(mode, raw, relative_base)
}
