/*!
  An Intcode virtual machine.

  A program is a list of integers loaded into memory at address 0. The `Machine` fetches, decodes
  and executes one instruction at a time, and suspends whenever the program asks for input that
  has not been sent yet. Callers drive it with `send` and `read`:

  ```
  use intcode::{Machine, State};

  let mut machine: Machine = "3,0,4,0,99".parse().unwrap();
  assert_eq!(machine.read(), Ok(None));
  assert_eq!(machine.state(), State::AwaitingInput);

  machine.send(vec![7]).unwrap();
  assert_eq!(machine.read(), Ok(Some(7)));
  assert!(machine.is_terminated());
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

mod address;
pub mod bytecode;
mod error;
mod executor;
mod machine;
mod memory;
mod parser;
mod resolver;

pub use address::{Address, AddressNumberType};
pub use error::{AddressError, AssemblyError, DecodeError, MalformedProgramError, VmError};
pub use machine::{Machine, State};
pub use memory::{Memory, Value};
pub use parser::parse_program;
