/*!
  The semantics of each opcode.

  `execute` is a pure function: it reads memory but never changes it. It describes what an
  instruction does as an ordered list of `Effect`s, which the machine applies afterwards. An
  instruction that fails therefore has no effect at all.
*/

use crate::address::Address;
use crate::bytecode::{Instruction, Opcode};
use crate::error::VmError;
use crate::memory::{Memory, Value};
use crate::resolver::{resolve_read, resolve_write};

/// A single change to machine state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Effect {
  /// Store a value in memory.
  Write { address: Address, value: Value },
  /// Move the instruction pointer past the current instruction.
  Advance,
  /// Move the instruction pointer to an absolute address.
  Jump(Address),
  /// Add to the relative base.
  AdjustRelativeBase(Value),
  /// Remove the front of the input queue.
  ConsumeInput,
  /// Append to the output queue.
  Output(Value),
  /// An input instruction found the input queue empty. Nothing else happens.
  AwaitInput,
  /// Stop for good.
  Terminate,
}

pub type Effects = Vec<Effect>;

/**
  Computes the effects of `instruction`, given the current relative base and the value at the
  front of the input queue, if there is one.
*/
pub fn execute(
  memory: &Memory,
  relative_base: Value,
  input: Option<Value>,
  instruction: &Instruction
) -> Result<Effects, VmError> {
  let modes  = &instruction.modes;
  let params = &instruction.parameters;
  let read   = |i: usize| resolve_read(memory, modes[i], params[i], relative_base);
  let write  = |i: usize| resolve_write(modes[i], params[i], relative_base);
  let overflow = VmError::Overflow { address: instruction.address };

  let effects =
    match instruction.opcode {

      Opcode::Add => {
        let value = read(0)?.checked_add(read(1)?).ok_or(overflow)?;
        vec![Effect::Write { address: write(2)?, value }, Effect::Advance]
      }

      Opcode::Multiply => {
        let value = read(0)?.checked_mul(read(1)?).ok_or(overflow)?;
        vec![Effect::Write { address: write(2)?, value }, Effect::Advance]
      }

      Opcode::Input => {
        match input {
          Some(value) => vec![
            Effect::Write { address: write(0)?, value },
            Effect::ConsumeInput,
            Effect::Advance
          ],
          None => vec![Effect::AwaitInput]
        }
      }

      Opcode::Output => vec![Effect::Output(read(0)?), Effect::Advance],

      Opcode::JumpIfTrue  => jump_if(read(0)? != 0, read(1)?)?,

      Opcode::JumpIfFalse => jump_if(read(0)? == 0, read(1)?)?,

      Opcode::LessThan => {
        let value = Value::from(read(0)? < read(1)?);
        vec![Effect::Write { address: write(2)?, value }, Effect::Advance]
      }

      Opcode::Equals => {
        let value = Value::from(read(0)? == read(1)?);
        vec![Effect::Write { address: write(2)?, value }, Effect::Advance]
      }

      Opcode::AdjustRelativeBase => {
        let delta = read(0)?;
        relative_base.checked_add(delta).ok_or(overflow)?;
        vec![Effect::AdjustRelativeBase(delta), Effect::Advance]
      }

      Opcode::Halt => vec![Effect::Terminate],

    };

  Ok(effects)
}

fn jump_if(condition: bool, target: Value) -> Result<Effects, VmError> {
  match condition {
    true  => Ok(vec![Effect::Jump(Address::try_from(target)?)]),
    false => Ok(vec![Effect::Advance])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::decode;
  use crate::error::AddressError;

  fn run(cells: Vec<Value>, relative_base: Value, input: Option<Value>) -> Result<Effects, VmError> {
    let memory = Memory::new(cells);
    let instruction = decode(&memory, Address::ZERO)?;
    execute(&memory, relative_base, input, &instruction)
  }

  #[test]
  fn arithmetic() {
    assert_eq!(
      run(vec![1, 5, 6, 0, 99, 30, 12], 0, None),
      Ok(vec![Effect::Write { address: Address::ZERO, value: 42 }, Effect::Advance])
    );
    assert_eq!(
      run(vec![1102, 34915192, 34915192, 7], 0, None),
      Ok(vec![Effect::Write { address: Address::new(7), value: 1219070632396864 }, Effect::Advance])
    );
  }

  #[test]
  fn memory_is_untouched() {
    let memory = Memory::new(vec![1101, 2, 3, 0]);
    let instruction = decode(&memory, Address::ZERO).unwrap();
    execute(&memory, 0, None, &instruction).unwrap();
    assert_eq!(memory.read(Address::ZERO), 1101);
  }

  #[test]
  fn overflow_is_an_error() {
    assert_eq!(
      run(vec![1102, Value::MAX, 2, 0], 0, None),
      Err(VmError::Overflow { address: Address::ZERO })
    );
    assert_eq!(
      run(vec![1101, Value::MIN, -1, 0], 0, None),
      Err(VmError::Overflow { address: Address::ZERO })
    );
    assert_eq!(
      run(vec![109, 1], Value::MAX, None),
      Err(VmError::Overflow { address: Address::ZERO })
    );
    assert_eq!(run(vec![109, -1], Value::MAX, None), Ok(vec![Effect::AdjustRelativeBase(-1), Effect::Advance]));
  }

  #[test]
  fn input_with_and_without_a_value() {
    assert_eq!(run(vec![3, 0], 0, None), Ok(vec![Effect::AwaitInput]));
    assert_eq!(
      run(vec![203, 1], 4, Some(-8)),
      Ok(vec![
        Effect::Write { address: Address::new(5), value: -8 },
        Effect::ConsumeInput,
        Effect::Advance
      ])
    );
  }

  #[test]
  fn jumps() {
    assert_eq!(run(vec![1105, 1, 9], 0, None), Ok(vec![Effect::Jump(Address::new(9))]));
    assert_eq!(run(vec![1105, 0, 9], 0, None), Ok(vec![Effect::Advance]));
    assert_eq!(run(vec![1106, 0, 9], 0, None), Ok(vec![Effect::Jump(Address::new(9))]));
    assert_eq!(run(vec![1106, 3, 9], 0, None), Ok(vec![Effect::Advance]));
  }

  #[test]
  fn negative_jump_target_is_an_error() {
    assert_eq!(
      run(vec![1105, 1, -4], 0, None),
      Err(VmError::Address(AddressError(-4)))
    );
    // Not taken, and an immediate target is never dereferenced.
    assert_eq!(run(vec![1105, 0, -4], 0, None), Ok(vec![Effect::Advance]));
    // A position target is read whether or not the jump is taken.
    assert_eq!(
      run(vec![106, 1, -1, 99], 0, None),
      Err(VmError::Address(AddressError(-1)))
    );
  }

  #[test]
  fn comparisons() {
    assert_eq!(
      run(vec![1107, 3, 4, 9], 0, None),
      Ok(vec![Effect::Write { address: Address::new(9), value: 1 }, Effect::Advance])
    );
    assert_eq!(
      run(vec![1108, 3, 4, 9], 0, None),
      Ok(vec![Effect::Write { address: Address::new(9), value: 0 }, Effect::Advance])
    );
  }

  #[test]
  fn output_relative_base_and_halt() {
    assert_eq!(run(vec![204, 3, 77, 0], -1, None), Ok(vec![Effect::Output(77), Effect::Advance]));
    assert_eq!(
      run(vec![109, -19], 0, None),
      Ok(vec![Effect::AdjustRelativeBase(-19), Effect::Advance])
    );
    assert_eq!(run(vec![99], 0, None), Ok(vec![Effect::Terminate]));
  }
}
