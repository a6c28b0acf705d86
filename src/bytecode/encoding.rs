/*!
  Encoding and decoding of instruction words.

  Given a 5 digit instruction word, digits ABCDE are used as follows:
  ```text
  DE  the two digit opcode
  C   the mode of the 1st parameter
  B   the mode of the 2nd parameter
  A   the mode of the 3rd parameter
  ```
  Missing leading digits are mode 0 (position). Digits beyond the opcode's arity are ignored.
*/

use super::{Instruction, Opcode, ParameterMode, MAX_ARITY};
use crate::address::Address;
use crate::error::DecodeError;
use crate::memory::{Memory, Value};

/// Decodes the instruction at `pointer`, reading its parameters from the cells that follow it.
pub fn decode(memory: &Memory, pointer: Address) -> Result<Instruction, DecodeError> {
  let word   = memory.read(pointer);
  let opcode = decode_opcode(pointer, word)?;

  let mut modes      = [ParameterMode::Position; MAX_ARITY];
  let mut parameters = [0 as Value; MAX_ARITY];
  let mut mode_digits = word / 100;

  for i in 0..opcode.arity() {
    let digit = mode_digits % 10;
    mode_digits /= 10;

    modes[i] =
      match ParameterMode::try_from(digit as u8) {
        Ok(mode) => mode,
        Err(_)   => return Err(DecodeError::UnknownMode { address: pointer, word, digit })
      };
    parameters[i] = memory.read(pointer + (i + 1));
  }

  if let Some(destination) = opcode.destination() {
    if modes[destination] == ParameterMode::Immediate {
      return Err(DecodeError::ImmediateDestination { address: pointer, word });
    }
  }

  Ok(Instruction { address: pointer, word, opcode, modes, parameters })
}

/**
  Encodes an opcode and the modes of its parameters into an instruction word. Modes beyond the
  opcode's arity are ignored, and trailing position modes contribute nothing, so the result is the
  shortest word that decodes to the same instruction.
*/
pub fn encode(opcode: Opcode, modes: &[ParameterMode]) -> Value {
  modes
    .iter()
    .take(opcode.arity())
    .enumerate()
    .fold(opcode.code() as Value, |word, (i, mode)| {
      word + (Into::<u8>::into(*mode) as Value) * 10i64.pow(i as u32 + 2)
    })
}

fn decode_opcode(pointer: Address, word: Value) -> Result<Opcode, DecodeError> {
  let unknown = DecodeError::UnknownOpcode { address: pointer, word };
  if word < 0 {
    return Err(unknown);
  }
  Opcode::try_from((word % 100) as u8).map_err(|_| unknown)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decode_cells(cells: Vec<Value>) -> Result<Instruction, DecodeError> {
    decode(&Memory::new(cells), Address::ZERO)
  }

  #[test]
  fn modes_default_to_position() {
    let instruction = decode_cells(vec![1002, 4, 3, 4, 33]).unwrap();
    assert_eq!(instruction.opcode, Opcode::Multiply);
    assert_eq!(
      instruction.modes,
      [ParameterMode::Position, ParameterMode::Immediate, ParameterMode::Position]
    );
    assert_eq!(instruction.parameters, [4, 3, 4]);
  }

  #[test]
  fn all_three_modes() {
    let instruction = decode_cells(vec![21001, 1, 2, 3]).unwrap();
    assert_eq!(
      instruction.modes,
      [ParameterMode::Position, ParameterMode::Immediate, ParameterMode::Relative]
    );
  }

  #[test]
  fn parameters_past_the_end_read_zero() {
    let instruction = decode_cells(vec![1101]).unwrap();
    assert_eq!(instruction.parameters, [0, 0, 0]);
  }

  #[test]
  fn halt_takes_no_parameters() {
    let instruction = decode_cells(vec![99, 12345]).unwrap();
    assert_eq!(instruction.opcode, Opcode::Halt);
    assert_eq!(instruction.operands().count(), 0);
  }

  #[test]
  fn digits_beyond_arity_are_ignored() {
    // Mode digit 3 would be invalid, but `Output` only has one parameter.
    let instruction = decode_cells(vec![3104, 7]).unwrap();
    assert_eq!(instruction.modes[0], ParameterMode::Immediate);
  }

  #[test]
  fn encode_is_inverse_of_decode() {
    for word in [1, 1002, 21001, 1105, 203, 109, 99] {
      let instruction = decode_cells(vec![word, 0, 0, 0]).unwrap();
      assert_eq!(encode(instruction.opcode, &instruction.modes), word);
    }
    // Digits beyond the arity are not reproduced.
    assert_eq!(encode(Opcode::Output, &[ParameterMode::Immediate, ParameterMode::Relative]), 104);
  }

  #[test]
  fn unknown_opcode() {
    assert_eq!(
      decode_cells(vec![42]),
      Err(DecodeError::UnknownOpcode { address: Address::ZERO, word: 42 })
    );
    assert_eq!(
      decode_cells(vec![-1]),
      Err(DecodeError::UnknownOpcode { address: Address::ZERO, word: -1 })
    );
    // A never written cell decodes as opcode 0.
    assert!(decode(&Memory::new(vec![]), Address::new(10)).is_err());
  }

  #[test]
  fn unknown_mode() {
    assert_eq!(
      decode_cells(vec![301, 0, 0, 0]),
      Err(DecodeError::UnknownMode { address: Address::ZERO, word: 301, digit: 3 })
    );
  }

  #[test]
  fn immediate_destination() {
    assert_eq!(
      decode_cells(vec![11101, 1, 1, 1]),
      Err(DecodeError::ImmediateDestination { address: Address::ZERO, word: 11101 })
    );
    assert_eq!(
      decode_cells(vec![103, 5]),
      Err(DecodeError::ImmediateDestination { address: Address::ZERO, word: 103 })
    );
  }
}
