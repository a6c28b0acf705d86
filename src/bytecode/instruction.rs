use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::address::Address;
use crate::memory::Value;

/// No instruction takes more parameters than this.
pub const MAX_ARITY: usize = 3;

/**
  Opcodes of the virtual machine.

  The discriminant of each variant is the opcode as it appears in the low two decimal digits of
  an instruction word, so conversion to and from the encoded number is a primitive cast. The
  variant names double as assembly mnemonics.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[repr(u8)]
pub enum Opcode {
  Add                = 1,  // add( a, b, dst )
  Multiply           = 2,  // multiply( a, b, dst )
  Input              = 3,  // input( dst )
  Output             = 4,  // output( a )
  JumpIfTrue         = 5,  // jump_if_true( a, target )
  JumpIfFalse        = 6,  // jump_if_false( a, target )
  LessThan           = 7,  // less_than( a, b, dst )
  Equals             = 8,  // equals( a, b, dst )
  AdjustRelativeBase = 9,  // adjust_relative_base( a )
  Halt               = 99, // halt
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// The number of parameters that follow the instruction word.
  pub fn arity(&self) -> usize {
    match self {
      | Opcode::Add
      | Opcode::Multiply
      | Opcode::LessThan
      | Opcode::Equals              => 3,

      | Opcode::JumpIfTrue
      | Opcode::JumpIfFalse         => 2,

      | Opcode::Input
      | Opcode::Output
      | Opcode::AdjustRelativeBase  => 1,

      Opcode::Halt                  => 0,
    }
  }

  /// Returns the size in cells of an instruction with this opcode, the word included.
  pub fn size(&self) -> usize {
    self.arity() + 1
  }

  /// The index of the parameter this opcode writes through, if any. It is always the last one.
  pub fn destination(&self) -> Option<usize> {
    match self {
      | Opcode::Add
      | Opcode::Multiply
      | Opcode::LessThan
      | Opcode::Equals  => Some(2),
      Opcode::Input     => Some(0),
      _                 => None
    }
  }
}

/// How a raw parameter is interpreted.
#[derive(
  TryFromPrimitive, IntoPrimitive,
  Clone, Copy, Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
pub enum ParameterMode {
  /// The parameter is an address.
  Position  = 0,
  /// The parameter is the value itself. Never legal for a destination.
  Immediate = 1,
  /// The parameter is an offset from the relative base.
  Relative  = 2,
}

impl ParameterMode {
  /// The assembly prefix of an operand in this mode.
  pub fn sigil(&self) -> &'static str {
    match self {
      ParameterMode::Position  => "",
      ParameterMode::Immediate => "#",
      ParameterMode::Relative  => "@",
    }
  }
}

/// A decoded instruction: where it was fetched from, its opcode, and its parameters together with
/// their modes. Only the first `opcode.arity()` modes and parameters are meaningful.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
  pub address    : Address,
  pub word       : Value,
  pub opcode     : Opcode,
  pub modes      : [ParameterMode; MAX_ARITY],
  pub parameters : [Value; MAX_ARITY],
}

impl Instruction {

  /// The `(mode, raw parameter)` pairs of the instruction, in order.
  pub fn operands(&self) -> impl Iterator<Item = (ParameterMode, Value)> + '_ {
    self.modes
        .iter()
        .copied()
        .zip(self.parameters.iter().copied())
        .take(self.opcode.arity())
  }

  /// The address of the instruction that follows this one in memory.
  pub fn next_address(&self) -> Address {
    self.address + self.opcode.size()
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.opcode.arity() == 0 {
      return write!(f, "{}", self.opcode);
    }
    let operands =
      self.operands()
          .map(|(mode, raw)| format!("{}{}", mode.sigil(), raw))
          .collect::<Vec<String>>()
          .join(", ");
    write!(f, "{}({})", self.opcode, operands)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  #[test]
  fn opcode_numbers() {
    assert_eq!(Opcode::try_from(1u8).ok(), Some(Opcode::Add));
    assert_eq!(Opcode::try_from(99u8).ok(), Some(Opcode::Halt));
    assert!(Opcode::try_from(10u8).is_err());
    assert!(Opcode::try_from(0u8).is_err());
    assert_eq!(Opcode::AdjustRelativeBase.code(), 9);
  }

  #[test]
  fn sizes_match_the_instruction_table() {
    let sizes: Vec<(u8, usize)> = Opcode::iter().map(|op| (op.code(), op.size())).collect();
    assert_eq!(
      sizes,
      vec![(1, 4), (2, 4), (3, 2), (4, 2), (5, 3), (6, 3), (7, 4), (8, 4), (9, 2), (99, 1)]
    );
  }

  #[test]
  fn destination_is_last_parameter() {
    for opcode in Opcode::iter() {
      if let Some(index) = opcode.destination() {
        assert_eq!(index + 1, opcode.arity(), "{}", opcode);
      }
    }
    assert_eq!(Opcode::AdjustRelativeBase.destination(), None);
    assert_eq!(Opcode::Output.destination(), None);
  }

  #[test]
  fn mnemonics_round_trip() {
    for opcode in Opcode::iter() {
      let name: &'static str = opcode.into();
      assert_eq!(Opcode::from_str(name).ok(), Some(opcode));
    }
    assert!(Opcode::from_str("Subtract").is_err());
  }

  #[test]
  fn display() {
    let instruction = Instruction {
      address    : Address::ZERO,
      word       : 21101,
      opcode     : Opcode::Add,
      modes      : [ParameterMode::Immediate, ParameterMode::Immediate, ParameterMode::Relative],
      parameters : [4, -3, 7],
    };
    assert_eq!(format!("{}", instruction), "Add(#4, #-3, @7)");
    assert_eq!(instruction.next_address(), Address::new(4));
  }
}
