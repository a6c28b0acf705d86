//! Error types. Every error raised while executing is fatal to the machine that raised it and to
//! no other.

use thiserror::Error;

use crate::address::Address;
use crate::memory::Value;

/// The program text could not be parsed as a comma separated list of integers.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("malformed program at byte {offset}: unexpected `{found}`")]
pub struct MalformedProgramError {
  /// Byte offset into the program text.
  pub offset: usize,
  /// The offending text, truncated.
  pub found: String,
}

/// Assembly text could not be turned into cells.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("assembly error on line {line}: {message}")]
pub struct AssemblyError {
  pub line: usize,
  pub message: String,
}

/// A resolved address, or a jump target, was negative.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("invalid address {0}")]
pub struct AddressError(pub Value);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum DecodeError {
  #[error("unknown opcode {} in instruction {word} at {address}", word % 100)]
  UnknownOpcode { address: Address, word: Value },
  #[error("unknown parameter mode {digit} in instruction {word} at {address}")]
  UnknownMode { address: Address, word: Value, digit: Value },
  #[error("instruction {word} at {address} writes to an immediate parameter")]
  ImmediateDestination { address: Address, word: Value },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum VmError {
  #[error(transparent)]
  Decode(#[from] DecodeError),
  #[error(transparent)]
  Address(#[from] AddressError),
  #[error("arithmetic overflow in instruction at {address}")]
  Overflow { address: Address },
  #[error("machine was used after a fatal error")]
  Faulted,
}
