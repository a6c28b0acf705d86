/*!

  Programs are flat sequences of signed integer cells. An instruction is a word followed by its
  parameters. The word's low two decimal digits are the opcode; each higher decimal digit is the
  addressing mode of one parameter, least significant first. The opcode fixes how many parameters
  follow and which of them, if any, is written through.

  Instructions are decoded afresh from memory every time they are fetched, so a program that
  overwrites its own upcoming instructions behaves as expected.

*/

mod assembly;
mod encoding;
mod instruction;

pub use assembly::{disassemble, parse_assembly};
pub use encoding::{decode, encode};
pub use instruction::{Instruction, Opcode, ParameterMode, MAX_ARITY};
