/*!
  The human readable textual form of bytecode is called assembly. This module leverages the
  `strum` derives of `Opcode` to serialize memory to assembly and to parse assembly back into
  cells.

  One instruction per line:
  ```text
  Add(#1, @-2, 7)        % `#` immediate, `@` relative, bare numbers are positions
  Output(7)
  Halt
  Data(1, 2, 3)          % raw cells
  ```
  `%` begins a comment that runs to the end of the line. Blank lines are ignored.
*/

use std::str::FromStr;

use nom::{
  branch::alt,
  character::complete::{
    alpha1,
    char as one_char,
    i64 as signed_integer,
    space0
  },
  combinator::{all_consuming, map, opt},
  multi::separated_list0,
  sequence::{delimited, pair, terminated},
  IResult
};

use super::{decode, encode, Opcode, ParameterMode};
use crate::address::Address;
use crate::error::AssemblyError;
use crate::memory::{Memory, Value};

/// The pseudo-instruction that emits its arguments verbatim.
const DATA_DIRECTIVE: &str = "Data";
/// Column at which `disassemble` places address comments.
const COMMENT_COLUMN: usize = 40;

type Operand = (ParameterMode, Value);

// region Parsing

fn operand(text: &str) -> IResult<&str, Operand> {
  pair(
    map(
      opt(alt((one_char('#'), one_char('@')))),
      |sigil| match sigil {
        Some('#') => ParameterMode::Immediate,
        Some(_)   => ParameterMode::Relative,
        None      => ParameterMode::Position,
      }
    ),
    signed_integer
  )(text)
}

fn statement(text: &str) -> IResult<&str, (&str, Option<Vec<Operand>>)> {
  all_consuming(
    terminated(
      pair(
        alpha1,
        opt(
          delimited(
            delimited(space0, one_char('('), space0),
            separated_list0(delimited(space0, one_char(','), space0), operand),
            preceded_close
          )
        )
      ),
      space0
    )
  )(text)
}

fn preceded_close(text: &str) -> IResult<&str, char> {
  let (text, _) = space0(text)?;
  one_char(')')(text)
}

/// Assembles one statement, appending its cells to `cells`.
fn assemble_statement(
  line: usize,
  name: &str,
  operands: Vec<Operand>,
  cells: &mut Vec<Value>
) -> Result<(), AssemblyError> {
  let error = |message: String| AssemblyError { line, message };

  if name == DATA_DIRECTIVE {
    for (mode, value) in operands {
      if mode != ParameterMode::Position {
        return Err(error(format!("{} takes bare values, found a `{}` operand", name, mode.sigil())));
      }
      cells.push(value);
    }
    return Ok(());
  }

  let opcode =
    match Opcode::from_str(name) {
      Ok(opcode) => opcode,
      Err(_)     => return Err(error(format!("{} is not an operation", name)))
    };

  if operands.len() != opcode.arity() {
    return Err(error(format!(
      "{} requires {} arguments but was given {}",
      opcode, opcode.arity(), operands.len()
    )));
  }

  if let Some(destination) = opcode.destination() {
    if operands[destination].0 == ParameterMode::Immediate {
      return Err(error(format!("{} cannot write to an immediate operand", opcode)));
    }
  }

  let modes: Vec<ParameterMode> = operands.iter().map(|(mode, _)| *mode).collect();
  cells.push(encode(opcode, &modes));
  cells.extend(operands.iter().map(|(_, value)| *value));
  Ok(())
}

/// Turns assembly text into the cells of a program.
pub fn parse_assembly(text: &str) -> Result<Vec<Value>, AssemblyError> {
  let mut cells = Vec::new();

  for (i, raw_line) in text.lines().enumerate() {
    let line = i + 1;
    let code = match raw_line.find('%') {
      Some(start) => &raw_line[..start],
      None        => raw_line
    }.trim();

    if code.is_empty() {
      continue;
    }

    match statement(code) {
      Ok((_rest, (name, operands))) => {
        assemble_statement(line, name, operands.unwrap_or_default(), &mut cells)?;
      }
      Err(_) => {
        return Err(AssemblyError { line, message: format!("cannot parse `{}`", code) });
      }
    }
  }

  Ok(cells)
}

// endregion

// region Disassembly

/**
  Renders the cells of `memory` as assembly, one instruction per line with its address in a
  comment. A cell is rendered as an instruction only if it decodes, its parameters lie within the
  dense prefix, and re-encoding it gives back the same word; every other cell becomes `Data`.
  Parsing the result with `parse_assembly` therefore reproduces the dense prefix exactly.

  Cells written far beyond the prefix are listed afterwards as comments, one line per run of
  consecutive addresses. The gap before them is never spelled out.
*/
pub fn disassemble(memory: &Memory) -> String {
  let mut buffer  = String::new();
  let mut pending : Vec<Value> = Vec::new();
  let mut pending_start = Address::ZERO;
  let mut address = Address::ZERO;
  let end = memory.prefix_len();

  while address.idx() < end {
    let instruction =
      decode(memory, address)
        .ok()
        .filter(|i| i.address.idx() + i.opcode.size() <= end)
        .filter(|i| encode(i.opcode, &i.modes) == i.word);

    match instruction {

      Some(instruction) => {
        flush_data(&mut buffer, &mut pending, pending_start);
        push_line(&mut buffer, &instruction.to_string(), address);
        address = instruction.next_address();
      }

      None => {
        if pending.is_empty() {
          pending_start = address;
        }
        pending.push(memory.read(address));
        address = address + 1;
      }

    }
  }
  flush_data(&mut buffer, &mut pending, pending_start);

  let mut runs: Vec<(Address, Vec<Value>)> = Vec::new();
  for (address, value) in memory.sparse_cells() {
    match runs.last_mut() {
      Some((start, values)) if start.idx() + values.len() == address.idx() => values.push(value),
      _ => runs.push((address, vec![value]))
    }
  }
  for (start, values) in runs {
    buffer.push_str(&format!("% {} {}\n", start, data_statement(&values)));
  }

  buffer
}

fn data_statement(values: &[Value]) -> String {
  let values =
    values
      .iter()
      .map(Value::to_string)
      .collect::<Vec<String>>()
      .join(", ");
  format!("{}({})", DATA_DIRECTIVE, values)
}

fn flush_data(buffer: &mut String, pending: &mut Vec<Value>, start: Address) {
  if pending.is_empty() {
    return;
  }
  push_line(buffer, &data_statement(pending), start);
  pending.clear();
}

fn push_line(buffer: &mut String, text: &str, address: Address) {
  buffer.push_str(&format!("{:<width$}% {}\n", text, address, width = COMMENT_COLUMN));
}

// endregion
