//! The machine: memory, instruction pointer, relative base and I/O queues, together with the
//! fetch-decode-execute loop that pauses whenever the program needs input it has not been given.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use prettytable::{format as TableFormat, Table};
use strum_macros::Display as StrumDisplay;
use tracing::{debug, trace, warn};

use crate::address::Address;
use crate::bytecode::decode;
use crate::error::{AddressError, MalformedProgramError, VmError};
use crate::executor::{execute, Effect};
use crate::memory::{Memory, Value};

/// Cells shown before and after the instruction pointer by the state dump.
const WINDOW_BEFORE : usize = 4;
const WINDOW_AFTER  : usize = 12;

/**
  The observable state of a machine.

  `HasOutput` takes precedence over the execution state: a machine that has buffered output is
  reported as `HasOutput` even if it has also terminated or is waiting for input. `Faulted` takes
  precedence over everything.
*/
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum State {
  /// More instructions can be executed without outside help.
  Running,
  /// The next instruction reads input and the input queue is empty.
  AwaitingInput,
  /// Output is waiting to be read.
  HasOutput,
  /// The program executed `Halt`.
  Terminated,
  /// A fatal error was raised. The machine will not execute again.
  Faulted,
}

/// Where the fetch-decode-execute loop stands, independent of buffered output.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug)]
enum Execution {
  Running,
  AwaitingInput,
  Terminated,
  Faulted,
}

/**
  A running program instance. It exclusively owns its memory; cloning a machine clones its memory,
  registers and queues, so clones never affect one another.
*/
#[derive(Clone, Debug)]
pub struct Machine {
  // Memory Store
  memory : Memory,

  // Registers //
  pointer       : Address, // Instruction pointer
  relative_base : Value,   // Offset for relative mode parameters
  steps         : u64,     // Instructions executed so far

  // I/O Queues, both first in first out
  input  : VecDeque<Value>,
  output : VecDeque<Value>,

  execution : Execution,
}

impl Machine {

  // region Construction and inspection

  pub fn new<P: Into<Memory>>(program: P) -> Machine {
    Machine::from_memory(program.into())
  }

  pub fn from_memory(memory: Memory) -> Machine {
    Machine {
      memory,
      pointer       : Address::ZERO,
      relative_base : 0,
      steps         : 0,
      input         : VecDeque::new(),
      output        : VecDeque::new(),
      execution     : Execution::Running,
    }
  }

  pub fn state(&self) -> State {
    match self.execution {
      Execution::Faulted                      => State::Faulted,
      _ if !self.output.is_empty()            => State::HasOutput,
      Execution::Running                      => State::Running,
      Execution::AwaitingInput                => State::AwaitingInput,
      Execution::Terminated                   => State::Terminated,
    }
  }

  /// Whether the program has executed `Halt`. Buffered output may still be waiting to be read.
  pub fn is_terminated(&self) -> bool {
    self.execution == Execution::Terminated
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn instruction_pointer(&self) -> Address {
    self.pointer
  }

  pub fn relative_base(&self) -> Value {
    self.relative_base
  }

  /// The number of instructions executed so far.
  pub fn steps(&self) -> u64 {
    self.steps
  }

  /// Reads memory directly.
  pub fn peek(&self, address: Value) -> Result<Value, AddressError> {
    Ok(self.memory.read(Address::try_from(address)?))
  }

  /// Writes memory directly, before or during execution. The next fetch sees the new value.
  pub fn poke(&mut self, address: Value, value: Value) -> Result<(), AddressError> {
    let address = Address::try_from(address)?;
    debug!(%address, value, "poke");
    self.memory.write(address, value);
    Ok(())
  }

  // endregion

  // region Execution

  /**
    Executes a single instruction and reports what it did: `HasOutput` if it produced output,
    otherwise the execution state after it. A terminated machine does nothing and reports
    `Terminated`; a machine awaiting input with an empty input queue does nothing and reports
    `AwaitingInput`.

    An error faults the machine: the failing instruction has no effect, and every later call
    returns `VmError::Faulted`.
  */
  pub fn step(&mut self) -> Result<State, VmError> {
    match self.execution {
      Execution::Faulted    => return Err(VmError::Faulted),
      Execution::Terminated => return Ok(State::Terminated),
      _                     => {}
    }

    let outcome =
      decode(&self.memory, self.pointer)
        .map_err(VmError::from)
        .and_then(|instruction| {
          let effects = execute(&self.memory, self.relative_base, self.input.front().copied(), &instruction)?;
          Ok((instruction, effects))
        });

    let (instruction, effects) =
      match outcome {
        Ok(pair) => pair,
        Err(error) => {
          warn!(pointer = %self.pointer, %error, "machine faulted");
          self.execution = Execution::Faulted;
          return Err(error);
        }
      };

    trace!(pointer = %self.pointer, base = self.relative_base, %instruction, "execute");

    let mut produced_output = false;
    self.execution = Execution::Running;

    for effect in effects {
      match effect {

        Effect::Write { address, value } => self.memory.write(address, value),

        Effect::Advance => self.pointer = instruction.next_address(),

        Effect::Jump(target) => self.pointer = target,

        // Overflow was ruled out by `execute`.
        Effect::AdjustRelativeBase(delta) => self.relative_base += delta,

        Effect::ConsumeInput => {
          self.input.pop_front();
        }

        Effect::Output(value) => {
          self.output.push_back(value);
          produced_output = true;
        }

        Effect::AwaitInput => {
          debug!(pointer = %self.pointer, "awaiting input");
          self.execution = Execution::AwaitingInput;
          return Ok(State::AwaitingInput);
        }

        Effect::Terminate => {
          debug!(steps = self.steps, "terminated");
          self.execution = Execution::Terminated;
        }

      }
    }

    self.steps += 1;

    #[cfg(feature = "trace_computation")]
    trace!("\n{}", self);

    match (produced_output, self.execution) {
      (true, _)                     => Ok(State::HasOutput),
      (false, Execution::Terminated) => Ok(State::Terminated),
      _                             => Ok(State::Running),
    }
  }

  /// Executes until the program terminates or needs input it does not have, buffering all output
  /// produced on the way. Returns `AwaitingInput` or `Terminated`.
  pub fn run(&mut self) -> Result<State, VmError> {
    loop {
      match self.step()? {
        State::AwaitingInput => return Ok(State::AwaitingInput),
        State::Terminated    => return Ok(State::Terminated),
        _                    => {}
      }
    }
  }

  /// Executes until an instruction produces output, the program terminates, or it needs input.
  fn run_until_output(&mut self) -> Result<State, VmError> {
    loop {
      match self.step()? {
        State::Running => {}
        state          => return Ok(state),
      }
    }
  }

  /**
    Appends `values` to the input queue and resumes execution as `run` does. Each input
    instruction consumes exactly one queued value, oldest first.
  */
  pub fn send<I: IntoIterator<Item = Value>>(&mut self, values: I) -> Result<State, VmError> {
    let before = self.input.len();
    self.input.extend(values);
    debug!(count = self.input.len() - before, queued = self.input.len(), "send");
    self.run()
  }

  /**
    Takes the oldest buffered output. If there is none, executes until some is produced.

    Returns `None` when no output can be produced without more input, or when the program has
    terminated and all its output has been read. Use `is_terminated` to tell these apart.
  */
  pub fn read(&mut self) -> Result<Option<Value>, VmError> {
    if let Some(value) = self.output.pop_front() {
      return Ok(Some(value));
    }

    match self.execution {
      Execution::Faulted    => return Err(VmError::Faulted),
      Execution::Terminated => return Ok(None),
      _                     => {}
    }

    self.run_until_output()?;
    Ok(self.output.pop_front())
  }

  /// Takes all buffered output, oldest first, without executing anything.
  pub fn drain(&mut self) -> Vec<Value> {
    self.output.drain(..).collect()
  }

  /// Sends `inputs`, runs until the machine stops, and returns everything it output.
  pub fn run_with<I: IntoIterator<Item = Value>>(&mut self, inputs: I) -> Result<Vec<Value>, VmError> {
    self.send(inputs)?;
    Ok(self.drain())
  }

  // endregion

  // region Display methods

  /**
    The cells around the instruction pointer. The pointer's row is marked `ip` and carries the
    instruction fetched there; the cell the relative base points at, if it is in view, is marked
    `rb`.
  */
  fn make_memory_table(&self) -> Table {
    let start = self.pointer.idx().saturating_sub(WINDOW_BEFORE);
    let end   = self.pointer.idx() + WINDOW_AFTER;
    let base  = Address::try_from(self.relative_base).ok();

    let mut table = Table::new();
    table.set_format(*DUMP_FORMAT);
    table.set_titles(row![ub->"", ubr->"Address", ubr->"Cell", ubl->"Decoded"]);

    for idx in start..end {
      let address = Address::new(idx);
      let value   = self.memory.read(address);

      let marker =
        match (address == self.pointer, Some(address) == base) {
          (true, true)   => "ip rb",
          (true, false)  => "ip",
          (false, true)  => "rb",
          (false, false) => ""
        };

      let decoded =
        match address == self.pointer {
          true  => self.describe_next(),
          false => String::new()
        };

      table.add_row(row![b->marker, r->address.idx(), r->value, decoded]);
    }
    table
  }

  /// The instruction at the pointer, or why it cannot be decoded.
  fn describe_next(&self) -> String {
    match decode(&self.memory, self.pointer) {
      Ok(instruction) => instruction.to_string(),
      Err(error)      => error.to_string()
    }
  }

  fn make_state_table(&self) -> Table {
    let mut table = Table::new();
    table.set_format(*DUMP_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Value"]);

    table.add_row(row![r->"IP =",     self.pointer.idx()]);
    table.add_row(row![r->"RB =",     self.relative_base]);
    table.add_row(row![r->"Steps =",  self.steps]);
    table.add_row(row![r->"State =",  self.state()]);
    table.add_row(row![r->"Input =",  format!("{:?}", self.input)]);
    table.add_row(row![r->"Output =", format!("{:?}", self.output)]);
    table
  }

  // endregion

}

impl From<Memory> for Machine {
  fn from(memory: Memory) -> Machine {
    Machine::from_memory(memory)
  }
}

impl FromStr for Machine {
  type Err = MalformedProgramError;

  fn from_str(text: &str) -> Result<Machine, MalformedProgramError> {
    text.parse::<Memory>().map(Machine::from_memory)
  }
}

lazy_static! {
  static ref DUMP_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .separators(
        &[TableFormat::LinePosition::Title, TableFormat::LinePosition::Bottom],
        TableFormat::LineSeparator::new('─', '┼', '─', '─')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut dump = table!([self.make_state_table(), self.make_memory_table()]);
    dump.set_titles(row![ub->"Registers", ub->"Memory"]);
    dump.set_format(*DUMP_FORMAT);
    write!(f, "{}", dump)
  }
}
