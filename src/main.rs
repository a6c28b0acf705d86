use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use argh::FromArgs;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use intcode::bytecode::{disassemble, parse_assembly};
use intcode::{
  parse_program, AddressError, AssemblyError, MalformedProgramError, Machine, Memory, State, Value,
  VmError
};

/// Runs an Intcode program, printing each value it outputs on its own line.
#[derive(FromArgs)]
struct Arguments {
  /// the program file, comma separated integers
  #[argh(positional)]
  program: String,

  /// comma separated values to send as input
  #[argh(option, short = 'i')]
  input: Option<String>,

  /// a memory patch `address=value` applied before running, may be repeated
  #[argh(option, short = 'p')]
  patch: Vec<String>,

  /// read the program file as assembly rather than integers
  #[argh(switch, short = 'a')]
  assembly: bool,

  /// print the program as assembly instead of running it
  #[argh(switch, short = 'd')]
  disassemble: bool,

  /// print the machine state to stderr once it stops
  #[argh(switch)]
  dump: bool,
}

#[derive(Debug, Error)]
enum CliError {
  #[error("cannot read {path}: {source}")]
  Io { path: String, source: io::Error },
  #[error(transparent)]
  Program(#[from] MalformedProgramError),
  #[error(transparent)]
  Assembly(#[from] AssemblyError),
  #[error("bad input values: {0}")]
  Input(MalformedProgramError),
  #[error("bad patch `{0}`, expected `address=value`")]
  Patch(String),
  #[error("cannot patch: {0}")]
  Address(#[from] AddressError),
  #[error(transparent)]
  Vm(#[from] VmError),
  #[error("cannot write output: {0}")]
  Output(#[from] io::Error),
  #[error("program is waiting for more input")]
  Starved,
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn parse_patch(text: &str) -> Result<(Value, Value), CliError> {
  let bad = || CliError::Patch(text.to_string());
  let (address, value) = text.split_once('=').ok_or_else(bad)?;
  let address = address.trim().parse::<Value>().map_err(|_| bad())?;
  let value   = value.trim().parse::<Value>().map_err(|_| bad())?;
  Ok((address, value))
}

fn load(arguments: &Arguments) -> Result<Memory, CliError> {
  let text =
    fs::read_to_string(&arguments.program)
      .map_err(|source| CliError::Io { path: arguments.program.clone(), source })?;

  let cells =
    match arguments.assembly {
      true  => parse_assembly(&text)?,
      false => parse_program(&text)?
    };
  info!(path = %arguments.program, cells = cells.len(), "loaded program");
  Ok(Memory::new(cells))
}

/// Loads and runs the program, writing its outputs or its disassembly to `out`.
fn run<W: Write>(arguments: &Arguments, out: &mut W) -> Result<(), CliError> {
  let memory = load(arguments)?;

  if arguments.disassemble {
    write!(out, "{}", disassemble(&memory))?;
    return Ok(());
  }

  let inputs =
    match &arguments.input {
      Some(text) => parse_program(text).map_err(CliError::Input)?,
      None       => Vec::new()
    };

  let mut machine = Machine::from_memory(memory);
  for patch in &arguments.patch {
    let (address, value) = parse_patch(patch)?;
    machine.poke(address, value)?;
  }

  let result = machine.send(inputs);
  if arguments.dump {
    eprintln!("{}", machine);
  }
  let state = result?;

  for value in machine.drain() {
    writeln!(out, "{}", value)?;
  }

  debug!(steps = machine.steps(), %state, "stopped");
  match state {
    State::AwaitingInput => Err(CliError::Starved),
    _                    => Ok(())
  }
}

fn main() -> ExitCode {
  init_logging();
  let arguments: Arguments = argh::from_env();

  match run(&arguments, &mut io::stdout().lock()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      eprintln!("error: {}", error);
      ExitCode::FAILURE
    }
  }
}
