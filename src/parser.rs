/*!

This module parses program text.

A program is a single line of comma separated, signed, base 10 integers:
    ```text
    <program>  ::=  <integer> (',' <integer>)*
    <integer>  ::=  '-'? <digit>+
    ```

Whitespace around integers and commas is ignored, so a trailing newline is fine. Anything else,
including an empty program or an integer that does not fit in 64 bits, is malformed.

*/

use nom::{
  character::complete::{
    char as one_char,
    i64 as signed_integer,
    multispace0
  },
  combinator::all_consuming,
  multi::separated_list1,
  sequence::delimited,
  IResult
};

use crate::error::MalformedProgramError;
use crate::memory::Value;

/// How much of the offending text an error carries.
const EXCERPT_LENGTH: usize = 16;

fn cells(text: &str) -> IResult<&str, Vec<Value>> {
  all_consuming(
    delimited(
      multispace0,
      separated_list1(
        delimited(multispace0, one_char(','), multispace0),
        signed_integer
      ),
      multispace0
    )
  )(text)
}

/// Parses program text into the initial contents of memory, addresses `0..N` in order.
pub fn parse_program(text: &str) -> Result<Vec<Value>, MalformedProgramError> {
  match cells(text) {
    Ok((_rest, values)) => Ok(values),

    Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
      Err(malformed(text, e.input))
    }

    // Only streaming parsers report `Incomplete`.
    Err(nom::Err::Incomplete(_)) => Err(malformed(text, "")),
  }
}

fn malformed(text: &str, rest: &str) -> MalformedProgramError {
  let found: String =
    match rest.is_empty() {
      true  => "end of input".to_string(),
      false => rest.chars().take(EXCERPT_LENGTH).collect()
    };
  MalformedProgramError {
    offset: text.len() - rest.len(),
    found
  }
}
