/*!
  Sparse program memory.

  Programs routinely write past the end of their own text, sometimes far past it. Memory is
  therefore split into a dense prefix, which grows with zero fill for writes near its end, and a
  sparse store for writes so far beyond it that zero filling would be wasteful. Every address
  never written reads as zero.
*/

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::address::{Address, AddressNumberType};
use crate::error::MalformedProgramError;
use crate::parser::parse_program;

/// The contents of a single memory cell.
pub type Value = i64;

/// Writes this far past the end of the dense prefix still extend it.
const DENSE_SLACK: AddressNumberType = 4096;

#[derive(Clone, Debug, Default)]
pub struct Memory {
  dense  : Vec<Value>,
  sparse : BTreeMap<Address, Value>,
}

impl Memory {

  pub fn new(cells: Vec<Value>) -> Memory {
    Memory {
      dense  : cells,
      sparse : BTreeMap::new(),
    }
  }

  /// Reads the cell at `address`, which is zero if it was never written.
  pub fn read(&self, address: Address) -> Value {
    match self.dense.get(address.idx()) {
      Some(value) => *value,
      None        => self.sparse.get(&address).copied().unwrap_or(0)
    }
  }

  /**
    Writes `value` at `address`, growing the dense prefix if the address is close enough to its
    end, and falling back to the sparse store otherwise.
  */
  pub fn write(&mut self, address: Address, value: Value) {
    let idx = address.idx();

    if idx < self.dense.len() {
      self.dense[idx] = value;
      return;
    }

    if idx - self.dense.len() < DENSE_SLACK.max(self.dense.len()) {
      self.dense.resize(idx + 1, 0);
      self.absorb_sparse();
      self.dense[idx] = value;
    } else {
      self.sparse.insert(address, value);
    }
  }

  /// Moves any sparse cells now covered by the dense prefix into it.
  fn absorb_sparse(&mut self) {
    let boundary = Address::new(self.dense.len());
    let beyond   = self.sparse.split_off(&boundary);
    let covered  = std::mem::replace(&mut self.sparse, beyond);
    for (address, value) in covered {
      self.dense[address.idx()] = value;
    }
  }

  /// One past the highest address that was loaded or written.
  pub fn len(&self) -> AddressNumberType {
    match self.sparse.keys().next_back() {
      Some(last) => last.idx() + 1,
      None       => self.dense.len()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Copies `count` cells starting at `start`, with unwritten cells as zero.
  pub fn window(&self, start: Address, count: usize) -> Vec<Value> {
    (0..count).map(|i| self.read(start + i)).collect()
  }

  /// The number of cells in the dense prefix: the loaded program and every cell written
  /// contiguously after it.
  pub fn prefix_len(&self) -> AddressNumberType {
    self.dense.len()
  }

  /// Copies the dense prefix. Cells written far beyond it are only reachable through
  /// `sparse_cells`, since zero filling up to them could exhaust the host's memory.
  pub fn to_vec(&self) -> Vec<Value> {
    self.dense.clone()
  }

  /// The cells held outside the dense prefix, in address order.
  pub fn sparse_cells(&self) -> impl Iterator<Item = (Address, Value)> + '_ {
    self.sparse.iter().map(|(address, value)| (*address, *value))
  }
}

impl From<Vec<Value>> for Memory {
  fn from(cells: Vec<Value>) -> Memory {
    Memory::new(cells)
  }
}

impl From<&[Value]> for Memory {
  fn from(cells: &[Value]) -> Memory {
    Memory::new(cells.to_vec())
  }
}

impl FromIterator<Value> for Memory {
  fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Memory {
    Memory::new(iter.into_iter().collect())
  }
}

impl FromStr for Memory {
  type Err = MalformedProgramError;

  fn from_str(text: &str) -> Result<Memory, MalformedProgramError> {
    parse_program(text).map(Memory::new)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unwritten_cells_read_zero() {
    let memory = Memory::new(vec![1, 2, 3]);
    assert_eq!(memory.read(Address::new(2)), 3);
    assert_eq!(memory.read(Address::new(3)), 0);
    assert_eq!(memory.read(Address::new(1 << 40)), 0);
  }

  #[test]
  fn near_writes_extend_the_dense_prefix() {
    let mut memory = Memory::new(vec![1, 2, 3]);
    memory.write(Address::new(100), 7);
    assert_eq!(memory.len(), 101);
    assert_eq!(memory.read(Address::new(100)), 7);
    assert_eq!(memory.read(Address::new(50)), 0);
    assert!(memory.sparse.is_empty());
  }

  #[test]
  fn far_writes_stay_sparse() {
    let mut memory = Memory::new(vec![99]);
    let far = Address::new(1 << 40);
    memory.write(far, -5);
    assert_eq!(memory.read(far), -5);
    assert_eq!(memory.len(), (1 << 40) + 1);
    assert_eq!(memory.dense.len(), 1);
    assert_eq!(memory.to_vec(), vec![99]);
    assert_eq!(memory.sparse_cells().collect::<Vec<_>>(), vec![(far, -5)]);
  }

  #[test]
  fn sparse_cells_are_absorbed_when_the_prefix_grows() {
    let mut memory = Memory::new(vec![0; 10]);
    memory.write(Address::new(5_000), 42);
    assert_eq!(memory.sparse.len(), 1);

    // Grow the dense prefix step by step until it covers address 5000.
    memory.write(Address::new(2_000), 1);
    memory.write(Address::new(5_500), 2);
    assert!(memory.sparse.is_empty());
    assert_eq!(memory.read(Address::new(5_000)), 42);
    assert_eq!(memory.read(Address::new(5_500)), 2);
  }

  #[test]
  fn clones_are_independent() {
    let original = Memory::new(vec![1, 2, 3]);
    let mut copy = original.clone();
    copy.write(Address::new(0), 100);
    copy.write(Address::new(1 << 30), 100);
    assert_eq!(original.read(Address::new(0)), 1);
    assert_eq!(original.read(Address::new(1 << 30)), 0);
    assert_eq!(copy.read(Address::new(0)), 100);
  }

  #[test]
  fn window_zero_fills() {
    let memory: Memory = vec![4, 5].into_iter().collect();
    assert_eq!(memory.window(Address::new(1), 3), vec![5, 0, 0]);
    assert_eq!(memory.to_vec(), vec![4, 5]);
  }
}
