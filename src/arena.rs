use std::ops::Range;

use crate::block::{Block, HEADER_SIZE};

/// Fixed-size byte buffer holding every header and payload.
///
/// The buffer lives inline, so an arena never touches the host allocator.
pub struct Arena<const N: usize> {
  bytes: [u8; N],
}

impl<const N: usize> Arena<N> {
  pub fn new() -> Self {
    const { assert!(N >= HEADER_SIZE, "arena cannot hold a single header") };

    Self { bytes: [0; N] }
  }

  pub fn read_header(
    &self,
    offset: usize,
  ) -> Block {
    let mut raw = [0u8; HEADER_SIZE];
    raw.copy_from_slice(&self.bytes[header_range(offset)]);
    Block::decode(&raw)
  }

  pub fn write_header(
    &mut self,
    offset: usize,
    block: &Block,
  ) {
    self.bytes[header_range(offset)].copy_from_slice(&block.encode());
  }

  pub fn bytes(
    &self,
    range: Range<usize>,
  ) -> &[u8] {
    &self.bytes[range]
  }

  pub fn bytes_mut(
    &mut self,
    range: Range<usize>,
  ) -> &mut [u8] {
    &mut self.bytes[range]
  }

  /// Copies `len` bytes from `src` to `dst`; the ranges may overlap.
  pub fn copy(
    &mut self,
    src: usize,
    dst: usize,
    len: usize,
  ) {
    self.bytes.copy_within(src..src + len, dst);
  }
}

impl<const N: usize> Default for Arena<N> {
  fn default() -> Self {
    Self::new()
  }
}

fn header_range(offset: usize) -> Range<usize> {
  offset..offset + HEADER_SIZE
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_written_in_place() {
    let mut arena = Arena::<64>::new();
    let block = Block::new(16, true, Some(40));

    arena.write_header(0, &block);

    assert_eq!(arena.read_header(0), block);
    assert_eq!(arena.bytes(0..8), &16u64.to_le_bytes());
    assert!(arena.bytes(HEADER_SIZE..64).iter().all(|&b| b == 0));
  }

  #[test]
  fn test_copy() {
    let mut arena = Arena::<32>::new();
    arena.bytes_mut(0..4).copy_from_slice(&[1, 2, 3, 4]);

    arena.copy(0, 10, 4);

    assert_eq!(arena.bytes(10..14), &[1, 2, 3, 4]);
  }
}
