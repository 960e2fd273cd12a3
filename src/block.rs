use std::fmt;

/// Size in bytes of an encoded block header.
///
/// ```text
///   0        8        12       16                24
///   ┌────────┬────────┬────────┬─────────────────┐
///   │capacity│ is_free│  pad   │      next       │
///   │  u64   │  u32   │        │ u64 (MAX: none) │
///   └────────┴────────┴────────┴─────────────────┘
/// ```
pub const HEADER_SIZE: usize = 24;

const NO_NEXT: u64 = u64::MAX;

/// Header record stored at the start of every block in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub capacity: usize,
  pub is_free: bool,
  /// Arena offset of the next header.
  pub next: Option<usize>,
}

impl Block {
  pub fn new(
    capacity: usize,
    is_free: bool,
    next: Option<usize>,
  ) -> Self {
    Self {
      capacity,
      is_free,
      next,
    }
  }

  pub fn encode(&self) -> [u8; HEADER_SIZE] {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes[0..8].copy_from_slice(&(self.capacity as u64).to_le_bytes());
    bytes[8..12].copy_from_slice(&u32::from(self.is_free).to_le_bytes());
    let next = self.next.map_or(NO_NEXT, |offset| offset as u64);
    bytes[16..24].copy_from_slice(&next.to_le_bytes());
    bytes
  }

  pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
    let mut word = [0u8; 8];
    let mut flag = [0u8; 4];

    word.copy_from_slice(&bytes[0..8]);
    let capacity = u64::from_le_bytes(word) as usize;

    flag.copy_from_slice(&bytes[8..12]);
    let is_free = u32::from_le_bytes(flag) != 0;

    word.copy_from_slice(&bytes[16..24]);
    let next = match u64::from_le_bytes(word) {
      NO_NEXT => None,
      offset => Some(offset as usize),
    };

    Self {
      capacity,
      is_free,
      next,
    }
  }
}

/// Handle to a block's payload: the payload's byte offset in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ptr(usize);

impl Ptr {
  /// Builds a handle from a raw arena offset.
  ///
  /// Nothing checks that the offset names a real payload; the allocator
  /// resolves handles by lookup and ignores those that match no block.
  pub const fn new(offset: usize) -> Self {
    Self(offset)
  }

  pub const fn offset(self) -> usize {
    self.0
  }

  pub(crate) const fn for_header(header: usize) -> Self {
    Self(header + HEADER_SIZE)
  }
}

impl fmt::Display for Ptr {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "0x{:04x}", self.0)
  }
}

/// Snapshot of one block as seen while walking the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Arena offset of the header.
  pub header: usize,
  pub ptr: Ptr,
  pub capacity: usize,
  pub free: bool,
}
