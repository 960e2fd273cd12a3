use std::fmt;

use log::{debug, trace};

use crate::{
  arena::Arena,
  block::{Block, BlockInfo, HEADER_SIZE, Ptr},
  error::AllocError,
  registry::FreedRegistry,
};

/// Default arena size in bytes.
pub const ARENA_SIZE: usize = 1024;

/// Default number of released handles the registry remembers.
pub const MAX_FREED_BLOCKS: usize = 100;

/// The first header always sits at the start of the arena.
const HEAD: usize = 0;

/// First-fit allocator over a fixed arena of `N` bytes, remembering up to
/// `R` released handles.
///
/// Blocks are split on allocation and never merged again, and a resize to a
/// smaller size keeps the block's capacity, so fragmentation accumulates
/// over the life of the arena.
pub struct Allocator<const N: usize = ARENA_SIZE, const R: usize = MAX_FREED_BLOCKS> {
  arena: Arena<N>,
  registry: FreedRegistry<R>,
}

impl<const N: usize, const R: usize> Allocator<N, R> {
  /// Creates an allocator whose arena is one free block.
  pub fn new() -> Self {
    let mut allocator = Self {
      arena: Arena::new(),
      registry: FreedRegistry::new(),
    };
    allocator.init();
    allocator
  }

  /// Re-carves the arena into a single free block.
  ///
  /// Every handle issued before the call is invalidated without notice.
  /// The freed-pointer registry is left as it is.
  pub fn init(&mut self) {
    let head = Block::new(N - HEADER_SIZE, true, None);
    self.arena.write_header(HEAD, &head);

    debug!(
      "init: arena = {} bytes, single free block of {} bytes",
      N, head.capacity
    );
  }

  fn find_free_block(
    &self,
    size: usize,
  ) -> Option<usize> {
    let mut current = Some(HEAD);

    while let Some(offset) = current {
      let block = self.arena.read_header(offset);

      if block.is_free && block.capacity >= size {
        trace!("first fit for {} bytes: header {} ({} bytes)", size, offset, block.capacity);
        return Some(offset);
      }
      current = block.next;
    }

    None
  }

  fn split(
    &mut self,
    offset: usize,
    size: usize,
  ) {
    let mut block = self.arena.read_header(offset);

    let remainder_offset = offset + HEADER_SIZE + size;
    let remainder = Block::new(block.capacity - size - HEADER_SIZE, true, block.next);
    self.arena.write_header(remainder_offset, &remainder);

    block.capacity = size;
    block.next = Some(remainder_offset);
    self.arena.write_header(offset, &block);

    trace!(
      "split header {}: {} bytes kept, remainder at {} with {} bytes",
      offset, size, remainder_offset, remainder.capacity
    );
  }

  /// Allocates a block of at least `size` bytes.
  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<Ptr, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidSize);
    }

    let Some(offset) = self.find_free_block(size) else {
      debug!("allocate({}) -> out of space", size);
      return Err(AllocError::OutOfSpace { requested: size });
    };

    if self.arena.read_header(offset).capacity > size + HEADER_SIZE {
      self.split(offset, size);
    }

    let mut block = self.arena.read_header(offset);
    block.is_free = false;
    self.arena.write_header(offset, &block);

    let ptr = Ptr::for_header(offset);
    debug!("allocate({}) -> {} ({} bytes)", size, ptr, block.capacity);
    Ok(ptr)
  }

  /// Allocates a block of at least `size` bytes, or returns `None`.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Ptr> {
    self.try_allocate(size).ok()
  }

  /// Marks the block behind `ptr` free and records `ptr` as released.
  ///
  /// Never fails: `None` is ignored, a handle that names no block is only
  /// recorded, and a full registry drops the record. Releasing the same
  /// handle twice is accepted.
  pub fn release(
    &mut self,
    ptr: impl Into<Option<Ptr>>,
  ) {
    let Some(ptr) = ptr.into() else {
      return;
    };

    if !self.registry.record(ptr) {
      debug!("registry full ({} entries), {} not recorded", R, ptr);
    }

    match self.header_of(ptr) {
      Some(offset) => {
        let mut block = self.arena.read_header(offset);
        block.is_free = true;
        self.arena.write_header(offset, &block);
        debug!("release({}) -> {} bytes free", ptr, block.capacity);
      },
      None => debug!("release({}) -> no block at this address", ptr),
    }
  }

  /// Resizes the block behind `ptr` to hold `new_size` bytes.
  ///
  /// Returns `Ok(None)` when `new_size` is zero, in which case the block is
  /// released. Any handle found in the registry is refused, even when its
  /// address has since been handed out again by `allocate`.
  pub fn try_resize(
    &mut self,
    ptr: impl Into<Option<Ptr>>,
    new_size: usize,
  ) -> Result<Option<Ptr>, AllocError> {
    let Some(ptr) = ptr.into() else {
      return self.try_allocate(new_size).map(Some);
    };

    if self.registry.contains(ptr) {
      debug!("resize({}, {}) -> refused, already released", ptr, new_size);
      return Err(AllocError::UseAfterRelease(ptr));
    }

    if new_size == 0 {
      self.release(ptr);
      return Ok(None);
    }

    let offset = self.header_of(ptr).ok_or(AllocError::UnknownPointer(ptr))?;
    let capacity = self.arena.read_header(offset).capacity;

    if capacity >= new_size {
      debug!("resize({}, {}) -> in place ({} bytes)", ptr, new_size, capacity);
      return Ok(Some(ptr));
    }

    let moved = self.try_allocate(new_size)?;
    self.arena.copy(ptr.offset(), moved.offset(), capacity);
    self.release(ptr);

    debug!("resize({}, {}) -> moved to {}", ptr, new_size, moved);
    Ok(Some(moved))
  }

  /// Resizes the block behind `ptr`, returning `None` on any failure and
  /// when `new_size` is zero.
  pub fn resize(
    &mut self,
    ptr: impl Into<Option<Ptr>>,
    new_size: usize,
  ) -> Option<Ptr> {
    self.try_resize(ptr, new_size).ok().flatten()
  }

  /// Whether `ptr` was ever recorded as released.
  pub fn is_released(
    &self,
    ptr: Ptr,
  ) -> bool {
    self.registry.contains(ptr)
  }

  /// Recorded capacity of the block behind `ptr`.
  pub fn capacity_of(
    &self,
    ptr: Ptr,
  ) -> Option<usize> {
    self
      .header_of(ptr)
      .map(|offset| self.arena.read_header(offset).capacity)
  }

  /// The `capacity` payload bytes of the block behind `ptr`.
  pub fn payload(
    &self,
    ptr: Ptr,
  ) -> Option<&[u8]> {
    let capacity = self.capacity_of(ptr)?;
    Some(self.arena.bytes(ptr.offset()..ptr.offset() + capacity))
  }

  pub fn payload_mut(
    &mut self,
    ptr: Ptr,
  ) -> Option<&mut [u8]> {
    let capacity = self.capacity_of(ptr)?;
    Some(self.arena.bytes_mut(ptr.offset()..ptr.offset() + capacity))
  }

  /// Walks the block chain from the start of the arena.
  pub fn blocks(&self) -> Blocks<'_, N> {
    Blocks {
      arena: &self.arena,
      next: Some(HEAD),
    }
  }

  /// Sum of the capacities of all free blocks.
  pub fn free_bytes(&self) -> usize {
    self
      .blocks()
      .filter(|info| info.free)
      .map(|info| info.capacity)
      .sum()
  }

  /// Capacity of the largest free block, which bounds the next allocation.
  pub fn largest_free_block(&self) -> Option<usize> {
    self
      .blocks()
      .filter(|info| info.free)
      .map(|info| info.capacity)
      .max()
  }

  pub fn registry(&self) -> &FreedRegistry<R> {
    &self.registry
  }

  fn header_of(
    &self,
    ptr: Ptr,
  ) -> Option<usize> {
    self
      .blocks()
      .find(|info| info.ptr == ptr)
      .map(|info| info.header)
  }
}

impl<const N: usize, const R: usize> Default for Allocator<N, R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<const N: usize, const R: usize> fmt::Display for Allocator<N, R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    for info in self.blocks() {
      writeln!(
        f,
        "header {:>5} | payload {} | {:>5} bytes | {}",
        info.header,
        info.ptr,
        info.capacity,
        if info.free { "free" } else { "used" }
      )?;
    }
    write!(
      f,
      "released: {}/{}",
      self.registry.len(),
      self.registry.capacity()
    )
  }
}

/// Iterator over the block chain, in arena order.
pub struct Blocks<'a, const N: usize> {
  arena: &'a Arena<N>,
  next: Option<usize>,
}

impl<const N: usize> Iterator for Blocks<'_, N> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let header = self.next?;
    let block = self.arena.read_header(header);
    self.next = block.next;

    Some(BlockInfo {
      header,
      ptr: Ptr::for_header(header),
      capacity: block.capacity,
      free: block.is_free,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_chain_covers_arena<const N: usize, const R: usize>(allocator: &Allocator<N, R>) {
    let mut expected_header = HEAD;

    for info in allocator.blocks() {
      assert_eq!(info.header, expected_header);
      expected_header += HEADER_SIZE + info.capacity;
    }

    assert_eq!(expected_header, N);
  }

  #[test]
  fn test_init() {
    let allocator = Allocator::<1024>::new();

    let blocks: Vec<_> = allocator.blocks().collect();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].capacity, 1024 - HEADER_SIZE);
    assert!(blocks[0].free);
    assert_chain_covers_arena(&allocator);
  }

  #[test]
  fn test_split_geometry() {
    let mut allocator = Allocator::<1024>::new();

    let first = allocator.allocate(100).unwrap();
    let second = allocator.allocate(200).unwrap();

    assert_eq!(first, Ptr::new(HEADER_SIZE));
    assert_eq!(second, Ptr::new(2 * HEADER_SIZE + 100));

    let blocks: Vec<_> = allocator.blocks().collect();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[2].header, 2 * HEADER_SIZE + 300);
    assert_eq!(blocks[2].capacity, 1024 - 3 * HEADER_SIZE - 300);
    assert!(blocks[2].free);
    assert_chain_covers_arena(&allocator);
  }

  #[test]
  fn test_no_split_when_remainder_cannot_hold_header() {
    let mut allocator = Allocator::<1024>::new();
    let whole = 1024 - HEADER_SIZE;

    let ptr = allocator.allocate(whole - HEADER_SIZE).unwrap();

    assert_eq!(allocator.capacity_of(ptr), Some(whole));
    assert_eq!(allocator.blocks().count(), 1);
    assert_eq!(allocator.allocate(1), None);
  }

  #[test]
  fn test_smallest_split_leaves_one_byte() {
    let mut allocator = Allocator::<1024>::new();
    let whole = 1024 - HEADER_SIZE;

    allocator.allocate(whole - HEADER_SIZE - 1).unwrap();

    assert_eq!(allocator.largest_free_block(), Some(1));
    assert_chain_covers_arena(&allocator);
  }

  #[test]
  fn test_first_fit_prefers_lowest_address() {
    let mut allocator = Allocator::<1024>::new();
    let a = allocator.allocate(100).unwrap();
    let _b = allocator.allocate(100).unwrap();
    let c = allocator.allocate(100).unwrap();

    allocator.release(c);
    allocator.release(a);

    assert_eq!(allocator.allocate(50), Some(a));
  }

  #[test]
  fn test_free_neighbours_never_merge() {
    let mut allocator = Allocator::<1024>::new();
    let a = allocator.allocate(100).unwrap();
    let b = allocator.allocate(100).unwrap();
    let _rest = allocator.allocate(1024 - 4 * HEADER_SIZE - 200).unwrap();

    allocator.release(a);
    allocator.release(b);

    assert_eq!(allocator.free_bytes(), 200);
    assert_eq!(allocator.allocate(150), None);
    assert_chain_covers_arena(&allocator);
  }

  #[test]
  fn test_resize_down_keeps_capacity() {
    let mut allocator = Allocator::<1024>::new();
    let ptr = allocator.allocate(300).unwrap();

    assert_eq!(allocator.resize(ptr, 10), Some(ptr));
    assert_eq!(allocator.capacity_of(ptr), Some(300));
  }

  #[test]
  fn test_resize_moves_and_copies() {
    let mut allocator = Allocator::<1024>::new();
    let ptr = allocator.allocate(4).unwrap();
    allocator.payload_mut(ptr).unwrap().copy_from_slice(b"heap");

    let moved = allocator.resize(ptr, 64).unwrap();

    assert_ne!(moved, ptr);
    assert_eq!(&allocator.payload(moved).unwrap()[..4], b"heap");
    assert!(allocator.is_released(ptr));
    assert!(!allocator.is_released(moved));
  }

  #[test]
  fn test_failed_resize_leaves_block_alone() {
    let mut allocator = Allocator::<256>::new();
    let ptr = allocator.allocate(100).unwrap();

    assert_eq!(
      allocator.try_resize(ptr, 500),
      Err(AllocError::OutOfSpace { requested: 500 })
    );
    assert!(!allocator.is_released(ptr));
    assert_eq!(allocator.capacity_of(ptr), Some(100));
    assert!(!allocator.blocks().next().unwrap().free);
  }

  #[test]
  fn test_resize_to_zero_releases() {
    let mut allocator = Allocator::<1024>::new();
    let ptr = allocator.allocate(32).unwrap();

    assert_eq!(allocator.try_resize(ptr, 0), Ok(None));
    assert!(allocator.is_released(ptr));
    assert!(allocator.blocks().next().unwrap().free);
  }

  #[test]
  fn test_resize_null_allocates() {
    let mut allocator = Allocator::<1024>::new();

    let ptr = allocator.resize(None, 16).unwrap();

    assert_eq!(allocator.capacity_of(ptr), Some(16));
  }

  #[test]
  fn test_unknown_pointer() {
    let mut allocator = Allocator::<1024>::new();
    let stray = Ptr::new(7);

    assert_eq!(
      allocator.try_resize(stray, 8),
      Err(AllocError::UnknownPointer(stray))
    );

    allocator.release(stray);
    assert!(allocator.is_released(stray));
    assert_eq!(allocator.free_bytes(), 1024 - HEADER_SIZE);
    assert_chain_covers_arena(&allocator);
  }

  #[test]
  fn test_saturated_registry_stops_guarding() {
    let mut allocator = Allocator::<1024, 1>::new();
    let a = allocator.allocate(10).unwrap();
    let b = allocator.allocate(10).unwrap();

    allocator.release(a);
    allocator.release(b);

    assert!(allocator.registry().is_full());
    assert!(!allocator.is_released(b));
    // The freed block is still resizable because nothing remembers it.
    assert_eq!(allocator.resize(b, 5), Some(b));
  }

  #[test]
  fn test_reinit_discards_blocks_but_not_registry() {
    let mut allocator = Allocator::<1024>::new();
    let a = allocator.allocate(100).unwrap();
    allocator.allocate(100).unwrap();
    allocator.release(a);

    allocator.init();

    assert_eq!(allocator.blocks().count(), 1);
    assert_eq!(allocator.free_bytes(), 1024 - HEADER_SIZE);
    assert!(allocator.is_released(a));
  }

  #[test]
  fn test_display_lists_every_block() {
    let mut allocator = Allocator::<128>::new();
    allocator.allocate(16).unwrap();

    let dump = allocator.to_string();

    assert_eq!(dump.lines().count(), 3);
    assert!(dump.contains("used"));
    assert!(dump.contains("free"));
    assert!(dump.ends_with("released: 0/100"));
  }
}
