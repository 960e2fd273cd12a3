use crate::block::Ptr;

/// Reasons an allocator operation returns no handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
  /// A zero-byte block was requested.
  #[error("cannot allocate zero bytes")]
  InvalidSize,

  /// No free block has enough capacity, either because the arena is
  /// exhausted or because the free space is fragmented.
  #[error("out of space: no free block can hold {requested} bytes")]
  OutOfSpace { requested: usize },

  /// The handle appears in the freed-pointer registry.
  #[error("pointer {0} was already released")]
  UseAfterRelease(Ptr),

  /// The handle does not name the payload of any block.
  #[error("pointer {0} does not belong to any block")]
  UnknownPointer(Ptr),
}
