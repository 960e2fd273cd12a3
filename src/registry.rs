use crate::block::Ptr;

/// Bounded, append-only record of released handles.
///
/// Entries are kept in release order, duplicates included, and are never
/// removed. Once `R` entries are stored, further records are dropped.
pub struct FreedRegistry<const R: usize> {
  entries: [Ptr; R],
  len: usize,
}

impl<const R: usize> FreedRegistry<R> {
  pub fn new() -> Self {
    Self {
      entries: [Ptr::new(0); R],
      len: 0,
    }
  }

  /// Appends `ptr`, returning `false` if the registry was already full.
  pub fn record(
    &mut self,
    ptr: Ptr,
  ) -> bool {
    if self.is_full() {
      return false;
    }

    self.entries[self.len] = ptr;
    self.len += 1;
    true
  }

  pub fn contains(
    &self,
    ptr: Ptr,
  ) -> bool {
    self.iter().any(|entry| entry == ptr)
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn capacity(&self) -> usize {
    R
  }

  pub fn is_full(&self) -> bool {
    self.len == R
  }

  pub fn iter(&self) -> impl Iterator<Item = Ptr> + '_ {
    self.entries[..self.len].iter().copied()
  }
}

impl<const R: usize> Default for FreedRegistry<R> {
  fn default() -> Self {
    Self::new()
  }
}
