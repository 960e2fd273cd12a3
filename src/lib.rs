//! # heapsim - A Heap Simulator on a Fixed Arena
//!
//! This crate implements a small **first-fit free-list allocator** that
//! carves every block out of a fixed byte arena. It never asks the host for
//! memory; its purpose is to make allocator internals visible: block
//! headers, first-fit search, splitting, and a registry of released
//! pointers that rejects resizing them.
//!
//! ## Overview
//!
//! ```text
//!   Arena after allocate(100), allocate(200):
//!
//!   0        24            124      148           348      372                  1024
//!   ┌────────┬─────────────┬────────┬─────────────┬────────┬─────────────────────┐
//!   │ header │ payload 100 │ header │ payload 200 │ header │  free payload 652   │
//!   │  used  │             │  used  │             │  free  │                     │
//!   └───┬────┴─────────────┴───┬────┴─────────────┴───┬────┴─────────────────────┘
//!       │        next          ▲        next          ▲
//!       └──────────────────────┘──────────────────────┘
//! ```
//!
//! The chain of headers always covers the arena exactly, from offset 0 to
//! the last byte. A [`Ptr`] is the offset of a payload; the allocator maps
//! it back to its header by walking the chain, never by subtracting from
//! it.
//!
//! ## Crate Structure
//!
//! ```text
//!   heapsim
//!   ├── arena     - Fixed byte buffer and header encoding sites
//!   ├── block     - Block header, Ptr handle, BlockInfo
//!   ├── error     - AllocError
//!   ├── heap      - Allocator: init / allocate / release / resize
//!   └── registry  - FreedRegistry of released handles
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use heapsim::Allocator;
//!
//! let mut heap: Allocator = Allocator::new();
//!
//! let p1 = heap.allocate(100).unwrap();
//! let p2 = heap.allocate(200).unwrap();
//! heap.release(p1);
//!
//! let p2 = heap.resize(p2, 300).unwrap();
//! assert_eq!(heap.capacity_of(p2), Some(300));
//!
//! // Released handles can never be resized again.
//! assert!(heap.is_released(p1));
//! assert_eq!(heap.resize(p1, 50), None);
//! ```
//!
//! ## Allocation
//!
//! ```text
//!   Split of a free block for allocate(n):
//!
//!   before  ┌────────┬──────────────────────────────────────┐
//!           │ header │            capacity = c              │
//!           └────────┴──────────────────────────────────────┘
//!
//!   after   ┌────────┬──────────┬────────┬──────────────────┐
//!           │ header │    n     │ header │ c - n - header   │
//!           │  used  │          │  free  │                  │
//!           └────────┴──────────┴────────┴──────────────────┘
//! ```
//!
//! A block is split only when `c > n + HEADER_SIZE`; otherwise the whole
//! block is handed out and its extra bytes stay with it.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **No coalescing**: adjacent free blocks are never merged
//! - **No shrinking**: resizing down keeps the block's capacity
//! - **Fixed arena**: the arena never grows
//! - **Sticky registry**: a released address stays rejected by `resize`
//!   even after `allocate` hands it out again; once the registry is full,
//!   further releases are not remembered
//!
//! ## Logging
//!
//! Decisions are reported through the [`log`] facade at `debug` and
//! `trace` level. Install any logger to see them.

mod arena;
mod block;
mod error;
mod heap;
mod registry;

pub use block::{BlockInfo, HEADER_SIZE, Ptr};
pub use error::AllocError;
pub use heap::{ARENA_SIZE, Allocator, Blocks, MAX_FREED_BLOCKS};
pub use registry::FreedRegistry;
