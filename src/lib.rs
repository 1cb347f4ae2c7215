//! # brkalloc - A First-Fit Free-List Allocator on the Program Break
//!
//! This crate provides a small general-purpose allocator that carves blocks
//! off the top of a heap region, tracks every block in a single linked list,
//! and gives memory back to the OS when the block at the very top is released.
//!
//! ## Overview
//!
//! ```text
//!   Block Directory:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌────┬─────┬────┬─────┬────┬──────┬────┬───┐                       │
//!   │   │hdr │ A1  │hdr │ F2  │hdr │ A3   │hdr │A4 │                       │
//!   │   └────┴─────┴────┴─────┴────┴──────┴────┴───┘                       │
//!   │    ▲          ▲          ▲           ▲       ▲                       │
//!   │    head       free       │           tail    Program Break           │
//!   │               (reusable) │                                           │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   allocate : first free block with size >= request, else grow the break.
//!   release  : tail block touching the break -> shrink the break,
//!              any other block                -> mark free.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - Alignment macro and helpers (align!)
//!   ├── block      - Block header encoding
//!   ├── brk        - Heap-extension primitives (sbrk, bounded region)
//!   ├── directory  - The block list: first-fit search, tail pop, coalescing
//!   ├── allocator  - BrkAllocator: allocate / release / zeroed_allocate / resize
//!   ├── config     - Policy knobs and BRKALLOC_POLICY
//!   ├── error      - AllocError, BreakError
//!   └── abi        - malloc / free / calloc / realloc (feature "interpose")
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brkalloc::{BoundedAllocator, BoundedHeap};
//!
//! let heap = BoundedHeap::with_capacity(4096).unwrap();
//! let allocator = BoundedAllocator::new(heap);
//!
//! let a = allocator.allocate(64).unwrap();
//! unsafe { allocator.release(a.as_ptr()) };
//!
//! let b = allocator.allocate(32).unwrap();
//! let c = allocator.allocate(128).unwrap();
//! unsafe {
//!     allocator.release(c.as_ptr());
//!     allocator.release(b.as_ptr());
//! }
//! assert!(allocator.is_empty());
//! ```
//!
//! As the process allocator (the default lock spins and never allocates):
//!
//! ```rust,ignore
//! use brkalloc::{BrkAllocator, Sbrk};
//!
//! #[global_allocator]
//! static GLOBAL: BrkAllocator<Sbrk> = BrkAllocator::new(Sbrk);
//! ```
//!
//! ## How It Works
//!
//! ```text
//!   Single Allocation:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size | is_free  │  │  ┌──────────────────────────┐  │
//!   │  │ next: ptr/None  │  │  │  size bytes (multiple    │  │
//!   │  └─────────────────┘  │  │  of 16) usable           │  │
//!   │      16 bytes         │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! - A request is rounded up to 16 bytes; the rounded size is recorded.
//! - Reused blocks are never split, so they keep their original size.
//! - Released interior blocks are not merged unless coalescing is enabled.
//! - One lock guards the whole directory and the break. Process-wide
//!   instances use a spin lock; private heaps may use `parking_lot`.
//!
//! ## Limitations
//!
//! - **Single global list**: allocation is linear in the number of blocks.
//! - **Tail-only shrinking**: interior holes are recycled, never returned.
//! - **Undetected misuse**: double release and foreign pointers are undefined
//!   behavior.
//! - **Shared break**: with [`Sbrk`], nothing else in the process may move the
//!   break while blocks are live, or tail shrinking stops matching.

pub mod align;
mod allocator;
mod block;
mod brk;
pub mod config;
mod directory;
mod error;

#[cfg(feature = "interpose")]
pub mod abi;

pub use allocator::{BoundedAllocator, BrkAllocator, HeapStats, SpinRawMutex};
pub use block::HEADER_SIZE;
pub use brk::{BoundedHeap, ProgramBreak, Sbrk};
pub use config::{AllocatorConfig, Policy};
pub use directory::BlockInfo;
pub use error::{AllocError, BreakError};
