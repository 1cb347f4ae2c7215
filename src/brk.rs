//! Heap-extension primitives.
//!
//! The allocator never touches the address space directly; it asks a
//! [`ProgramBreak`] to move the top of its heap by a signed delta.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use libc::{c_void, intptr_t, sbrk};

use crate::align::BLOCK_ALIGN;
use crate::error::BreakError;

/// A contiguous region whose upper boundary can be moved.
///
/// # Safety
///
/// Implementations must hand out each byte between two boundaries to at most
/// one caller, must keep memory below the boundary readable and writable, and
/// must not allocate through the allocator that drives them.
pub unsafe trait ProgramBreak {
  /// Moves the boundary by `delta` bytes and returns the previous boundary.
  ///
  /// `delta == 0` only queries the current boundary.
  fn adjust(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, BreakError>;

  /// Current boundary.
  fn current(&mut self) -> Result<NonNull<u8>, BreakError> {
    self.adjust(0)
  }
}

/// The process break, moved with `sbrk(2)`.
///
/// The break is a single per-process resource: any other code calling
/// `brk`/`sbrk` behind this allocator's back invalidates the tail-shrink test.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

// SAFETY: the kernel hands out fresh pages between the old and new break.
unsafe impl ProgramBreak for Sbrk {
  fn adjust(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, BreakError> {
    let previous = unsafe { sbrk(delta as intptr_t) };

    if previous == usize::MAX as *mut c_void {
      return Err(BreakError::Exhausted { requested: delta });
    }

    NonNull::new(previous.cast::<u8>()).ok_or(BreakError::Exhausted { requested: delta })
  }
}

/// A private, fixed-capacity region with break semantics.
///
/// Lets several independent heaps coexist in one process, and makes exhaustion
/// reproducible.
pub struct BoundedHeap {
  base: NonNull<u8>,
  capacity: usize,
  top: usize,
}

// SAFETY: the region is owned exclusively by this value.
unsafe impl Send for BoundedHeap {}

impl BoundedHeap {
  /// Reserves `capacity` bytes (rounded up to [`BLOCK_ALIGN`]) from the system
  /// allocator. Returns `None` if that reservation fails.
  pub fn with_capacity(capacity: usize) -> Option<Self> {
    let capacity = crate::align::checked_align(capacity.max(BLOCK_ALIGN))?;
    let layout = Layout::from_size_align(capacity, BLOCK_ALIGN).ok()?;
    let base = NonNull::new(unsafe { alloc::alloc(layout) })?;

    Some(Self {
      base,
      capacity,
      top: 0,
    })
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes currently below the boundary.
  pub fn used(&self) -> usize {
    self.top
  }

  pub fn base(&self) -> NonNull<u8> {
    self.base
  }
}

// SAFETY: `adjust` only moves `top` inside `[0, capacity]`, so the bytes it
// hands out belong to the owned region.
unsafe impl ProgramBreak for BoundedHeap {
  fn adjust(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, BreakError> {
    let previous = self.top;

    let next = previous
      .checked_add_signed(delta)
      .filter(|&top| top <= self.capacity);

    match next {
      Some(top) => {
        self.top = top;
        Ok(unsafe { self.base.add(previous) })
      },
      None if delta > 0 => Err(BreakError::Exhausted { requested: delta }),
      None => Err(BreakError::OutOfRange { requested: delta }),
    }
  }
}

impl Drop for BoundedHeap {
  fn drop(&mut self) {
    // SAFETY: same layout the region was allocated with.
    unsafe {
      alloc::dealloc(
        self.base.as_ptr(),
        Layout::from_size_align_unchecked(self.capacity, BLOCK_ALIGN),
      );
    }
  }
}
