use std::mem;
use std::ptr::NonNull;

use crate::align::BLOCK_ALIGN;

/// Size of the metadata prefixed to every payload.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const FREE_BIT: usize = 1;

/// Header stored immediately before every payload handed out.
///
/// Capacities are always multiples of [`BLOCK_ALIGN`], so the low bit of the
/// size word is free to carry the `is_free` flag.
///
/// ```text
///   ┌──────────────────────────┬──────────────────┬──────────────────┐
///   │ size | is_free (1 word)  │ next (1 word)    │ payload ...      │
///   └──────────────────────────┴──────────────────┴──────────────────┘
///   ▲                                             ▲
///   header                                        payload pointer
/// ```
#[repr(C, align(16))]
pub struct Block {
  size_and_flag: usize,
  pub next: Option<NonNull<Block>>,
}

const _: () = assert!(HEADER_SIZE == BLOCK_ALIGN);

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: Option<NonNull<Block>>,
  ) -> Self {
    debug_assert_eq!(size % BLOCK_ALIGN, 0, "block capacity must be aligned");
    Self {
      size_and_flag: size | if is_free { FREE_BIT } else { 0 },
      next,
    }
  }

  #[inline]
  pub fn size(&self) -> usize {
    self.size_and_flag & !FREE_BIT
  }

  #[inline]
  pub fn set_size(
    &mut self,
    size: usize,
  ) {
    debug_assert_eq!(size % BLOCK_ALIGN, 0, "block capacity must be aligned");
    self.size_and_flag = size | (self.size_and_flag & FREE_BIT);
  }

  #[inline]
  pub fn is_free(&self) -> bool {
    self.size_and_flag & FREE_BIT != 0
  }

  #[inline]
  pub fn set_free(
    &mut self,
    is_free: bool,
  ) {
    if is_free {
      self.size_and_flag |= FREE_BIT;
    } else {
      self.size_and_flag &= !FREE_BIT;
    }
  }

  /// Bytes this block occupies on the heap, header included.
  #[inline]
  pub fn span(&self) -> usize {
    HEADER_SIZE + self.size()
  }

  /// Address of the first payload byte of `block`.
  #[inline]
  pub fn payload(block: NonNull<Block>) -> NonNull<u8> {
    // SAFETY: a header is always followed by its payload, so stepping over it
    // stays inside the same heap region.
    unsafe { block.cast::<u8>().add(HEADER_SIZE) }
  }

  /// Address one past the last payload byte of `block`.
  ///
  /// # Safety
  ///
  /// `block` must point to a live header.
  #[inline]
  pub unsafe fn payload_end(block: NonNull<Block>) -> *mut u8 {
    unsafe { Self::payload(block).as_ptr().add(block.as_ref().size()) }
  }

  /// Recovers the header from a payload pointer.
  ///
  /// # Safety
  ///
  /// `payload` must have been produced by [`Block::payload`].
  #[inline]
  pub unsafe fn from_payload(payload: NonNull<u8>) -> NonNull<Block> {
    unsafe { payload.sub(HEADER_SIZE).cast::<Block>() }
  }
}
