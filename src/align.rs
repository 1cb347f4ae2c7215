/// Boundary every header and every payload is placed on.
pub const BLOCK_ALIGN: usize = 16;

/// Rounds `value` up to the next multiple of a power-of-two boundary.
///
/// With a single argument the boundary is [`BLOCK_ALIGN`].
///
/// # Examples
///
/// ```rust
/// use brkalloc::align;
///
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(32), 32);
/// assert_eq!(align!(13, 8), 16);
/// assert_eq!(align!(3, 4), 4);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align!($value, $crate::align::BLOCK_ALIGN)
  };
  ($value:expr, $to:expr) => {
    ($value + $to - 1) & !($to - 1)
  };
}

/// Like [`align!`] with [`BLOCK_ALIGN`], but returns `None` instead of wrapping.
pub const fn checked_align(value: usize) -> Option<usize> {
  match value.checked_add(BLOCK_ALIGN - 1) {
    Some(padded) => Some(padded & !(BLOCK_ALIGN - 1)),
    None => None,
  }
}

/// Number of bytes needed to move `address` up to the next [`BLOCK_ALIGN`] boundary.
pub const fn padding_for(address: usize) -> usize {
  align!(address) - address
}
