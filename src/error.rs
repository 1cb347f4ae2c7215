use thiserror::Error;

/// Detectable failures of the allocation entry points.
///
/// Misuse such as double release or foreign pointers is undefined behavior and
/// is never reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("invalid argument: zero-sized request")]
  InvalidArgument,
  #[error("size overflow: {count} elements of {element_size} bytes")]
  Overflow { count: usize, element_size: usize },
  #[error("out of memory: the heap cannot grow")]
  OutOfMemory,
}

/// Failures of a [`ProgramBreak`](crate::ProgramBreak).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakError {
  #[error("cannot move the break by {requested} bytes: region exhausted")]
  Exhausted { requested: isize },
  #[error("cannot move the break by {requested} bytes: below the heap base")]
  OutOfRange { requested: isize },
}

impl From<BreakError> for AllocError {
  fn from(_: BreakError) -> Self {
    Self::OutOfMemory
  }
}

impl AllocError {
  /// `errno` value a C caller expects for this failure.
  pub fn errno(self) -> libc::c_int {
    match self {
      Self::InvalidArgument | Self::Overflow { .. } => libc::EINVAL,
      Self::OutOfMemory => libc::ENOMEM,
    }
  }
}
