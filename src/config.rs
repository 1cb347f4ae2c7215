//! Allocator policy.
//!
//! The process-wide allocator behind the C entry points reads its policy from
//! the `BRKALLOC_POLICY` environment variable:
//! - `baseline` (default): first-fit reuse, no coalescing, only the released
//!   tail block is returned to the OS.
//! - `coalesce`: released interior blocks merge with adjacent free neighbours.
//! - `compact`: `coalesce`, plus free blocks left at the top of the heap after
//!   a tail release are returned to the OS as well.

use std::ffi::CStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable consulted by [`policy_from_env`].
pub const POLICY_ENV: &CStr = c"BRKALLOC_POLICY";

/// Knobs of a [`BrkAllocator`](crate::BrkAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorConfig {
  /// Merge a released interior block with physically adjacent free blocks.
  pub coalesce: bool,
  /// After shrinking the heap, keep shrinking while the new tail is free.
  pub trim_free_tail: bool,
}

impl AllocatorConfig {
  /// First-fit, no coalescing, single tail shrink.
  pub const BASELINE: Self = Self {
    coalesce: false,
    trim_free_tail: false,
  };

  pub const fn with_coalescing(
    mut self,
    coalesce: bool,
  ) -> Self {
    self.coalesce = coalesce;
    self
  }

  pub const fn with_tail_trimming(
    mut self,
    trim_free_tail: bool,
  ) -> Self {
    self.trim_free_tail = trim_free_tail;
    self
  }
}

/// Named presets selectable through [`POLICY_ENV`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
  #[default]
  Baseline,
  Coalesce,
  Compact,
}

impl Policy {
  /// Parse from string (case-insensitive). Unknown values select `Baseline`.
  ///
  /// Compares in place without allocating, so it is safe to call while the
  /// allocator it configures is being set up.
  #[must_use]
  pub fn from_str_loose(s: &str) -> Self {
    let s = s.trim();
    if s.eq_ignore_ascii_case("coalesce") || s.eq_ignore_ascii_case("merge") {
      Self::Coalesce
    } else if s.eq_ignore_ascii_case("compact") || s.eq_ignore_ascii_case("trim") {
      Self::Compact
    } else {
      Self::Baseline
    }
  }

  #[must_use]
  pub const fn config(self) -> AllocatorConfig {
    match self {
      Self::Baseline => AllocatorConfig::BASELINE,
      Self::Coalesce => AllocatorConfig::BASELINE.with_coalescing(true),
      Self::Compact => AllocatorConfig::BASELINE
        .with_coalescing(true)
        .with_tail_trimming(true),
    }
  }
}

// 0=unresolved, 1..=3 resolved policy, 255=resolving.
static CACHED_POLICY: AtomicU8 = AtomicU8::new(0);

const POLICY_UNRESOLVED: u8 = 0;
const POLICY_BASELINE: u8 = 1;
const POLICY_COALESCE: u8 = 2;
const POLICY_COMPACT: u8 = 3;
const POLICY_RESOLVING: u8 = 255;

fn policy_to_u8(policy: Policy) -> u8 {
  match policy {
    Policy::Baseline => POLICY_BASELINE,
    Policy::Coalesce => POLICY_COALESCE,
    Policy::Compact => POLICY_COMPACT,
  }
}

fn u8_to_policy(v: u8) -> Policy {
  match v {
    POLICY_COALESCE => Policy::Coalesce,
    POLICY_COMPACT => Policy::Compact,
    _ => Policy::Baseline,
  }
}

/// Policy of the process-wide allocator (reads the environment on first call,
/// caches thereafter).
///
/// The variable is read with `getenv`, which does not allocate. A call that
/// arrives while another thread is resolving gets `Baseline`.
#[must_use]
pub fn policy_from_env() -> Policy {
  let cached = CACHED_POLICY.load(Ordering::Acquire);

  if cached != POLICY_UNRESOLVED && cached != POLICY_RESOLVING {
    return u8_to_policy(cached);
  }

  if cached == POLICY_RESOLVING {
    return Policy::Baseline;
  }

  if CACHED_POLICY
    .compare_exchange(
      POLICY_UNRESOLVED,
      POLICY_RESOLVING,
      Ordering::AcqRel,
      Ordering::Acquire,
    )
    .is_err()
  {
    return u8_to_policy(CACHED_POLICY.load(Ordering::Acquire));
  }

  let policy = read_policy_env();
  CACHED_POLICY.store(policy_to_u8(policy), Ordering::Release);
  policy
}

fn read_policy_env() -> Policy {
  // SAFETY: `POLICY_ENV` is NUL-terminated; the returned pointer, if any,
  // points into the environment block.
  let raw = unsafe { libc::getenv(POLICY_ENV.as_ptr()) };
  if raw.is_null() {
    return Policy::Baseline;
  }

  let value = unsafe { CStr::from_ptr(raw) };
  match value.to_str() {
    Ok(s) => Policy::from_str_loose(s),
    Err(_) => Policy::Baseline,
  }
}
