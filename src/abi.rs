//! C entry points (`malloc`, `free`, `calloc`, `realloc`, `malloc_usable_size`).
//!
//! All five are served by one process-wide [`BrkAllocator`] over the real
//! program break, with its policy taken from `BRKALLOC_POLICY`. Failures return
//! null and set `errno`.
//!
//! In test builds the symbols are not exported, so the test binary keeps the
//! platform allocator.

use std::ffi::{c_int, c_void};
use std::ptr::{self, NonNull};

use crate::allocator::BrkAllocator;
use crate::brk::Sbrk;
use crate::error::AllocError;

static PROCESS_HEAP: BrkAllocator<Sbrk> = BrkAllocator::from_env(Sbrk);

/// The allocator behind the exported symbols.
pub fn process_heap() -> &'static BrkAllocator<Sbrk> {
  &PROCESS_HEAP
}

#[cfg(target_os = "linux")]
fn errno_location() -> *mut c_int {
  unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn errno_location() -> *mut c_int {
  unsafe { libc::__error() }
}

#[inline]
fn set_errno(code: c_int) {
  // SAFETY: the errno location is thread-local and always valid.
  unsafe { *errno_location() = code };
}

#[inline]
fn into_c(result: Result<NonNull<u8>, AllocError>) -> *mut c_void {
  match result {
    Ok(payload) => payload.as_ptr().cast(),
    Err(err) => {
      set_errno(err.errno());
      ptr::null_mut()
    },
  }
}

/// # Safety
///
/// Standard `malloc` contract.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
  into_c(PROCESS_HEAP.allocate(size))
}

/// # Safety
///
/// `ptr` must be null or a live pointer returned by this module.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  unsafe { PROCESS_HEAP.release(ptr.cast()) }
}

/// # Safety
///
/// Standard `calloc` contract.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn calloc(
  count: usize,
  size: usize,
) -> *mut c_void {
  into_c(PROCESS_HEAP.zeroed_allocate(count, size))
}

/// # Safety
///
/// `ptr` must be null or a live pointer returned by this module.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn realloc(
  ptr: *mut c_void,
  size: usize,
) -> *mut c_void {
  into_c(unsafe { PROCESS_HEAP.resize(ptr.cast(), size) })
}

/// # Safety
///
/// `ptr` must be null or a live pointer returned by this module.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn malloc_usable_size(ptr: *mut c_void) -> usize {
  match NonNull::new(ptr.cast::<u8>()) {
    Some(payload) => unsafe { PROCESS_HEAP.usable_size(payload) },
    None => 0,
  }
}
