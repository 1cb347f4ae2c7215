use std::alloc::{GlobalAlloc, Layout};
use std::ptr::{self, NonNull};

use log::{debug, trace, warn};
use parking_lot::lock_api::{Mutex, RawMutex};

use crate::align::{BLOCK_ALIGN, checked_align, padding_for};
use crate::block::{Block, HEADER_SIZE};
use crate::brk::{BoundedHeap, ProgramBreak};
use crate::config::{AllocatorConfig, policy_from_env};
use crate::directory::{BlockDirectory, BlockInfo};
use crate::error::{AllocError, BreakError};

/// Where an allocation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
  Reused,
  Extended { span: usize, pad: usize },
}

/// What happened to a released block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Released {
  Shrunk { bytes: usize },
  Recycled,
  ShrinkFailed(BreakError),
}

#[derive(Debug, Clone, Copy)]
enum Settings {
  Fixed(AllocatorConfig),
  Environment,
}

/// Totals over every block in the directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
  pub blocks: usize,
  pub free_blocks: usize,
  /// Capacity of blocks in use, headers excluded.
  pub used_bytes: usize,
  /// Capacity of free blocks, headers excluded.
  pub free_bytes: usize,
}

/// The directory and the break it carves from, guarded together.
struct HeapState<B> {
  directory: BlockDirectory,
  brk: B,
}

impl<B: ProgramBreak> HeapState<B> {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Result<(NonNull<u8>, Placement), AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidArgument);
    }

    if let Some(mut block) = self.directory.find_reusable(size) {
      unsafe { block.as_mut().set_free(false) };
      return Ok((Block::payload(block), Placement::Reused));
    }

    let capacity = checked_align(size).ok_or(AllocError::OutOfMemory)?;
    let span = capacity
      .checked_add(HEADER_SIZE)
      .filter(|&span| span <= isize::MAX as usize)
      .ok_or(AllocError::OutOfMemory)?;

    let pad = self.align_break()?;
    let block = self.brk.adjust(span as isize)?.cast::<Block>();

    unsafe {
      block.write(Block::new(capacity, false, None));
      self.directory.push_tail(block);
    }

    Ok((Block::payload(block), Placement::Extended { span, pad }))
  }

  /// Moves an unaligned break up to the next block boundary.
  fn align_break(&mut self) -> Result<usize, BreakError> {
    let top = self.brk.current()?;
    let pad = padding_for(top.as_ptr() as usize);

    if pad != 0 {
      self.brk.adjust(pad as isize)?;
    }

    Ok(pad)
  }

  /// # Safety
  ///
  /// `payload` must be live and owned by this heap.
  unsafe fn release(
    &mut self,
    payload: NonNull<u8>,
    config: AllocatorConfig,
  ) -> Released {
    unsafe {
      let mut block = Block::from_payload(payload);

      if self.ends_at_break(block) {
        match self.shrink_tail() {
          Ok(mut bytes) => {
            if config.trim_free_tail {
              bytes += self.trim_free_tail();
            }
            return Released::Shrunk { bytes };
          },
          Err(err) => {
            block.as_mut().set_free(true);
            return Released::ShrinkFailed(err);
          },
        }
      }

      block.as_mut().set_free(true);
      if config.coalesce {
        self.directory.coalesce(block);
      }

      Released::Recycled
    }
  }

  /// Whether `block` is the tail and nothing sits between it and the break.
  fn ends_at_break(
    &mut self,
    block: NonNull<Block>,
  ) -> bool {
    if self.directory.tail() != Some(block) {
      return false;
    }

    match self.brk.current() {
      Ok(top) => unsafe { Block::payload_end(block) == top.as_ptr() },
      Err(_) => false,
    }
  }

  /// Gives the tail block back to the break and unlinks it.
  fn shrink_tail(&mut self) -> Result<usize, BreakError> {
    let Some(tail) = self.directory.tail() else {
      return Ok(0);
    };

    let span = unsafe { tail.as_ref().span() };
    self.brk.adjust(-(span as isize))?;
    self.directory.pop_tail();

    Ok(span)
  }

  fn trim_free_tail(&mut self) -> usize {
    let mut released = 0;

    while let Some(tail) = self.directory.tail() {
      if !unsafe { tail.as_ref().is_free() } || !self.ends_at_break(tail) {
        break;
      }

      match self.shrink_tail() {
        Ok(bytes) => released += bytes,
        Err(_) => break,
      }
    }

    released
  }

  fn stats(&self) -> HeapStats {
    self
      .directory
      .infos()
      .fold(HeapStats::default(), |mut stats, info| {
        stats.blocks += 1;
        if info.is_free {
          stats.free_blocks += 1;
          stats.free_bytes += info.size;
        } else {
          stats.used_bytes += info.size;
        }
        stats
      })
  }
}

/// Default lock: spins and never allocates, so it can guard the allocator that
/// serves the whole process.
pub type SpinRawMutex = spin::mutex::SpinMutex<()>;

/// An allocator over a private region. Nothing it guards is reachable from the
/// process allocator, so waiters can park.
pub type BoundedAllocator = BrkAllocator<BoundedHeap, parking_lot::RawMutex>;

/// A first-fit free-list allocator over a [`ProgramBreak`].
///
/// All bookkeeping lives in one context object guarded by a single lock, so
/// independent heaps can coexist and every public operation is atomic with
/// respect to the others.
///
/// `R` must not allocate when contended if this allocator serves the process
/// (`#[global_allocator]` or the C entry points): a lock that parks through
/// the heap it guards re-enters itself.
pub struct BrkAllocator<B, R = SpinRawMutex> {
  settings: Settings,
  state: Mutex<R, HeapState<B>>,
}

impl<B: ProgramBreak, R: RawMutex> BrkAllocator<B, R> {
  /// Baseline policy: first-fit reuse, no coalescing.
  pub const fn new(brk: B) -> Self {
    Self::with_config(brk, AllocatorConfig::BASELINE)
  }

  pub const fn with_config(
    brk: B,
    config: AllocatorConfig,
  ) -> Self {
    Self::with_settings(brk, Settings::Fixed(config))
  }

  /// Policy resolved from `BRKALLOC_POLICY` on first use.
  pub const fn from_env(brk: B) -> Self {
    Self::with_settings(brk, Settings::Environment)
  }

  const fn with_settings(
    brk: B,
    settings: Settings,
  ) -> Self {
    Self {
      settings,
      state: Mutex::const_new(
        R::INIT,
        HeapState {
          directory: BlockDirectory::new(),
          brk,
        },
      ),
    }
  }

  pub fn config(&self) -> AllocatorConfig {
    match self.settings {
      Settings::Fixed(config) => config,
      Settings::Environment => policy_from_env().config(),
    }
  }

  /// Returns a payload of at least `size` bytes, aligned to [`BLOCK_ALIGN`].
  ///
  /// The first free block large enough is reused as is; otherwise the heap
  /// grows by one header plus `size` rounded up to [`BLOCK_ALIGN`].
  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let result = self.state.lock().allocate(size);
    log_allocation("allocate", size, &result);
    result.map(|(payload, _)| payload)
  }

  /// Gives a payload back. Null is a no-op.
  ///
  /// A block that ends exactly at the break is returned to the OS; any other
  /// block is kept for reuse.
  ///
  /// # Safety
  ///
  /// `address` must be null or a live payload returned by this allocator.
  pub unsafe fn release(
    &self,
    address: *mut u8,
  ) {
    let Some(payload) = NonNull::new(address) else {
      return;
    };

    let config = self.config();
    let released = unsafe { self.state.lock().release(payload, config) };
    log_release(payload, released);
  }

  /// Returns `count * element_size` zeroed bytes.
  pub fn zeroed_allocate(
    &self,
    count: usize,
    element_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if count == 0 || element_size == 0 {
      return Err(AllocError::InvalidArgument);
    }

    let total = count
      .checked_mul(element_size)
      .ok_or(AllocError::Overflow { count, element_size })?;

    let result = {
      let mut state = self.state.lock();
      state.allocate(total).inspect(|&(payload, _)| unsafe {
        let capacity = Block::from_payload(payload).as_ref().size();
        ptr::write_bytes(payload.as_ptr(), 0, capacity);
      })
    };

    log_allocation("zeroed_allocate", total, &result);
    result.map(|(payload, _)| payload)
  }

  /// Grows a payload, moving it when its block is too small.
  ///
  /// Null behaves as [`allocate`](Self::allocate). A block that already holds
  /// `new_size` bytes is returned unchanged; blocks never shrink in place. On
  /// failure the original payload is left untouched.
  ///
  /// # Safety
  ///
  /// `address` must be null or a live payload returned by this allocator.
  pub unsafe fn resize(
    &self,
    address: *mut u8,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let Some(payload) = NonNull::new(address) else {
      return self.allocate(new_size);
    };

    if new_size == 0 {
      return self.allocate(new_size);
    }

    let config = self.config();
    let mut state = self.state.lock();
    let old_size = unsafe { Block::from_payload(payload).as_ref().size() };

    if old_size >= new_size {
      drop(state);
      trace!("resize({payload:p}, {new_size}) -> {payload:p} (fits in {old_size})");
      return Ok(payload);
    }

    let moved = match state.allocate(new_size) {
      Ok((moved, _)) => moved,
      Err(err) => {
        drop(state);
        warn!("resize({payload:p}, {new_size}) failed: {err}");
        return Err(err);
      },
    };

    let released = unsafe {
      ptr::copy_nonoverlapping(payload.as_ptr(), moved.as_ptr(), old_size);
      state.release(payload, config)
    };
    drop(state);

    trace!("resize({payload:p}, {new_size}) -> {moved:p} (copied {old_size})");
    log_release(payload, released);
    Ok(moved)
  }

  /// Recorded capacity of a live payload.
  ///
  /// # Safety
  ///
  /// `address` must be a live payload returned by this allocator.
  pub unsafe fn usable_size(
    &self,
    address: NonNull<u8>,
  ) -> usize {
    let _state = self.state.lock();
    unsafe { Block::from_payload(address).as_ref().size() }
  }

  pub fn is_empty(&self) -> bool {
    self.state.lock().directory.is_empty()
  }

  /// Current top of the heap.
  pub fn heap_top(&self) -> Result<NonNull<u8>, BreakError> {
    self.state.lock().brk.current()
  }

  pub fn stats(&self) -> HeapStats {
    self.state.lock().stats()
  }

  /// Visits every block, oldest first, while holding the lock.
  ///
  /// `visit` must not call back into this allocator.
  pub fn for_each_block(
    &self,
    mut visit: impl FnMut(BlockInfo),
  ) {
    let state = self.state.lock();
    state.directory.infos().for_each(&mut visit);
  }
}

fn log_allocation(
  operation: &str,
  size: usize,
  result: &Result<(NonNull<u8>, Placement), AllocError>,
) {
  match result {
    Ok((payload, Placement::Reused)) => {
      trace!("{operation}({size}) -> {payload:p} (reused)");
    },
    Ok((payload, Placement::Extended { span, pad })) => {
      debug!("heap grew by {span} bytes (+{pad} pad)");
      trace!("{operation}({size}) -> {payload:p}");
    },
    Err(AllocError::InvalidArgument) => {
      trace!("{operation}({size}) rejected");
    },
    Err(err) => {
      warn!("{operation}({size}) failed: {err}");
    },
  }
}

fn log_release(
  payload: NonNull<u8>,
  released: Released,
) {
  match released {
    Released::Shrunk { bytes } => debug!("release({payload:p}) shrank the heap by {bytes} bytes"),
    Released::Recycled => trace!("release({payload:p}) -> free list"),
    Released::ShrinkFailed(err) => {
      warn!("release({payload:p}) could not shrink the heap: {err}; block kept for reuse")
    },
  }
}

fn supports(layout: Layout) -> bool {
  layout.align() <= BLOCK_ALIGN
}

unsafe impl<B: ProgramBreak, R: RawMutex> GlobalAlloc for BrkAllocator<B, R> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if !supports(layout) {
      return ptr::null_mut();
    }

    self
      .allocate(layout.size())
      .map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    unsafe { self.release(ptr) }
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if !supports(layout) {
      return ptr::null_mut();
    }

    self
      .zeroed_allocate(1, layout.size())
      .map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if !supports(layout) {
      return ptr::null_mut();
    }

    unsafe { self.resize(ptr, new_size) }.map_or(ptr::null_mut(), NonNull::as_ptr)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::brk::BoundedHeap;

  fn allocator(capacity: usize) -> BoundedAllocator {
    BrkAllocator::new(BoundedHeap::with_capacity(capacity).unwrap())
  }

  fn fill(
    payload: NonNull<u8>,
    len: usize,
    byte: u8,
  ) {
    unsafe { ptr::write_bytes(payload.as_ptr(), byte, len) };
  }

  fn bytes<'a>(
    payload: NonNull<u8>,
    len: usize,
  ) -> &'a [u8] {
    unsafe { std::slice::from_raw_parts(payload.as_ptr(), len) }
  }

  fn top(allocator: &BoundedAllocator) -> usize {
    allocator.heap_top().unwrap().as_ptr() as usize
  }

  #[test]
  fn test_zero_size_is_rejected() {
    let allocator = allocator(1024);
    let before = top(&allocator);

    assert_eq!(allocator.allocate(0), Err(AllocError::InvalidArgument));
    assert!(allocator.is_empty());
    assert_eq!(top(&allocator), before);
  }

  #[test]
  fn test_allocate_grows_heap() {
    let allocator = allocator(1024);
    let before = top(&allocator);

    let payload = allocator.allocate(20).unwrap();

    assert_eq!(payload.as_ptr() as usize, before + HEADER_SIZE);
    assert_eq!(payload.as_ptr() as usize % BLOCK_ALIGN, 0);
    assert_eq!(top(&allocator), before + HEADER_SIZE + 32);
    assert_eq!(unsafe { allocator.usable_size(payload) }, 32);

    fill(payload, 20, 0x5A);
    assert!(bytes(payload, 20).iter().all(|&b| b == 0x5A));
  }

  #[test]
  fn test_reuse_returns_the_freed_payload() {
    let allocator = allocator(1024);

    let a = allocator.allocate(64).unwrap();
    let _guard = allocator.allocate(16).unwrap();

    unsafe { allocator.release(a.as_ptr()) };
    let stats = allocator.stats();
    assert_eq!(stats.free_blocks, 1);

    let b = allocator.allocate(32).unwrap();
    assert_eq!(b, a);
    // No splitting: the reused block keeps its original capacity.
    assert_eq!(unsafe { allocator.usable_size(b) }, 64);
    assert_eq!(allocator.stats().free_blocks, 0);
  }

  #[test]
  fn test_release_sole_block_empties_directory() {
    let allocator = allocator(1024);
    let before = top(&allocator);

    let a = allocator.allocate(100).unwrap();
    assert_eq!(top(&allocator), before + HEADER_SIZE + 112);

    unsafe { allocator.release(a.as_ptr()) };

    assert!(allocator.is_empty());
    assert_eq!(top(&allocator), before);
  }

  #[test]
  fn test_release_tail_promotes_predecessor() {
    let allocator = allocator(1024);

    let a = allocator.allocate(16).unwrap();
    let after_a = top(&allocator);
    let b = allocator.allocate(48).unwrap();

    unsafe { allocator.release(b.as_ptr()) };

    assert_eq!(top(&allocator), after_a);
    assert_eq!(allocator.stats().blocks, 1);

    // `a` is the tail again and can shrink the heap in turn.
    unsafe { allocator.release(a.as_ptr()) };
    assert!(allocator.is_empty());
  }

  #[test]
  fn test_release_interior_keeps_boundary() {
    let allocator = allocator(1024);

    let a = allocator.allocate(32).unwrap();
    let b = allocator.allocate(32).unwrap();
    let boundary = top(&allocator);

    unsafe { allocator.release(a.as_ptr()) };

    assert_eq!(top(&allocator), boundary);
    assert_eq!(
      allocator.stats(),
      HeapStats {
        blocks: 2,
        free_blocks: 1,
        used_bytes: 32,
        free_bytes: 32,
      }
    );

    assert_eq!(allocator.allocate(17).unwrap(), a);
    unsafe { allocator.release(b.as_ptr()) };
  }

  #[test]
  fn test_release_null_is_noop() {
    let allocator = allocator(256);
    let before = top(&allocator);

    unsafe { allocator.release(ptr::null_mut()) };

    assert!(allocator.is_empty());
    assert_eq!(top(&allocator), before);
  }

  #[test]
  fn test_out_of_memory_leaves_state() {
    let allocator = allocator(128);

    let a = allocator.allocate(32).unwrap();
    let boundary = top(&allocator);
    let stats = allocator.stats();

    assert_eq!(allocator.allocate(1024), Err(AllocError::OutOfMemory));
    assert_eq!(allocator.allocate(usize::MAX), Err(AllocError::OutOfMemory));

    assert_eq!(top(&allocator), boundary);
    assert_eq!(allocator.stats(), stats);
    unsafe { allocator.release(a.as_ptr()) };
  }

  #[test]
  fn test_zeroed_allocate_rejects_zero() {
    let allocator = allocator(256);

    for n in [0, 1, 7, usize::MAX] {
      assert_eq!(allocator.zeroed_allocate(0, n), Err(AllocError::InvalidArgument));
      assert_eq!(allocator.zeroed_allocate(n, 0), Err(AllocError::InvalidArgument));
    }
    assert!(allocator.is_empty());
  }

  #[test]
  fn test_zeroed_allocate_detects_overflow() {
    let allocator = allocator(256);

    assert_eq!(
      allocator.zeroed_allocate(2, usize::MAX / 2 + 1),
      Err(AllocError::Overflow {
        count: 2,
        element_size: usize::MAX / 2 + 1,
      })
    );
    assert!(allocator.is_empty());
  }

  #[test]
  fn test_zeroed_allocate_clears_recycled_block() {
    let allocator = allocator(1024);

    let a = allocator.allocate(64).unwrap();
    let _guard = allocator.allocate(16).unwrap();
    fill(a, 64, 0xFF);
    unsafe { allocator.release(a.as_ptr()) };

    let z = allocator.zeroed_allocate(6, 10).unwrap();

    assert_eq!(z, a);
    assert!(bytes(z, 64).iter().all(|&b| b == 0));
  }

  #[test]
  fn test_resize_within_capacity_keeps_pointer() {
    let allocator = allocator(1024);

    let a = allocator.allocate(40).unwrap();
    fill(a, 40, 0x11);

    let same = unsafe { allocator.resize(a.as_ptr(), 48) }.unwrap();
    assert_eq!(same, a);

    let smaller = unsafe { allocator.resize(a.as_ptr(), 8) }.unwrap();
    assert_eq!(smaller, a);
    assert_eq!(unsafe { allocator.usable_size(a) }, 48);
    assert!(bytes(a, 40).iter().all(|&b| b == 0x11));
  }

  #[test]
  fn test_resize_moves_and_copies() {
    let allocator = allocator(1024);

    let a = allocator.allocate(16).unwrap();
    for i in 0..16 {
      unsafe { a.as_ptr().add(i).write(i as u8) };
    }
    let _guard = allocator.allocate(16).unwrap();

    let b = unsafe { allocator.resize(a.as_ptr(), 100) }.unwrap();

    assert_ne!(b, a);
    assert_eq!(bytes(b, 16), (0..16).collect::<Vec<u8>>().as_slice());

    // The old block is now free and reusable.
    assert_eq!(allocator.allocate(16).unwrap(), a);
  }

  #[test]
  fn test_resize_failure_leaves_original() {
    let allocator = allocator(128);

    let a = allocator.allocate(32).unwrap();
    fill(a, 32, 0x77);

    assert_eq!(
      unsafe { allocator.resize(a.as_ptr(), 4096) },
      Err(AllocError::OutOfMemory)
    );
    assert!(bytes(a, 32).iter().all(|&b| b == 0x77));
    assert_eq!(allocator.stats().free_blocks, 0);
  }

  #[test]
  fn test_resize_null_and_zero() {
    let allocator = allocator(256);

    let a = unsafe { allocator.resize(ptr::null_mut(), 24) }.unwrap();
    assert_eq!(unsafe { allocator.usable_size(a) }, 32);

    assert_eq!(
      unsafe { allocator.resize(a.as_ptr(), 0) },
      Err(AllocError::InvalidArgument)
    );
    assert_eq!(
      unsafe { allocator.resize(ptr::null_mut(), 0) },
      Err(AllocError::InvalidArgument)
    );
    assert_eq!(allocator.stats().blocks, 1);
  }

  #[test]
  fn test_coalescing_is_off_by_default() {
    let allocator = allocator(1024);

    let a = allocator.allocate(32).unwrap();
    let b = allocator.allocate(32).unwrap();
    let _c = allocator.allocate(32).unwrap();

    unsafe {
      allocator.release(a.as_ptr());
      allocator.release(b.as_ptr());
    }

    assert_eq!(allocator.stats().free_blocks, 2);
    assert_ne!(allocator.allocate(64).unwrap(), a);
  }

  #[test]
  fn test_coalescing_merges_neighbours() {
    let allocator = BoundedAllocator::with_config(
      BoundedHeap::with_capacity(1024).unwrap(),
      AllocatorConfig::BASELINE.with_coalescing(true),
    );

    let a = allocator.allocate(32).unwrap();
    let b = allocator.allocate(32).unwrap();
    let _c = allocator.allocate(32).unwrap();

    unsafe {
      allocator.release(a.as_ptr());
      allocator.release(b.as_ptr());
    }

    assert_eq!(
      allocator.stats(),
      HeapStats {
        blocks: 2,
        free_blocks: 1,
        used_bytes: 32,
        free_bytes: 32 + HEADER_SIZE + 32,
      }
    );
    assert_eq!(allocator.allocate(64).unwrap(), a);
  }

  #[test]
  fn test_tail_trimming_returns_free_run() {
    let allocator = BoundedAllocator::with_config(
      BoundedHeap::with_capacity(1024).unwrap(),
      AllocatorConfig::BASELINE.with_tail_trimming(true),
    );
    let before = top(&allocator);

    let a = allocator.allocate(32).unwrap();
    let b = allocator.allocate(32).unwrap();
    let c = allocator.allocate(32).unwrap();

    unsafe {
      allocator.release(a.as_ptr());
      allocator.release(b.as_ptr());
      allocator.release(c.as_ptr());
    }

    assert!(allocator.is_empty());
    assert_eq!(top(&allocator), before);
  }

  #[test]
  fn test_baseline_leaves_free_run_behind() {
    let allocator = allocator(1024);

    let a = allocator.allocate(32).unwrap();
    let after_a = top(&allocator);
    let b = allocator.allocate(32).unwrap();

    unsafe {
      allocator.release(a.as_ptr());
      allocator.release(b.as_ptr());
    }

    assert_eq!(allocator.stats().blocks, 1);
    assert_eq!(top(&allocator), after_a);
  }

  #[test]
  fn test_for_each_block_in_creation_order() {
    let allocator = allocator(1024);

    let a = allocator.allocate(16).unwrap();
    let b = allocator.allocate(80).unwrap();
    unsafe { allocator.release(a.as_ptr()) };

    let mut seen = Vec::new();
    allocator.for_each_block(|info| seen.push((info.payload, info.size, info.is_free)));

    assert_eq!(seen, vec![(a, 16, true), (b, 80, false)]);
  }

  #[test]
  fn test_global_alloc_surface() {
    let allocator = allocator(1024);

    unsafe {
      let layout = Layout::new::<u64>();
      let p = allocator.alloc(layout);
      assert!(!p.is_null());
      (p as *mut u64).write(0xDEAD_BEEF);

      let q = allocator.realloc(p, layout, 64);
      assert!(!q.is_null());
      assert_eq!((q as *mut u64).read(), 0xDEAD_BEEF);

      let z = allocator.alloc_zeroed(Layout::array::<u32>(8).unwrap());
      assert!(bytes(NonNull::new(z).unwrap(), 32).iter().all(|&b| b == 0));

      assert!(allocator.alloc(Layout::from_size_align(64, 64).unwrap()).is_null());

      allocator.dealloc(q, Layout::from_size_align(64, 8).unwrap());
      allocator.dealloc(z, Layout::array::<u32>(8).unwrap());
    }
  }
}
