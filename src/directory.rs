use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::block::Block;

/// Every block carved from the heap, oldest first.
///
/// ```text
///   head                                              tail
///    │                                                 │
///    ▼                                                 ▼
///   ┌────────┬───────┐   ┌────────┬─────┐   ┌────────┬──────────┐
///   │ hdr    │ A1    │──▶│ hdr    │ A2  │──▶│ hdr    │ A3       │──▶ None
///   │ in use │       │   │ free   │     │   │ in use │          │
///   └────────┴───────┘   └────────┴─────┘   └────────┴──────────┘
///   low address                                       program break ┘
/// ```
///
/// Blocks are only ever created at the high end, so creation order is address
/// order.
pub struct BlockDirectory {
  head: Option<NonNull<Block>>,
  tail: Option<NonNull<Block>>,
}

// SAFETY: the chain is only reachable through this value, which the allocator
// keeps behind its lock.
unsafe impl Send for BlockDirectory {}

/// Snapshot of one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub payload: NonNull<u8>,
  pub size: usize,
  pub is_free: bool,
}

impl BlockDirectory {
  pub const fn new() -> Self {
    Self {
      head: None,
      tail: None,
    }
  }

  pub fn tail(&self) -> Option<NonNull<Block>> {
    self.tail
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_none()
  }

  /// First free block whose capacity is at least `size`.
  pub fn find_reusable(
    &self,
    size: usize,
  ) -> Option<NonNull<Block>> {
    self
      .iter()
      .find(|&block| unsafe { block.as_ref().is_free() && block.as_ref().size() >= size })
  }

  /// Links a freshly carved block as the new tail.
  ///
  /// # Safety
  ///
  /// `block` must be a live header with `next == None`, above every block
  /// already in the directory.
  pub unsafe fn push_tail(
    &mut self,
    block: NonNull<Block>,
  ) {
    unsafe {
      debug_assert!(block.as_ref().next.is_none());

      match self.tail {
        Some(mut tail) => tail.as_mut().next = Some(block),
        None => self.head = Some(block),
      }
      self.tail = Some(block);
    }
  }

  /// The block linking to `block`, found by walking from `head`.
  pub fn predecessor(
    &self,
    block: NonNull<Block>,
  ) -> Option<NonNull<Block>> {
    self
      .iter()
      .find(|&current| unsafe { current.as_ref().next == Some(block) })
  }

  /// Unlinks the tail; its predecessor, if any, becomes the new tail.
  ///
  /// Linear in the number of blocks.
  pub fn pop_tail(&mut self) -> Option<NonNull<Block>> {
    let tail = self.tail?;

    if self.head == Some(tail) {
      self.head = None;
      self.tail = None;
      return Some(tail);
    }

    let mut previous = self.predecessor(tail)?;
    unsafe { previous.as_mut().next = None };
    self.tail = Some(previous);

    Some(tail)
  }

  /// Merges the free `block` with free neighbours that touch it in memory and
  /// returns the header that survives.
  ///
  /// # Safety
  ///
  /// `block` must be a free header in this directory.
  pub unsafe fn coalesce(
    &mut self,
    mut block: NonNull<Block>,
  ) -> NonNull<Block> {
    unsafe {
      debug_assert!(block.as_ref().is_free());

      while let Some(next) = block.as_ref().next {
        if !next.as_ref().is_free() || Block::payload_end(block) != next.as_ptr().cast::<u8>() {
          break;
        }

        let merged = block.as_ref().size() + next.as_ref().span();
        block.as_mut().set_size(merged);
        block.as_mut().next = next.as_ref().next;

        if self.tail == Some(next) {
          self.tail = Some(block);
        }
      }

      if let Some(mut previous) = self.predecessor(block)
        && previous.as_ref().is_free()
        && Block::payload_end(previous) == block.as_ptr().cast::<u8>()
      {
        let merged = previous.as_ref().size() + block.as_ref().span();
        previous.as_mut().set_size(merged);
        previous.as_mut().next = block.as_ref().next;

        if self.tail == Some(block) {
          self.tail = Some(previous);
        }

        return previous;
      }

      block
    }
  }

  pub fn iter(&self) -> Blocks<'_> {
    Blocks {
      current: self.head,
      _directory: PhantomData,
    }
  }

  pub fn infos(&self) -> impl Iterator<Item = BlockInfo> + '_ {
    self.iter().map(|block| unsafe {
      BlockInfo {
        payload: Block::payload(block),
        size: block.as_ref().size(),
        is_free: block.as_ref().is_free(),
      }
    })
  }
}

impl Default for BlockDirectory {
  fn default() -> Self {
    Self::new()
  }
}

/// Walks the chain from `head`.
pub struct Blocks<'a> {
  current: Option<NonNull<Block>>,
  _directory: PhantomData<&'a BlockDirectory>,
}

impl Iterator for Blocks<'_> {
  type Item = NonNull<Block>;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.current?;
    self.current = unsafe { current.as_ref().next };
    Some(current)
  }
}
