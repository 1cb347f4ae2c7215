use std::io::Read;
use std::ptr::{self, NonNull};

use brkalloc::{BrkAllocator, Sbrk};
use libc::sbrk;

// Everything this process allocates, including the demo's own formatting,
// goes through the same directory and the same break.
#[global_allocator]
static GLOBAL: BrkAllocator<Sbrk> = BrkAllocator::new(Sbrk);

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `gdb`, or just visually track how allocations move the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn print_alloc(
  size: usize,
  payload: NonNull<u8>,
) {
  println!(
    "Allocated {} bytes (usable {}), address = {:?}, program break = {:?}",
    size,
    unsafe { GLOBAL.usable_size(payload) },
    payload,
    unsafe { sbrk(0) }
  );
}

fn print_directory() {
  let stats = GLOBAL.stats();
  println!(
    "    directory: {} blocks, {} free, {} bytes in use, {} bytes free",
    stats.blocks, stats.free_blocks, stats.used_bytes, stats.free_bytes
  );
}

fn main() {
  print_program_break("start");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Allocate 64 bytes and write into them.
  // --------------------------------------------------------------------
  let first = GLOBAL.allocate(64).expect("allocate(64)");
  println!("\n[1] allocate(64)");
  print_alloc(64, first);
  unsafe { ptr::write_bytes(first.as_ptr(), 0xAB, 64) };
  print_directory();
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Allocate a second block so the first one is no longer at the top.
  // --------------------------------------------------------------------
  let second = GLOBAL.allocate(12).expect("allocate(12)");
  println!("\n[2] allocate(12), rounded up to a 16-byte boundary");
  print_alloc(12, second);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Release the first block. It is interior, so it only becomes free.
  // --------------------------------------------------------------------
  print_program_break("before release");
  unsafe { GLOBAL.release(first.as_ptr()) };
  println!("\n[3] release(first) at {:?}", first);
  print_program_break("after release");
  print_directory();
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) A smaller request reuses the freed block (first fit, no splitting).
  // --------------------------------------------------------------------
  let reused = GLOBAL.allocate(32).expect("allocate(32)");
  println!("\n[4] allocate(32) (check reuse of freed block)");
  print_alloc(32, reused);
  println!(
    "[4] reused == first? {}",
    if reused == first {
      "Yes, it reused the freed block"
    } else {
      "No, something else was free first"
    }
  );
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Zeroed allocation and resize.
  // --------------------------------------------------------------------
  let zeroed = GLOBAL.zeroed_allocate(16, 4).expect("zeroed_allocate(16, 4)");
  println!("\n[5] zeroed_allocate(16, 4)");
  print_alloc(64, zeroed);

  let grown = unsafe { GLOBAL.resize(zeroed.as_ptr(), 256) }.expect("resize(256)");
  println!("[5] resize(zeroed, 256) -> {:?} (moved: {})", grown, grown != zeroed);
  print_directory();
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) Allocate a large block, then release it while it is on top.
  // --------------------------------------------------------------------
  print_program_break("before large alloc");
  let big = GLOBAL.allocate(64 * 1024).expect("allocate(64 KiB)");
  println!("\n[6] allocate large 64 KiB block");
  print_alloc(64 * 1024, big);
  print_program_break("after large alloc");

  unsafe { GLOBAL.release(big.as_ptr()) };
  print_program_break("after releasing the large block");
  block_until_enter_pressed();

  println!("\n[7] End of walkthrough. The OS reclaims the rest at exit.");
}
