use heapsim::{Allocator, Ptr};

/// Prints the current program break using `sbrk(0)`.
/// The simulator works inside its own arena, so the break should not move.
#[cfg(unix)]
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { libc::sbrk(0) },
  );
}

#[cfg(not(unix))]
fn print_program_break(_label: &str) {}

fn report(
  step: usize,
  passed: bool,
  message: String,
) {
  let verdict = if passed { "Success" } else { "Fail" };
  println!("[{}] {}: {}", step, verdict, message);
}

fn show(ptr: Option<Ptr>) -> String {
  ptr.map_or_else(|| "none".to_string(), |p| p.to_string())
}

fn main() {
  print_program_break("start");

  let mut heap: Allocator = Allocator::new();
  println!("Allocator initialized.\n{}\n", heap);

  // --------------------------------------------------------------------
  // 1) and 2) Two ordinary allocations.
  // --------------------------------------------------------------------
  let p1 = heap.allocate(100);
  report(1, p1.is_some(), format!("allocate(100) -> {}", show(p1)));

  let p2 = heap.allocate(200);
  report(2, p2.is_some(), format!("allocate(200) -> {}", show(p2)));

  // --------------------------------------------------------------------
  // 3) Release the first block. Its address goes into the registry.
  // --------------------------------------------------------------------
  heap.release(p1);
  report(3, p1.is_some_and(|p| heap.is_released(p)), format!("release({})", show(p1)));

  // --------------------------------------------------------------------
  // 4) Grow p2. The freed 100-byte block is too small, so the data moves.
  // --------------------------------------------------------------------
  let p2 = heap.resize(p2, 300);
  report(4, p2.is_some(), format!("resize(p2, 300) -> {}", show(p2)));

  // --------------------------------------------------------------------
  // 5) Shrink p2. The block keeps its capacity and its address.
  // --------------------------------------------------------------------
  let shrunk = heap.resize(p2, 100);
  report(5, shrunk.is_some() && shrunk == p2, format!("resize(p2, 100) -> {}", show(shrunk)));

  // --------------------------------------------------------------------
  // 6) More than the whole arena.
  // --------------------------------------------------------------------
  let p3 = heap.allocate(2000);
  report(6, p3.is_none(), format!("allocate(2000) -> {}", show(p3)));

  // --------------------------------------------------------------------
  // 7) Release p1 a second time; nothing breaks.
  // --------------------------------------------------------------------
  heap.release(p1);
  report(7, true, format!("release({}) again", show(p1)));

  // --------------------------------------------------------------------
  // 8) Resizing a released pointer is refused.
  // --------------------------------------------------------------------
  let p4 = p1.map(|p| heap.try_resize(p, 50));
  match p4 {
    Some(Err(err)) => report(8, true, format!("resize(p1, 50) refused: {}", err)),
    other => report(8, false, format!("resize(p1, 50) -> {:?}", other)),
  }

  // --------------------------------------------------------------------
  // 9) Releasing nothing is a no-op.
  // --------------------------------------------------------------------
  heap.release(None);
  report(9, true, "release(none)".to_string());

  println!("\nFinal chain:\n{}\n", heap);
  print_program_break("end");
  println!("All steps completed.");
}
