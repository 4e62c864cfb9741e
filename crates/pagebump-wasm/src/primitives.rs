//! Raw memory and math WASM bindings.
//!
//! `copy` and `fill` operate on linear addresses, exactly like the `memcpy`
//! and `memset` a C codec would link against. They do no bounds checking
//! against the arena: JavaScript can already write anywhere in
//! `memory.buffer`, and these give it the same reach from inside the module.

use crate::context::{with_arena, HostArena};
use crate::host::HostPower;
use pagebump_core::{math, WASM_PAGE_SIZE};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
fn copy_in(arena: &mut HostArena, dest: usize, src: usize, len: usize) {
    // SAFETY: every address below memory.size is valid wasm memory; keeping
    // the ranges inside live allocations is the caller's contract.
    unsafe { arena.copy(dest, src, len) }
}

#[cfg(not(target_arch = "wasm32"))]
fn copy_in(arena: &mut HostArena, dest: usize, src: usize, len: usize) {
    arena.memory_mut().copy(dest, src, len)
}

#[cfg(target_arch = "wasm32")]
fn fill_in(arena: &mut HostArena, dest: usize, value: i32, len: usize) {
    // SAFETY: as for copy_in.
    unsafe { arena.fill(dest, value, len) }
}

#[cfg(not(target_arch = "wasm32"))]
fn fill_in(arena: &mut HostArena, dest: usize, value: i32, len: usize) {
    arena.memory_mut().fill(dest, value, len)
}

/// Copy `len` bytes from address `src` to address `dest`, front to back.
///
/// Overlapping ranges are not supported. A zero length does nothing.
#[wasm_bindgen]
pub fn copy(dest: usize, src: usize, len: usize) -> Result<(), JsValue> {
    with_arena(|arena| copy_in(arena, dest, src, len)).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Write the low byte of `value` into `len` bytes starting at `dest`.
///
/// A zero length does nothing.
#[wasm_bindgen]
pub fn fill(dest: usize, value: i32, len: usize) -> Result<(), JsValue> {
    with_arena(|arena| fill_in(arena, dest, value, len)).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Compute `2^n` through the host's `Math.pow`.
#[wasm_bindgen]
pub fn exp_two(n: f64) -> f64 {
    math::exp_two(&HostPower, n)
}

/// Size in bytes of one page of linear memory.
#[wasm_bindgen]
pub fn page_size() -> usize {
    WASM_PAGE_SIZE
}


/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::arena::allocate;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_fill_then_copy() {
        let src = allocate(16).unwrap();
        let dest = allocate(16).unwrap();

        fill(src, 0xAB, 16).unwrap();
        copy(dest, src, 16).unwrap();

        let bytes = unsafe { core::slice::from_raw_parts(dest as *const u8, 16) };
        assert!(bytes.iter().all(|&b| b == 0xAB));
    }

    #[wasm_bindgen_test]
    fn test_exp_two_uses_math_pow() {
        assert_eq!(exp_two(10.0), 1024.0);
    }
}
