//! Arena WASM bindings.
//!
//! This module exposes the module's arena to JavaScript: the allocation
//! entry points a codec layer calls, the bulk reset it calls between encode
//! sessions, and a few read-only views for diagnostics.
//!
//! # Functions
//!
//! - [`allocate`] / [`deallocate`] / [`reset`] - the arena contract
//! - [`set_on_mem_grow`] / [`clear_on_mem_grow`] - growth notifications
//! - [`heap_base`], [`heap_cursor`], [`bytes_in_use`], [`committed_pages`],
//!   [`arena_stats`], [`arena_config`] - introspection
//!
//! # Example
//!
//! ```typescript
//! import { allocate, reset, set_on_mem_grow } from '@pagebump/wasm';
//!
//! set_on_mem_grow((newPages, totalBytes, lastAllocBytes) => {
//!   memView = new Uint8Array(wasm.memory.buffer); // views detach on growth
//! });
//!
//! const rowPtr = allocate(width * 4);
//! // ... write rows, compress ...
//! reset(); // every pointer handed out above is now invalid
//! ```

use crate::context::with_arena;
use pagebump_core::{ArenaConfig, ArenaError, ArenaStats};
use wasm_bindgen::prelude::*;

fn to_js(err: ArenaError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn try_allocate(size: usize) -> Result<usize, ArenaError> {
    with_arena(|arena| arena.allocate(size))?
}

pub(crate) fn try_reset() -> Result<(), ArenaError> {
    with_arena(|arena| arena.reset())
}

pub(crate) fn try_stats() -> Result<ArenaStats, ArenaError> {
    with_arena(|arena| arena.stats())
}

pub(crate) fn try_config() -> Result<ArenaConfig, ArenaError> {
    with_arena(|arena| *arena.config())
}

/// Reserve `size` bytes in linear memory and return their address.
///
/// The size is rounded up to a multiple of 8; every address is 8-aligned and
/// larger than the one before it until the next [`reset`]. If the reservation
/// runs past committed memory, the memory is grown and the growth hook (see
/// [`set_on_mem_grow`]) runs before this returns.
///
/// # Errors
///
/// Throws if memory cannot be grown any further or `size` overflows the
/// address space. Treat either as fatal for the current session.
#[wasm_bindgen]
pub fn allocate(size: usize) -> Result<usize, JsValue> {
    try_allocate(size).map_err(to_js)
}

/// Release one allocation. Does nothing: memory is only reclaimed by
/// [`reset`].
#[wasm_bindgen]
pub fn deallocate(_address: usize) {}

/// Release every allocation at once.
///
/// The next [`allocate`] returns the heap base again. Committed memory is
/// kept for reuse. Nothing [`allocate`] returned before the reset may be
/// touched after it. Rust's own heap is not part of the arena and is left
/// alone.
#[wasm_bindgen]
pub fn reset() -> Result<(), JsValue> {
    try_reset().map_err(to_js)
}

/// Register a callback run after every memory growth.
///
/// Called as `callback(pagesAdded, totalBytes, requestedSize)`. Existing
/// views over `memory.buffer` are detached by growth, so this is where to
/// recreate them. The callback must not call back into this module.
#[wasm_bindgen]
pub fn set_on_mem_grow(callback: js_sys::Function) -> Result<(), JsValue> {
    with_arena(|arena| arena.observer_mut().set_callback(Some(callback))).map_err(to_js)
}

/// Remove the growth callback.
#[wasm_bindgen]
pub fn clear_on_mem_grow() -> Result<(), JsValue> {
    with_arena(|arena| arena.observer_mut().set_callback(None)).map_err(to_js)
}

/// First address the arena hands out.
#[wasm_bindgen]
pub fn heap_base() -> Result<usize, JsValue> {
    with_arena(|arena| arena.heap_base()).map_err(to_js)
}

/// Current cursor: the address the next allocation would get.
#[wasm_bindgen]
pub fn heap_cursor() -> Result<usize, JsValue> {
    with_arena(|arena| arena.cursor()).map_err(to_js)
}

/// Bytes reserved since the last reset.
#[wasm_bindgen]
pub fn bytes_in_use() -> Result<usize, JsValue> {
    with_arena(|arena| arena.bytes_in_use()).map_err(to_js)
}

/// Pages of linear memory currently committed.
#[wasm_bindgen]
pub fn committed_pages() -> Result<usize, JsValue> {
    with_arena(|arena| arena.committed_pages()).map_err(to_js)
}

/// Usage counters as a plain object.
///
/// Fields: `allocations`, `bytesRequested`, `bytesReserved` (this session),
/// `peakCursor`, `growthEvents`, `pagesGrown`, `resets` (lifetime).
#[wasm_bindgen]
pub fn arena_stats() -> Result<JsValue, JsValue> {
    let stats = try_stats().map_err(to_js)?;
    serde_wasm_bindgen::to_value(&stats)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize stats: {}", e)))
}

/// The arena configuration as `{ heapBase, alignment }`.
#[wasm_bindgen]
pub fn arena_config() -> Result<JsValue, JsValue> {
    let config = try_config().map_err(to_js)?;
    serde_wasm_bindgen::to_value(&config)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize config: {}", e)))
}

/// Tests for arena bindings.
///
/// Functions returning `Result<T, JsValue>` only work on wasm32 targets, so
/// these go through the `try_*` helpers and the arena directly.
#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use pagebump_core::WASM_PAGE_SIZE;

    fn fresh() -> usize {
        try_reset().unwrap();
        with_arena(|arena| arena.heap_base()).unwrap()
    }

    #[test]
    fn test_allocate_returns_heap_base_after_reset() {
        let base = fresh();
        assert_eq!(try_allocate(10).unwrap(), base);
        assert_eq!(try_allocate(8).unwrap(), base + 16);

        try_reset().unwrap();
        assert_eq!(try_allocate(8).unwrap(), base);
    }

    #[test]
    fn test_allocate_grows_memory() {
        let base = fresh();
        let before = with_arena(|arena| arena.committed_pages()).unwrap();

        try_allocate(2 * WASM_PAGE_SIZE).unwrap();

        let after = with_arena(|arena| arena.committed_pages()).unwrap();
        assert!(after > before);
        assert!(after * WASM_PAGE_SIZE >= base + 2 * WASM_PAGE_SIZE);
    }

    #[test]
    fn test_allocate_overflow_is_error() {
        fresh();
        let result = try_allocate(usize::MAX);
        assert!(matches!(result, Err(ArenaError::UnboundedRequest { .. })));
    }

    #[test]
    fn test_deallocate_does_not_move_cursor() {
        let base = fresh();
        let a = try_allocate(64).unwrap();
        deallocate(a);
        assert_eq!(try_allocate(8).unwrap(), base + 64);
    }

    #[test]
    fn test_stats_follow_session() {
        fresh();
        let resets = try_stats().unwrap().resets;
        try_allocate(3).unwrap();
        try_allocate(5).unwrap();

        let stats = try_stats().unwrap();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.bytes_requested, 8);
        assert_eq!(stats.bytes_reserved, 16);

        try_reset().unwrap();
        let stats = try_stats().unwrap();
        assert_eq!(stats.allocations, 0);
        assert_eq!(stats.resets, resets + 1);
    }

    #[test]
    fn test_config_reports_heap_base() {
        let base = fresh();
        let config = try_config().unwrap();
        assert_eq!(config.heap_base, base);
        assert_eq!(config.alignment, 8);
    }
}
