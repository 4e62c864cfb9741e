//! Pagebump WASM - WebAssembly bindings for the pagebump arena
//!
//! This crate gives a WebAssembly module a pagebump arena and exposes its
//! operations to JavaScript, for codec layers that drive the module one
//! encode session at a time. Rust's own allocations live in a separate
//! region below the arena, so a session reset cannot free them.
//!
//! # Module Structure
//!
//! - `arena` - allocate / deallocate / reset, growth hook, introspection
//! - `primitives` - raw copy and fill by address, `exp_two`, page size
//! - `host` - wasm32 memory, `Math.pow`, and the JS growth observer
//! - `context` - the module's single arena
//! - `global` - Rust's own heap, in a region `reset` never touches (wasm32 only)
//!
//! No `log` backend is installed. The core arena logs from inside
//! `allocate`, and a console logger would allocate while the arena is
//! borrowed.
//!
//! # Usage
//!
//! ```typescript
//! import init, { allocate, reset, set_on_mem_grow } from '@pagebump/wasm';
//!
//! const wasm = await init();
//! set_on_mem_grow((pages, totalBytes, lastAlloc) => console.log(`+${pages} pages`));
//!
//! const row = allocate(width * 4);
//! new Uint8Array(wasm.memory.buffer, row, width * 4).set(pixels.subarray(0, width * 4));
//! reset();
//! ```

use wasm_bindgen::prelude::*;

mod arena;
mod context;
#[cfg(target_arch = "wasm32")]
mod global;
mod host;
mod primitives;

// Re-export public types
pub use arena::{
    allocate, arena_config, arena_stats, bytes_in_use, clear_on_mem_grow, committed_pages,
    deallocate, heap_base, heap_cursor, reset, set_on_mem_grow,
};
#[cfg(target_arch = "wasm32")]
pub use global::RuntimeAllocator;
pub use primitives::{copy, exp_two, fill, page_size};

/// Initialize the WASM module (called automatically on load)
///
/// Creates the arena up front so the heap base is fixed before any export
/// runs.
#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    context::with_arena(|_| ()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_init_creates_arena() {
        assert!(init().is_ok());
        let pages = context::with_arena(|arena| arena.committed_pages()).unwrap();
        assert!(pages >= 1);
    }
}
