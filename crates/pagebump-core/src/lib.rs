//! Pagebump Core - bump arena for linear-memory hosts
//!
//! This crate provides a minimal region allocator for sandboxed environments
//! with a single growable address space and no virtual memory, such as a
//! WebAssembly module's memory. It includes:
//!
//! - `mem` - raw byte copy and fill
//! - `memory` - the host seam (`LinearMemory`) and an in-process `SimulatedMemory`
//! - `growth` - committing pages as the cursor advances, with growth notifications
//! - `arena` - the bump arena itself
//! - `math` - `exp_two` over a host power primitive

pub mod arena;
pub mod growth;
pub mod math;
pub mod mem;
pub mod memory;

pub use arena::{ArenaConfig, ArenaError, ArenaStats, BumpArena};
pub use growth::{GrowthEvent, GrowthObserver, GrowthRecorder, NoopObserver};
pub use math::{exp_two, Power, StdPower};
pub use memory::{AddressSpace, GrowError, LinearMemory, SimulatedMemory, WASM_PAGE_SIZE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_session_cycle() {
        // Two independent sessions sharing one arena, like back-to-back encodes
        let mut arena = BumpArena::new(
            ArenaConfig::new(1024),
            SimulatedMemory::new(1),
            GrowthRecorder::new(),
        )
        .unwrap();

        for (width, channels) in [(640usize, 4usize), (4000, 3)] {
            let row = arena.allocate_zeroed(width * channels).unwrap();
            assert_eq!(row, 1024);
            let scratch = arena.allocate(width * channels * 8).unwrap();
            assert!(scratch > row);
            arena.reset();
        }

        // 4000 * 3 * 9 = 108000 bytes in the second session needs two pages
        assert_eq!(arena.committed_pages(), 2);
        assert_eq!(arena.observer().events().len(), 1);
        assert_eq!(arena.stats().resets, 2);
    }

    #[test]
    fn test_page_size_is_wasm_page() {
        assert_eq!(WASM_PAGE_SIZE, 64 * 1024);
    }
}
