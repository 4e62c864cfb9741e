//! Bump arena over page-growing linear memory.
//!
//! This module provides:
//! - [`BumpArena`], the cursor-advancing region allocator
//! - [`ArenaConfig`] and [`ArenaStats`] for setup and introspection
//! - [`ArenaError`] for the two failure kinds: exhausted growth and
//!   requests too large for the address space
//!
//! # Lifecycle
//!
//! An arena starts with its cursor at the heap base. `allocate` advances the
//! cursor (growing host memory as needed) and `reset` rewinds it, releasing
//! everything at once. There is no per-allocation free.
//!
//! # Examples
//!
//! ```ignore
//! use pagebump_core::arena::{ArenaConfig, BumpArena};
//! use pagebump_core::memory::SimulatedMemory;
//!
//! let mut arena = BumpArena::unobserved(ArenaConfig::new(1024), SimulatedMemory::new(1))?;
//! let row = arena.allocate(640 * 4)?;
//! // ... encode one image ...
//! arena.reset();
//! ```

mod bump;
mod types;

pub use bump::BumpArena;
pub use types::{aligned_size, ArenaConfig, ArenaError, ArenaStats, DEFAULT_ALIGNMENT};
