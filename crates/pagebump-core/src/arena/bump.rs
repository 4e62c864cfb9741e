//! The bump arena.

use super::types::{aligned_size, ArenaConfig, ArenaError, ArenaStats};
use crate::growth::{self, GrowthEvent, GrowthObserver, NoopObserver};
use crate::mem;
use crate::memory::{AddressSpace, LinearMemory};

/// A region allocator over page-growing linear memory.
///
/// Allocation advances a single cursor. Individual allocations are never
/// freed: [`deallocate`](Self::deallocate) does nothing, and the only way to
/// reclaim memory is [`reset`](Self::reset), which releases every allocation
/// at once. This is not a general-purpose heap.
///
/// Whenever the cursor moves past committed memory, the arena grows the host
/// memory by exactly the missing pages and notifies its observer before
/// `allocate` returns. The cursor and stats already include the allocation
/// when the observer runs. Committed memory never shrinks, not even on reset.
///
/// The arena is single-threaded and non-reentrant: the observer must not
/// call back into the arena that is notifying it.
#[derive(Debug)]
pub struct BumpArena<M, O = NoopObserver> {
    config: ArenaConfig,
    cursor: usize,
    memory: M,
    observer: O,
    stats: ArenaStats,
}

impl<M: LinearMemory> BumpArena<M, NoopObserver> {
    /// Create an arena with no growth observer.
    pub fn unobserved(config: ArenaConfig, memory: M) -> Result<Self, ArenaError> {
        Self::new(config, memory, NoopObserver)
    }
}

impl<M: LinearMemory, O: GrowthObserver> BumpArena<M, O> {
    /// Create an arena whose cursor starts at `config.heap_base`.
    ///
    /// If the host has not yet committed memory up to the heap base, it is
    /// grown here, and the observer sees that growth with a requested size
    /// of zero.
    ///
    /// # Errors
    ///
    /// * [`ArenaError::InvalidConfig`] if the config does not validate.
    /// * [`ArenaError::GrowthExhausted`] if the heap base cannot be committed.
    pub fn new(config: ArenaConfig, mut memory: M, observer: O) -> Result<Self, ArenaError> {
        config.validate()?;
        let event = growth::ensure_committed(&mut memory, config.heap_base, 0)?;

        let mut arena = Self {
            config,
            cursor: config.heap_base,
            memory,
            observer,
            stats: ArenaStats {
                peak_cursor: config.heap_base,
                ..ArenaStats::default()
            },
        };
        if let Some(event) = event {
            arena.record_growth(&event);
        }
        Ok(arena)
    }

    /// Reserve `size` bytes and return the address of the reservation.
    ///
    /// The size is rounded up to the alignment; a zero-byte request still
    /// reserves one alignment unit. Addresses returned between two resets are
    /// strictly increasing.
    ///
    /// # Errors
    ///
    /// * [`ArenaError::UnboundedRequest`] if aligning `size` or advancing the
    ///   cursor overflows. The arena is unchanged.
    /// * [`ArenaError::GrowthExhausted`] if the host cannot commit enough
    ///   pages. The cursor is left where it was; callers should treat this
    ///   as fatal.
    pub fn allocate(&mut self, size: usize) -> Result<usize, ArenaError> {
        let unbounded = ArenaError::UnboundedRequest { size };
        let reserved = aligned_size(size, self.config.alignment).ok_or_else(|| unbounded.clone())?;
        let address = self.cursor;
        let next = address.checked_add(reserved).ok_or(unbounded)?;

        let event = growth::ensure_committed(&mut self.memory, next, size)?;

        self.cursor = next;
        self.stats.allocations += 1;
        self.stats.bytes_requested = self.stats.bytes_requested.saturating_add(size);
        self.stats.bytes_reserved += reserved;
        self.stats.peak_cursor = self.stats.peak_cursor.max(next);
        log::trace!("allocated {} bytes ({} reserved) at {}", size, reserved, address);

        if let Some(event) = event {
            self.record_growth(&event);
        }
        Ok(address)
    }

    /// Count a growth and hand it to the observer. Runs last, once the arena
    /// is consistent again.
    fn record_growth(&mut self, event: &GrowthEvent) {
        self.stats.growth_events += 1;
        self.stats.pages_grown += event.pages_added;
        self.observer.on_grow(event);
    }

    /// Release a single allocation. Does nothing.
    ///
    /// Memory is only reclaimed by [`reset`](Self::reset). The address is
    /// not checked and need not have come from this arena.
    #[inline]
    pub fn deallocate(&mut self, _address: usize) {}

    /// Rewind the cursor to the heap base, releasing every allocation.
    ///
    /// Every address handed out before the reset becomes invalid. Committed
    /// pages are kept.
    pub fn reset(&mut self) {
        log::debug!(
            "arena reset: releasing {} bytes over {} allocations",
            self.bytes_in_use(),
            self.stats.allocations
        );
        self.cursor = self.config.heap_base;
        self.stats.clear_session();
        self.stats.resets += 1;
    }

    /// First address this arena hands out.
    pub fn heap_base(&self) -> usize {
        self.config.heap_base
    }

    /// Current cursor (high-water mark since the last reset).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes between the heap base and the cursor.
    pub fn bytes_in_use(&self) -> usize {
        self.cursor - self.config.heap_base
    }

    /// Pages the host currently has committed.
    pub fn committed_pages(&self) -> usize {
        self.memory.page_count()
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Mutable access to the host memory.
    ///
    /// Growing the memory directly is allowed; shrinking it under the
    /// arena's feet is not something any host supports.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Swap the growth observer, returning the old one.
    pub fn replace_observer(&mut self, observer: O) -> O {
        std::mem::replace(&mut self.observer, observer)
    }

    /// Tear the arena apart, handing back the host memory and observer.
    pub fn into_parts(self) -> (M, O) {
        (self.memory, self.observer)
    }
}

impl<M: AddressSpace, O: GrowthObserver> BumpArena<M, O> {
    /// Allocate `size` bytes and zero them.
    pub fn allocate_zeroed(&mut self, size: usize) -> Result<usize, ArenaError> {
        let address = self.allocate(size)?;
        // SAFETY: allocate just committed memory up to at least address + size.
        unsafe { mem::fill(self.memory.pointer(address), 0, size) };
        Ok(address)
    }

    /// Copy `len` bytes from `src` to `dest`, by linear address.
    ///
    /// # Safety
    ///
    /// Both ranges must lie in committed memory, and should lie inside live
    /// allocations. See [`mem::copy`].
    pub unsafe fn copy(&mut self, dest: usize, src: usize, len: usize) {
        let src = self.memory.pointer(src).cast_const();
        mem::copy(self.memory.pointer(dest), src, len);
    }

    /// Fill `len` bytes at `dest` with the low byte of `value`, by linear
    /// address.
    ///
    /// # Safety
    ///
    /// The range must lie in committed memory. See [`mem::fill`].
    pub unsafe fn fill(&mut self, dest: usize, value: i32, len: usize) {
        mem::fill(self.memory.pointer(dest), value, len);
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
