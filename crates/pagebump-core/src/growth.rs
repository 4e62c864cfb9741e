//! Memory growth manager.
//!
//! Before every cursor advance the arena asks this module whether the new
//! high-water mark still fits in committed memory. If it does not, the
//! missing pages are requested from the host in a single grow call and the
//! resulting [`GrowthEvent`] is handed back. The arena commits its cursor
//! first and only then passes the event to its [`GrowthObserver`], so the
//! observer always sees a consistent arena.
//!
//! Growth is the only path that changes committed memory, and it only ever
//! adds pages.

use crate::arena::ArenaError;
use crate::memory::{LinearMemory, WASM_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// A successful growth of linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthEvent {
    /// Pages added by this growth.
    pub pages_added: usize,
    /// Committed pages after the growth.
    pub total_pages: usize,
    /// The caller's original (unaligned) request that triggered the growth.
    pub requested_size: usize,
}

impl GrowthEvent {
    /// Committed bytes after the growth.
    pub fn total_bytes(&self) -> usize {
        self.total_pages.saturating_mul(WASM_PAGE_SIZE)
    }
}

/// Receives growth notifications from the arena.
///
/// The callback runs synchronously inside `allocate`. It must not call back
/// into the arena that is notifying it.
pub trait GrowthObserver {
    fn on_grow(&mut self, event: &GrowthEvent);
}

impl<F> GrowthObserver for F
where
    F: FnMut(&GrowthEvent),
{
    fn on_grow(&mut self, event: &GrowthEvent) {
        self(event)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GrowthObserver for NoopObserver {
    fn on_grow(&mut self, _event: &GrowthEvent) {}
}

/// Observer that keeps every event it sees, in order.
#[derive(Debug, Clone, Default)]
pub struct GrowthRecorder {
    events: Vec<GrowthEvent>,
}

impl GrowthRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first.
    pub fn events(&self) -> &[GrowthEvent] {
        &self.events
    }

    /// Total pages added across all recorded events.
    pub fn pages_added(&self) -> usize {
        self.events.iter().map(|e| e.pages_added).sum()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl GrowthObserver for GrowthRecorder {
    fn on_grow(&mut self, event: &GrowthEvent) {
        self.events.push(*event);
    }
}

/// Number of pages needed to cover every address below `high_water`.
#[inline]
pub fn pages_for(high_water: usize) -> usize {
    high_water.div_ceil(WASM_PAGE_SIZE)
}

/// Make sure memory is committed up to `high_water`, growing if needed.
///
/// `requested_size` is only recorded in the event.
///
/// Returns the growth event if the host had to grow, `None` if memory was
/// already large enough. Nobody has been notified yet: delivering the event
/// is up to the caller.
///
/// # Errors
///
/// Returns [`ArenaError::GrowthExhausted`] if the host refuses to grow. This
/// is fatal for the arena: nothing is retried.
pub fn ensure_committed<M>(
    memory: &mut M,
    high_water: usize,
    requested_size: usize,
) -> Result<Option<GrowthEvent>, ArenaError>
where
    M: LinearMemory + ?Sized,
{
    let needed_pages = pages_for(high_water);
    let current_pages = memory.page_count();
    if needed_pages <= current_pages {
        return Ok(None);
    }

    let delta = needed_pages - current_pages;
    let total_pages = memory.grow(delta).map_err(|source| {
        log::error!(
            "linear memory exhausted: need {} more pages on top of {} for a {} byte request",
            delta,
            current_pages,
            requested_size
        );
        ArenaError::GrowthExhausted {
            requested_pages: delta,
            current_pages,
            source,
        }
    })?;

    let event = GrowthEvent {
        pages_added: delta,
        total_pages,
        requested_size,
    };
    log::debug!(
        "grew linear memory by {} pages to {} ({} bytes) for a {} byte request",
        event.pages_added,
        event.total_pages,
        event.total_bytes(),
        event.requested_size
    );

    Ok(Some(event))
}
