//! The module's arena.
//!
//! A wasm module has one linear memory, so it gets one arena. The arena is
//! created lazily on first use with its cursor at the linker's heap base.
//!
//! wasm32 without threads runs a single thread, so the arena lives in a plain
//! static cell guarded by a busy flag. Native builds keep one arena per
//! thread in a `RefCell`, which gives every unit test its own simulated
//! memory. Either way, entering the arena while it is already borrowed (from
//! a growth hook that calls back into the module, say) fails with
//! [`ArenaError::Reentered`] instead of aliasing the borrow.

use crate::host::{self, HostMemory, HostObserver};
use pagebump_core::{ArenaConfig, ArenaError, BumpArena};

pub(crate) type HostArena = BumpArena<HostMemory, HostObserver>;

fn new_arena() -> Result<HostArena, ArenaError> {
    BumpArena::new(
        ArenaConfig::new(host::heap_base()),
        HostMemory::default(),
        HostObserver::default(),
    )
}

#[cfg(target_arch = "wasm32")]
mod slot {
    use super::{new_arena, HostArena};
    use core::cell::{Cell, UnsafeCell};
    use pagebump_core::ArenaError;

    struct Slot {
        arena: UnsafeCell<Option<HostArena>>,
        busy: Cell<bool>,
    }

    // SAFETY: wasm32 without the atomics feature has exactly one thread.
    unsafe impl Sync for Slot {}

    static SLOT: Slot = Slot {
        arena: UnsafeCell::new(None),
        busy: Cell::new(false),
    };

    /// Clears the busy flag when the borrow ends.
    struct Busy<'a>(&'a Cell<bool>);

    impl Drop for Busy<'_> {
        fn drop(&mut self) {
            self.0.set(false);
        }
    }

    pub(crate) fn with_arena<R>(f: impl FnOnce(&mut HostArena) -> R) -> Result<R, ArenaError> {
        if SLOT.busy.replace(true) {
            return Err(ArenaError::Reentered);
        }
        let _busy = Busy(&SLOT.busy);

        // SAFETY: single thread, and the busy flag guarantees this is the
        // only live borrow of the slot.
        let slot = unsafe { &mut *SLOT.arena.get() };
        let arena = match &mut *slot {
            Some(arena) => arena,
            None => slot.insert(new_arena()?),
        };
        Ok(f(arena))
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod slot {
    use super::{new_arena, HostArena};
    use pagebump_core::ArenaError;
    use std::cell::RefCell;

    thread_local! {
        static SLOT: RefCell<Option<HostArena>> = const { RefCell::new(None) };
    }

    pub(crate) fn with_arena<R>(f: impl FnOnce(&mut HostArena) -> R) -> Result<R, ArenaError> {
        SLOT.with(|slot| {
            let mut slot = slot.try_borrow_mut().map_err(|_| ArenaError::Reentered)?;
            let arena = match &mut *slot {
                Some(arena) => arena,
                None => slot.insert(new_arena()?),
            };
            Ok(f(arena))
        })
    }
}

/// Run `f` against the module's arena, creating it on first use.
///
/// Fails if the arena could not be created, or with
/// [`ArenaError::Reentered`] if it is already borrowed further up the stack.
pub(crate) use slot::with_arena;

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_arena_created_at_heap_base() {
        let (base, cursor) = with_arena(|arena| {
            arena.reset();
            (arena.heap_base(), arena.cursor())
        })
        .unwrap();
        assert_eq!(base, host::heap_base());
        assert_eq!(cursor, base);
    }

    #[test]
    fn test_arena_state_persists_between_calls() {
        let first = with_arena(|arena| {
            arena.reset();
            arena.allocate(24).unwrap()
        })
        .unwrap();
        let second = with_arena(|arena| arena.allocate(8).unwrap()).unwrap();
        assert_eq!(second, first + 24);
    }

    #[test]
    fn test_nested_entry_is_refused() {
        let (cursor, nested) = with_arena(|arena| {
            arena.reset();
            arena.allocate(16).unwrap();
            let nested = with_arena(|inner| inner.allocate(16));
            (arena.cursor(), nested)
        })
        .unwrap();

        assert_eq!(nested, Err(ArenaError::Reentered));
        assert_eq!(cursor, host::heap_base() + 16);

        // The outer borrow is released once it returns
        let after = with_arena(|arena| arena.allocate(8).unwrap()).unwrap();
        assert_eq!(after, cursor);
    }
}
