//! Rust's own heap, kept out of the arena.
//!
//! The arena is rewound wholesale whenever JavaScript calls `reset`, so it
//! cannot also back allocations the module makes for itself (wasm-bindgen's
//! externref table, strings returned to JavaScript, lazily built statics).
//! Those come from a first-fit free list over a fixed region that sits
//! between the linker's heap base and the arena's heap base. `reset` never
//! touches it, and the arena never hands out an address inside it.
//!
//! The region is committed on the first allocation. Running out of it is
//! fatal: `alloc` returns null and Rust aborts through `handle_alloc_error`.

use crate::host::{self, HostMemory};
use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicBool, Ordering};
use linked_list_allocator::LockedHeap;
use pagebump_core::growth;
use wasm_bindgen::JsValue;

/// Why a runtime allocation came back null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllocFailure {
    /// Linear memory could not be grown to cover the runtime region.
    Uncommitted,
    /// The runtime region has no hole large enough.
    Exhausted,
}

impl AllocFailure {
    /// Fixed text, so reporting the failure does not allocate.
    fn message(self) -> &'static str {
        match self {
            AllocFailure::Uncommitted => "pagebump: could not commit the runtime heap region",
            AllocFailure::Exhausted => "pagebump: runtime heap exhausted",
        }
    }
}

/// [`GlobalAlloc`] over the runtime region.
pub struct RuntimeAllocator {
    heap: LockedHeap,
    ready: AtomicBool,
}

impl RuntimeAllocator {
    pub const fn new() -> Self {
        Self {
            heap: LockedHeap::empty(),
            ready: AtomicBool::new(false),
        }
    }

    /// Commit the runtime region and hand it to the free list.
    fn claim_region(&self) -> Result<(), AllocFailure> {
        let (start, size) = host::runtime_heap();
        let end = start.checked_add(size).ok_or(AllocFailure::Uncommitted)?;
        growth::ensure_committed(&mut HostMemory::default(), end, size)
            .map_err(|_| AllocFailure::Uncommitted)?;

        // SAFETY: [start, end) is committed, lies below the arena's heap base,
        // and is given to this heap exactly once.
        unsafe { self.heap.lock().init(start as *mut u8, size) };
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn try_alloc(&self, layout: Layout) -> Result<*mut u8, AllocFailure> {
        if !self.ready.load(Ordering::Acquire) {
            self.claim_region()?;
        }
        self.heap
            .lock()
            .allocate_first_fit(layout)
            .map(NonNull::as_ptr)
            .map_err(|_| AllocFailure::Exhausted)
    }
}

impl Default for RuntimeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for RuntimeAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        match self.try_alloc(layout) {
            Ok(ptr) => ptr,
            Err(failure) => {
                // The heap lock is released by now
                web_sys::console::error_1(&JsValue::from_str(failure.message()));
                ptr::null_mut()
            }
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if let Some(ptr) = NonNull::new(ptr) {
            self.heap.lock().deallocate(ptr, layout);
        }
    }
}

#[global_allocator]
static ALLOCATOR: RuntimeAllocator = RuntimeAllocator::new();
