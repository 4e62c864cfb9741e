//! Host capabilities backing the arena.
//!
//! On wasm32 the arena runs over the module's own memory 0, above a fixed
//! region reserved for Rust's own heap, and asks the JavaScript side for
//! `Math.pow`. On every other target (native unit tests,
//! tooling) the same bindings run over a `SimulatedMemory` and `f64::powf`.

use pagebump_core::{GrowthEvent, GrowthObserver};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub(crate) use wasm::{heap_base, runtime_heap, JsMathPower as HostPower, WasmMemory as HostMemory};

#[cfg(not(target_arch = "wasm32"))]
pub(crate) use native::{heap_base, HostMemory, HostPower};

/// Growth observer that forwards to an optional JavaScript callback.
///
/// The callback receives `(pagesAdded, totalBytes, requestedSize)`. It runs
/// synchronously inside the allocation that triggered the growth, so it must
/// not call back into this module.
#[derive(Debug, Default)]
pub(crate) struct HostObserver {
    callback: Option<js_sys::Function>,
}

impl HostObserver {
    pub(crate) fn set_callback(&mut self, callback: Option<js_sys::Function>) {
        self.callback = callback;
    }
}

impl GrowthObserver for HostObserver {
    fn on_grow(&mut self, event: &GrowthEvent) {
        let Some(callback) = &self.callback else {
            return;
        };

        // Only numbers cross the boundary here: no Rust allocation may happen
        // while the arena is mid-allocation.
        let result = callback.call3(
            &JsValue::NULL,
            &JsValue::from_f64(event.pages_added as f64),
            &JsValue::from_f64(event.total_bytes() as f64),
            &JsValue::from_f64(event.requested_size as f64),
        );

        if let Err(_err) = result {
            #[cfg(target_arch = "wasm32")]
            web_sys::console::error_2(&JsValue::from_str("pagebump: memory growth hook threw"), &_err);
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm {
    use pagebump_core::arena::DEFAULT_ALIGNMENT;
    use pagebump_core::memory::{AddressSpace, GrowError, LinearMemory};
    use pagebump_core::{Power, WASM_PAGE_SIZE};

    /// Bytes set aside for Rust's own heap, below the arena.
    const RUNTIME_HEAP_SIZE: usize = 64 * WASM_PAGE_SIZE;

    extern "C" {
        /// First address past the module's static data and stack, set by the linker.
        static __heap_base: u8;
    }

    /// The linker's heap base, rounded up to the arena alignment.
    fn linker_heap_base() -> usize {
        // SAFETY: only the address of the linker symbol is taken.
        let base = unsafe { core::ptr::addr_of!(__heap_base) } as usize;
        (base + DEFAULT_ALIGNMENT - 1) & !(DEFAULT_ALIGNMENT - 1)
    }

    /// Start and size of the region backing Rust's global allocator.
    pub(crate) fn runtime_heap() -> (usize, usize) {
        (linker_heap_base(), RUNTIME_HEAP_SIZE)
    }

    /// First address the arena hands out: just past the runtime heap.
    pub(crate) fn heap_base() -> usize {
        linker_heap_base() + RUNTIME_HEAP_SIZE
    }

    /// This module's memory 0.
    #[derive(Debug, Default)]
    pub(crate) struct WasmMemory;

    impl LinearMemory for WasmMemory {
        fn page_count(&self) -> usize {
            core::arch::wasm32::memory_size(0)
        }

        fn grow(&mut self, delta_pages: usize) -> Result<usize, GrowError> {
            let previous = core::arch::wasm32::memory_grow(0, delta_pages);
            if previous == usize::MAX {
                return Err(GrowError::Refused {
                    current: self.page_count(),
                    delta: delta_pages,
                });
            }
            Ok(previous + delta_pages)
        }
    }

    impl AddressSpace for WasmMemory {
        fn pointer(&mut self, address: usize) -> *mut u8 {
            address as *mut u8
        }
    }

    /// `Math.pow` from the JavaScript host.
    #[derive(Debug, Default, Clone, Copy)]
    pub(crate) struct JsMathPower;

    impl Power for JsMathPower {
        fn pow(&self, base: f64, exponent: f64) -> f64 {
            js_sys::Math::pow(base, exponent)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    pub(crate) use pagebump_core::SimulatedMemory as HostMemory;
    pub(crate) use pagebump_core::StdPower as HostPower;

    /// Heap base used for the simulated memory.
    const SIMULATED_HEAP_BASE: usize = 1024;

    pub(crate) fn heap_base() -> usize {
        SIMULATED_HEAP_BASE
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use pagebump_core::LinearMemory;

    #[test]
    fn test_observer_without_callback_is_silent() {
        let mut observer = HostObserver::default();
        observer.on_grow(&GrowthEvent {
            pages_added: 1,
            total_pages: 2,
            requested_size: 70000,
        });
    }

    #[test]
    fn test_native_host_memory_starts_with_one_page() {
        let memory = HostMemory::default();
        assert_eq!(memory.page_count(), 1);
        assert_eq!(heap_base() % 8, 0);
        assert!(heap_base() < memory.byte_len());
    }
}
