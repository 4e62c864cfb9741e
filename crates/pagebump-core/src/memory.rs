//! Linear memory host seam.
//!
//! The arena never owns its address space. It only asks the host how many
//! pages are committed and, when the cursor runs past them, asks for more.
//! [`LinearMemory`] is that conversation; [`AddressSpace`] additionally lets
//! the arena turn an address into a pointer so it can touch bytes.
//!
//! [`SimulatedMemory`] is a `Vec`-backed host used on native targets and in
//! tests. It behaves like a wasm memory: zero-filled pages, grow-only, with
//! an optional page ceiling to model exhaustion.

use crate::mem;
use thiserror::Error;

/// Size of one page of linear memory (64 KiB).
pub const WASM_PAGE_SIZE: usize = 65536;

/// Largest page count a 32-bit wasm memory can ever reach (4 GiB).
pub const WASM32_MAX_PAGES: usize = 65536;

/// Errors reported by a host when asked to grow memory.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GrowError {
    /// The host refused the request (limit reached or out of memory).
    #[error("host refused to grow memory from {current} pages by {delta}")]
    Refused { current: usize, delta: usize },
}

/// Host operations on a growable, page-granular address space.
pub trait LinearMemory {
    /// Number of pages currently committed.
    fn page_count(&self) -> usize;

    /// Commit `delta_pages` more pages, returning the new page count.
    fn grow(&mut self, delta_pages: usize) -> Result<usize, GrowError>;

    /// Committed size in bytes.
    fn byte_len(&self) -> usize {
        self.page_count().saturating_mul(WASM_PAGE_SIZE)
    }
}

/// A linear memory whose addresses can be dereferenced by this process.
pub trait AddressSpace: LinearMemory {
    /// Translate a linear address into a host pointer.
    ///
    /// The pointer is only valid for the committed range; translating an
    /// address past it is allowed, dereferencing the result is not.
    fn pointer(&mut self, address: usize) -> *mut u8;
}

/// In-process linear memory backed by a `Vec<u8>`.
#[derive(Debug, Clone)]
pub struct SimulatedMemory {
    bytes: Vec<u8>,
    max_pages: usize,
}

impl SimulatedMemory {
    /// Create a memory with `initial_pages` zeroed pages.
    ///
    /// # Panics
    ///
    /// Panics if `initial_pages` exceeds [`WASM32_MAX_PAGES`] or its byte
    /// size does not fit in `usize`.
    pub fn new(initial_pages: usize) -> Self {
        let byte_len = match initial_pages.checked_mul(WASM_PAGE_SIZE) {
            Some(len) if initial_pages <= WASM32_MAX_PAGES => len,
            _ => panic!(
                "{} initial pages exceed the {} page limit of a 32-bit memory",
                initial_pages, WASM32_MAX_PAGES
            ),
        };
        Self {
            bytes: vec![0; byte_len],
            max_pages: WASM32_MAX_PAGES,
        }
    }

    /// Cap the number of pages this memory may ever commit.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Page ceiling.
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Borrow `len` bytes starting at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the range is not committed.
    pub fn read(&self, address: usize, len: usize) -> &[u8] {
        &self.bytes[address..address + len]
    }

    /// Store `data` at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the range is not committed.
    pub fn write(&mut self, address: usize, data: &[u8]) {
        self.bytes[address..address + data.len()].copy_from_slice(data);
    }

    /// Bounds-checked [`mem::copy`] between two committed ranges.
    ///
    /// # Panics
    ///
    /// Panics if either range is not committed.
    pub fn copy(&mut self, dest: usize, src: usize, len: usize) {
        self.check_range(dest, len);
        self.check_range(src, len);
        let base = self.bytes.as_mut_ptr();
        // SAFETY: both ranges were checked against the committed buffer.
        unsafe { mem::copy(base.add(dest), base.add(src), len) };
    }

    /// Bounds-checked [`mem::fill`] over a committed range.
    ///
    /// # Panics
    ///
    /// Panics if the range is not committed.
    pub fn fill(&mut self, dest: usize, value: i32, len: usize) {
        self.check_range(dest, len);
        // SAFETY: range checked above.
        unsafe { mem::fill(self.bytes.as_mut_ptr().add(dest), value, len) };
    }

    fn check_range(&self, address: usize, len: usize) {
        let end = address.checked_add(len);
        assert!(
            matches!(end, Some(end) if end <= self.bytes.len()),
            "range {}+{} outside committed memory of {} bytes",
            address,
            len,
            self.bytes.len()
        );
    }
}

impl Default for SimulatedMemory {
    fn default() -> Self {
        Self::new(1)
    }
}

impl LinearMemory for SimulatedMemory {
    fn page_count(&self) -> usize {
        self.bytes.len() / WASM_PAGE_SIZE
    }

    fn grow(&mut self, delta_pages: usize) -> Result<usize, GrowError> {
        let current = self.page_count();
        let refused = GrowError::Refused {
            current,
            delta: delta_pages,
        };

        let total = current.checked_add(delta_pages).ok_or(refused)?;
        if total > self.max_pages {
            return Err(refused);
        }
        let byte_len = total.checked_mul(WASM_PAGE_SIZE).ok_or(refused)?;

        self.bytes.resize(byte_len, 0);
        Ok(total)
    }
}

impl AddressSpace for SimulatedMemory {
    fn pointer(&mut self, address: usize) -> *mut u8 {
        self.bytes.as_mut_ptr().wrapping_add(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_memory_is_zeroed() {
        let memory = SimulatedMemory::new(1);
        assert_eq!(memory.page_count(), 1);
        assert_eq!(memory.byte_len(), WASM_PAGE_SIZE);
        assert!(memory.read(0, WASM_PAGE_SIZE).iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "page limit")]
    fn test_new_rejects_oversized_memory() {
        SimulatedMemory::new(usize::MAX / 2);
    }

    #[test]
    #[should_panic(expected = "page limit")]
    fn test_new_rejects_more_than_wasm32_pages() {
        SimulatedMemory::new(WASM32_MAX_PAGES + 1);
    }

    #[test]
    fn test_grow_returns_new_page_count() {
        let mut memory = SimulatedMemory::new(1);
        assert_eq!(memory.grow(2), Ok(3));
        assert_eq!(memory.page_count(), 3);
        assert_eq!(memory.byte_len(), 3 * WASM_PAGE_SIZE);
    }

    #[test]
    fn test_grow_zero_is_noop() {
        let mut memory = SimulatedMemory::new(2);
        assert_eq!(memory.grow(0), Ok(2));
    }

    #[test]
    fn test_grow_preserves_contents() {
        let mut memory = SimulatedMemory::new(1);
        memory.write(100, &[1, 2, 3]);
        memory.grow(1).unwrap();
        assert_eq!(memory.read(100, 3), &[1, 2, 3]);
        assert_eq!(memory.read(WASM_PAGE_SIZE, 4), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_grow_past_ceiling_is_refused() {
        let mut memory = SimulatedMemory::new(1).with_max_pages(2);
        assert_eq!(memory.grow(1), Ok(2));
        assert_eq!(
            memory.grow(1),
            Err(GrowError::Refused {
                current: 2,
                delta: 1
            })
        );
        assert_eq!(memory.page_count(), 2);
    }

    #[test]
    fn test_grow_overflow_is_refused() {
        let mut memory = SimulatedMemory::new(1).with_max_pages(usize::MAX);
        assert!(memory.grow(usize::MAX).is_err());
        assert_eq!(memory.page_count(), 1);
    }

    #[test]
    fn test_copy_and_fill_by_address() {
        let mut memory = SimulatedMemory::new(1);
        memory.write(16, b"pagebump");
        memory.copy(64, 16, 8);
        assert_eq!(memory.read(64, 8), b"pagebump");

        memory.fill(64, 0x2A, 4);
        assert_eq!(memory.read(64, 8), b"****bump");
    }

    #[test]
    #[should_panic(expected = "outside committed memory")]
    fn test_copy_out_of_range_panics() {
        let mut memory = SimulatedMemory::new(1);
        memory.copy(WASM_PAGE_SIZE - 4, 0, 8);
    }

    #[test]
    #[should_panic(expected = "outside committed memory")]
    fn test_fill_out_of_range_panics() {
        let mut memory = SimulatedMemory::new(1);
        memory.fill(WASM_PAGE_SIZE, 0, 1);
    }

    #[test]
    fn test_pointer_translation_matches_read() {
        let mut memory = SimulatedMemory::new(1);
        let ptr = memory.pointer(32);
        unsafe { ptr.write(0x77) };
        assert_eq!(memory.read(32, 1), &[0x77]);
    }
}
