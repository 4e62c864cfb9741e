//! Raw byte primitives over linear memory.
//!
//! These are the freestanding replacements for `memcpy` / `memset` that the
//! codec layer relies on. They know nothing about the arena: the caller is
//! responsible for keeping every range inside memory that has been allocated
//! and not yet reclaimed by a reset.

/// Copy `len` bytes from `src` to `dest`, front to back, one byte at a time.
///
/// A `len` of zero touches nothing.
///
/// # Safety
///
/// * `src` must be valid for reads of `len` bytes.
/// * `dest` must be valid for writes of `len` bytes.
/// * The regions should not overlap. Overlapping ranges are not undefined
///   behavior here, but the result is only meaningful when `dest < src` or
///   the ranges are disjoint.
#[inline]
pub unsafe fn copy(dest: *mut u8, src: *const u8, len: usize) {
    for i in 0..len {
        dest.add(i).write(src.add(i).read());
    }
}

/// Write the low 8 bits of `value` into `len` consecutive bytes at `dest`.
///
/// A `len` of zero touches nothing.
///
/// # Safety
///
/// `dest` must be valid for writes of `len` bytes.
#[inline]
pub unsafe fn fill(dest: *mut u8, value: i32, len: usize) {
    let byte = value as u8;
    for i in 0..len {
        dest.add(i).write(byte);
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
