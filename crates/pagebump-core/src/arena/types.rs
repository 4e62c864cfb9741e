//! Core types for the bump arena.

use crate::memory::GrowError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default allocation alignment in bytes.
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Error types for arena operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The host could not commit the pages the cursor now needs.
    ///
    /// There is no recovery path: the execution context should abort.
    #[error("linear memory exhausted: could not grow by {requested_pages} pages from {current_pages}")]
    GrowthExhausted {
        requested_pages: usize,
        current_pages: usize,
        #[source]
        source: GrowError,
    },

    /// Aligning the request or advancing the cursor would overflow.
    #[error("allocation of {size} bytes overflows the address space")]
    UnboundedRequest { size: usize },

    /// The arena configuration is unusable.
    #[error("Invalid arena config: {0}")]
    InvalidConfig(String),

    /// The arena was entered again while an operation on it was still running,
    /// for example from inside a growth notification.
    #[error("arena is already in use by an enclosing call")]
    Reentered,
}

/// Arena configuration.
///
/// The page size is not configurable; it is always
/// [`WASM_PAGE_SIZE`](crate::memory::WASM_PAGE_SIZE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArenaConfig {
    /// First address the arena may hand out. Must be a multiple of `alignment`.
    pub heap_base: usize,
    /// Alignment of every returned address and of every reserved size.
    pub alignment: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            heap_base: 0,
            alignment: DEFAULT_ALIGNMENT,
        }
    }
}

impl ArenaConfig {
    /// Create a config with the given heap base and the default alignment.
    pub fn new(heap_base: usize) -> Self {
        Self {
            heap_base,
            ..Self::default()
        }
    }

    pub fn with_heap_base(mut self, heap_base: usize) -> Self {
        self.heap_base = heap_base;
        self
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Check that the alignment is a power of two and the heap base honors it.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::InvalidConfig(format!(
                "alignment {} is not a power of two",
                self.alignment
            )));
        }
        if self.heap_base % self.alignment != 0 {
            return Err(ArenaError::InvalidConfig(format!(
                "heap base {} is not aligned to {}",
                self.heap_base, self.alignment
            )));
        }
        Ok(())
    }
}

/// Counters describing arena usage.
///
/// `allocations`, `bytes_requested` and `bytes_reserved` cover the current
/// session and are cleared by `reset`. The rest accumulate for the lifetime
/// of the arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaStats {
    /// Successful `allocate` calls since the last reset.
    pub allocations: usize,
    /// Sum of requested sizes since the last reset.
    pub bytes_requested: usize,
    /// Sum of aligned sizes since the last reset.
    pub bytes_reserved: usize,
    /// Highest cursor value ever reached.
    pub peak_cursor: usize,
    /// Number of times linear memory was grown.
    pub growth_events: usize,
    /// Pages added across all growth events.
    pub pages_grown: usize,
    /// Number of `reset` calls.
    pub resets: usize,
}

impl ArenaStats {
    pub(crate) fn clear_session(&mut self) {
        self.allocations = 0;
        self.bytes_requested = 0;
        self.bytes_reserved = 0;
    }
}

/// Round `size` up to a multiple of `alignment`.
///
/// A zero-byte request still reserves one alignment unit so that every
/// allocation gets a distinct address. Returns `None` on overflow.
#[inline]
pub fn aligned_size(size: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    if size == 0 {
        return Some(alignment);
    }
    let mask = alignment - 1;
    size.checked_add(mask).map(|s| s & !mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_size() {
        assert_eq!(aligned_size(0, 8), Some(8));
        assert_eq!(aligned_size(1, 8), Some(8));
        assert_eq!(aligned_size(8, 8), Some(8));
        assert_eq!(aligned_size(9, 8), Some(16));
        assert_eq!(aligned_size(10, 8), Some(16));
        assert_eq!(aligned_size(70000, 8), Some(70000));
        assert_eq!(aligned_size(3, 1), Some(3));
    }

    #[test]
    fn test_aligned_size_overflow() {
        assert_eq!(aligned_size(usize::MAX, 8), None);
        assert_eq!(aligned_size(usize::MAX - 6, 8), None);
        assert_eq!(aligned_size(usize::MAX - 7, 8), Some(usize::MAX - 7));
    }

    #[test]
    fn test_config_default() {
        let config = ArenaConfig::default();
        assert_eq!(config.heap_base, 0);
        assert_eq!(config.alignment, DEFAULT_ALIGNMENT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = ArenaConfig::new(1024).with_alignment(16);
        assert_eq!(config.heap_base, 1024);
        assert_eq!(config.alignment, 16);

        let config = config.with_heap_base(2048);
        assert_eq!(config.heap_base, 2048);
    }

    #[test]
    fn test_config_rejects_bad_alignment() {
        for alignment in [0, 3, 12] {
            let config = ArenaConfig::new(0).with_alignment(alignment);
            assert!(matches!(config.validate(), Err(ArenaError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_config_rejects_misaligned_heap_base() {
        let config = ArenaConfig::new(1028);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arena config: heap base 1028 is not aligned to 8"
        );
    }

    #[test]
    fn test_config_serde_uses_camel_case_and_defaults() {
        use serde::de::value::{Error as ValueError, MapDeserializer};

        let fields = vec![("heapBase", 4096usize)];
        let deserializer = MapDeserializer::<_, ValueError>::new(fields.into_iter());
        let config = ArenaConfig::deserialize(deserializer).unwrap();
        assert_eq!(config, ArenaConfig::new(4096));
    }

    #[test]
    fn test_stats_clear_session_keeps_lifetime_counters() {
        let mut stats = ArenaStats {
            allocations: 3,
            bytes_requested: 40,
            bytes_reserved: 48,
            peak_cursor: 2048,
            growth_events: 1,
            pages_grown: 1,
            resets: 2,
        };
        stats.clear_session();
        assert_eq!(stats.allocations, 0);
        assert_eq!(stats.bytes_requested, 0);
        assert_eq!(stats.bytes_reserved, 0);
        assert_eq!(stats.peak_cursor, 2048);
        assert_eq!(stats.growth_events, 1);
        assert_eq!(stats.pages_grown, 1);
        assert_eq!(stats.resets, 2);
    }

    #[test]
    fn test_error_messages() {
        let err = ArenaError::UnboundedRequest { size: usize::MAX };
        assert!(err.to_string().contains("overflows the address space"));

        let err = ArenaError::GrowthExhausted {
            requested_pages: 2,
            current_pages: 5,
            source: GrowError::Refused {
                current: 5,
                delta: 2,
            },
        };
        assert_eq!(
            err.to_string(),
            "linear memory exhausted: could not grow by 2 pages from 5"
        );

        assert!(ArenaError::Reentered.to_string().contains("already in use"));
    }
}
