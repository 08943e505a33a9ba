//! Transfer sizing for pack reads and writes

use crate::error::{PackError, PackResult};
use serde::{Deserialize, Serialize};

/// Default chunk size for chunked transfers (20 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 20 * 1024 * 1024;

/// Default payload size above which transfers are chunked (50 MiB)
pub const DEFAULT_CHUNK_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Configuration for pack writers and readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Largest buffer allocated per chunk when a transfer is chunked
    pub chunk_size: usize,

    /// Payloads strictly larger than this are moved in chunks
    pub chunk_threshold: u64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
        }
    }
}

impl PackConfig {
    /// Create a configuration with the default sizing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size
    #[must_use]
    pub const fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the size above which transfers are chunked
    #[must_use]
    pub const fn with_chunk_threshold(mut self, threshold: u64) -> Self {
        self.chunk_threshold = threshold;
        self
    }

    /// Whether a payload of `len` bytes should be moved in chunks
    pub const fn is_chunked(&self, len: u64) -> bool {
        len > self.chunk_threshold
    }

    /// Validate configuration values
    pub fn validate(&self) -> PackResult<()> {
        if self.chunk_size == 0 {
            return Err(PackError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
