//! Error types for pack operations

use crate::pack::PackMode;
use thiserror::Error;

/// Pack operation result type
pub type PackResult<T> = Result<T, PackError>;

/// Errors raised while creating, reading or querying a pack file
#[derive(Debug, Error)]
pub enum PackError {
    /// I/O error on the backing file or a source/destination file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary read/write error
    #[error("Binary format error: {0}")]
    Binary(#[from] binrw::Error),

    /// The global header magic did not match; the file is not a pack
    #[error("Invalid pack header: expected magic {expected:02X?}, got {actual:02X?}")]
    InvalidHeader {
        /// Magic bytes the format requires
        expected: [u8; 4],
        /// Bytes actually found (zero-filled if the file was too short)
        actual: [u8; 4],
    },

    /// The file ended inside the global header, after a valid magic
    #[error("Abrupt ending to data: pack header is truncated")]
    TruncatedHeader,

    /// An entry header magic was missing where the entry count promised one
    #[error("Abrupt ending to data: entry {index} at offset {offset} is truncated or corrupt")]
    TruncatedEntry {
        /// Zero-based index of the entry being scanned
        index: usize,
        /// Absolute offset of the entry header
        offset: u64,
    },

    /// A length field read from disk was negative
    #[error("Invalid {field}: {value}")]
    InvalidLength {
        /// Name of the offending field
        field: &'static str,
        /// Raw value read from disk
        value: i64,
    },

    /// Operation invoked while the handle was in the wrong mode
    #[error("{operation} requires a pack in {expected} mode, but the pack is {actual}")]
    WrongMode {
        /// Operation that was attempted
        operation: &'static str,
        /// Mode the operation needs
        expected: PackMode,
        /// Mode the handle was in
        actual: PackMode,
    },

    /// No entry with the requested name is indexed
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Name or payload does not fit the 32-bit signed length fields
    #[error("Entry too large: {field} is {size} bytes (maximum {max})")]
    EntryTooLarge {
        /// Which part of the entry overflowed
        field: &'static str,
        /// Size that was requested
        size: u64,
        /// Largest size the format can record
        max: u64,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PackError {
    /// Check if this error means the file is not a well-formed pack
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidHeader { .. }
                | Self::TruncatedHeader
                | Self::TruncatedEntry { .. }
                | Self::InvalidLength { .. }
        )
    }

    /// Check if this error came from calling an operation in the wrong mode
    pub fn is_mode_error(&self) -> bool {
        matches!(self, Self::WrongMode { .. })
    }

    /// Check if this error is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntryNotFound(_))
    }

    pub(crate) fn not_found(name: &[u8]) -> Self {
        Self::EntryNotFound(String::from_utf8_lossy(name).into_owned())
    }
}
