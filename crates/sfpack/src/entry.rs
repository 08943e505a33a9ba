//! Entry descriptors built while indexing a pack

use std::borrow::Cow;

/// Location of one entry's payload inside a pack
///
/// Names are opaque byte strings. They are not required to be unique, and a
/// name such as `music/level1.ogg` carries no directory semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    name: Vec<u8>,
    content_length: u64,
    start_offset: u64,
}

impl PackEntry {
    /// Create a new entry descriptor
    pub fn new(name: Vec<u8>, content_length: u64, start_offset: u64) -> Self {
        Self {
            name,
            content_length,
            start_offset,
        }
    }

    /// Internal name as stored on disk
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Internal name decoded as UTF-8, replacing invalid sequences
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Payload length in bytes
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Absolute offset where the payload begins
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Absolute offset one past the last payload byte
    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.content_length
    }

    pub(crate) fn matches(&self, name: &[u8]) -> bool {
        self.name == name
    }
}
