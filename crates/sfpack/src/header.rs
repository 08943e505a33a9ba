//! On-disk header records
//!
//! A pack starts with a 16-byte global header and every entry is preceded by a
//! 16-byte entry header followed by its name. All integers are little-endian
//! signed 32-bit values.
//!
//! ```text
//! Global header:  "SFPv" | format_version | entry_count | reserved
//! Entry header:   "SFPv" | name_length    | reserved    | payload_length
//!                 name bytes (name_length)
//!                 payload bytes (payload_length)
//! ```
//!
//! The same magic is repeated before every entry header so the reader can tell
//! a truncated or corrupt entry apart from a file that is not a pack at all.

use crate::error::{PackError, PackResult};
use binrw::{BinRead, BinWrite};
use std::io::{Read, Seek, Write};

/// Magic literal written at the start of the file and before every entry
pub const MAGIC: [u8; 4] = *b"SFPv";

/// Format version written by this implementation
pub const FORMAT_VERSION: i32 = 1;

/// Size of the global header in bytes
pub const GLOBAL_HEADER_SIZE: u64 = 16;

/// Size of an entry header in bytes, excluding the name
pub const ENTRY_HEADER_SIZE: u64 = 16;

/// Absolute offset of the `entry_count` field
pub const ENTRY_COUNT_OFFSET: u64 = 8;

/// Largest name or payload length the 32-bit fields can record
pub const MAX_FIELD_LENGTH: u64 = i32::MAX as u64;

/// Global header fields following the magic
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct GlobalHeader {
    /// Format version (currently 1)
    pub format_version: i32,
    /// Number of entries physically present after the header
    pub entry_count: i32,
    /// Unused, always written as zero
    pub reserved: i32,
}

impl Default for GlobalHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalHeader {
    /// Header for a freshly created, empty pack
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            entry_count: 0,
            reserved: 0,
        }
    }

    /// Read and validate the global header, including its magic
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> PackResult<Self> {
        let magic = read_magic(reader)?;
        if magic != MAGIC {
            return Err(PackError::InvalidHeader {
                expected: MAGIC,
                actual: magic,
            });
        }

        let header = match Self::read(reader) {
            Ok(header) => header,
            Err(e) if e.is_eof() => return Err(PackError::TruncatedHeader),
            Err(e) => return Err(e.into()),
        };
        if header.entry_count < 0 {
            return Err(PackError::InvalidLength {
                field: "entry_count",
                value: i64::from(header.entry_count),
            });
        }
        Ok(header)
    }

    /// Write the magic followed by the header fields
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> PackResult<()> {
        writer.write_all(&MAGIC)?;
        self.write(writer)?;
        Ok(())
    }

    /// Entry count as an unsigned value
    pub fn entry_count(&self) -> usize {
        self.entry_count.max(0) as usize
    }
}

/// Entry header fields following the per-entry magic
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct EntryHeader {
    /// Length of the internal name in bytes
    pub name_length: i32,
    /// Unused, always written as zero
    pub reserved: i32,
    /// Length of the payload in bytes
    pub payload_length: i32,
}

impl EntryHeader {
    /// Build a header for an entry, rejecting lengths the format cannot hold
    pub fn new(name_length: usize, payload_length: u64) -> PackResult<Self> {
        let name_length = i32::try_from(name_length).map_err(|_| PackError::EntryTooLarge {
            field: "name",
            size: name_length as u64,
            max: MAX_FIELD_LENGTH,
        })?;
        let payload_length =
            i32::try_from(payload_length).map_err(|_| PackError::EntryTooLarge {
                field: "payload",
                size: payload_length,
                max: MAX_FIELD_LENGTH,
            })?;

        Ok(Self {
            name_length,
            reserved: 0,
            payload_length,
        })
    }

    /// Read and validate an entry header
    ///
    /// `index` and the current stream position are reported in the
    /// [`PackError::TruncatedEntry`] raised when the magic is missing or the
    /// header runs past the end of the file.
    pub fn read_from<R: Read + Seek>(reader: &mut R, index: usize) -> PackResult<Self> {
        let offset = reader.stream_position()?;
        let truncated = || PackError::TruncatedEntry { index, offset };

        if read_magic(reader)? != MAGIC {
            return Err(truncated());
        }

        let header = match Self::read(reader) {
            Ok(header) => header,
            Err(e) if e.is_eof() => return Err(truncated()),
            Err(e) => return Err(e.into()),
        };

        if header.name_length < 0 {
            return Err(PackError::InvalidLength {
                field: "name_length",
                value: i64::from(header.name_length),
            });
        }
        if header.payload_length < 0 {
            return Err(PackError::InvalidLength {
                field: "payload_length",
                value: i64::from(header.payload_length),
            });
        }
        Ok(header)
    }

    /// Write the magic followed by the header fields
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> PackResult<()> {
        writer.write_all(&MAGIC)?;
        self.write(writer)?;
        Ok(())
    }

    /// Name length as an unsigned value
    pub fn name_len(&self) -> usize {
        self.name_length.max(0) as usize
    }

    /// Payload length as an unsigned value
    pub fn payload_len(&self) -> u64 {
        self.payload_length.max(0) as u64
    }
}

/// Read up to four magic bytes. A short read leaves the tail zero-filled.
fn read_magic<R: Read>(reader: &mut R) -> std::io::Result<[u8; 4]> {
    let mut magic = [0u8; 4];
    let mut found = Vec::with_capacity(magic.len());
    reader.by_ref().take(4).read_to_end(&mut found)?;
    magic[..found.len()].copy_from_slice(&found);
    Ok(magic)
}
