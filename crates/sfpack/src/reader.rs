//! Pack reader and index construction
//!
//! Opening a pack performs one forward scan driven by the header's
//! `entry_count`. Each entry header and name is read, the payload is skipped
//! with a relative seek, and the resulting index is kept for the lifetime of
//! the reader. Payload bytes are only touched when an entry is streamed or
//! extracted.
//!
//! # Example
//!
//! ```rust,no_run
//! use sfpack::{PackConfig, PackReader};
//! use std::io::Read;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = PackReader::open("pack.dat", PackConfig::default())?;
//! for name in reader.list_entries() {
//!     println!("{}", String::from_utf8_lossy(name));
//! }
//!
//! let mut contents = String::new();
//! reader.get_entry_stream("a.txt")?.read_to_string(&mut contents)?;
//! # Ok(())
//! # }
//! ```

use crate::chunked::copy_chunked;
use crate::config::PackConfig;
use crate::entry::PackEntry;
use crate::error::{PackError, PackResult};
use crate::header::{ENTRY_HEADER_SIZE, EntryHeader, FORMAT_VERSION, GlobalHeader};
use crate::stream::EntryStream;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Upper bound on index capacity reserved up front from an untrusted count
const MAX_PREALLOCATED_ENTRIES: usize = 4096;

/// Read-only view of a pack with an in-memory entry index
pub struct PackReader<R: Read + Seek = File> {
    reader: R,
    entries: Vec<PackEntry>,
    format_version: i32,
    config: PackConfig,
}

impl PackReader<File> {
    /// Open the pack at `path` and build its index
    pub fn open<P: AsRef<Path>>(path: P, config: PackConfig) -> PackResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = Self::new(file, config)?;
        info!(
            "Opened pack {} with {} entries",
            path.display(),
            reader.entry_count()
        );
        Ok(reader)
    }
}

impl<R: Read + Seek> PackReader<R> {
    /// Validate the header of `reader` and index every entry
    ///
    /// Fails without returning a partial index if the global magic is wrong,
    /// if an entry header is missing or corrupt, or if an entry claims more
    /// bytes than the file holds.
    pub fn new(mut reader: R, config: PackConfig) -> PackResult<Self> {
        config.validate()?;
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let mut scan = BufReader::new(reader);
        let header = GlobalHeader::read_from(&mut scan)?;
        if header.format_version != FORMAT_VERSION {
            warn!(
                "Pack format version {} differs from supported version {}",
                header.format_version, FORMAT_VERSION
            );
        }

        let count = header.entry_count();
        let mut entries = Vec::with_capacity(count.min(MAX_PREALLOCATED_ENTRIES));
        for index in 0..count {
            let entry = Self::scan_entry(&mut scan, index, file_len)?;
            debug!(
                "Indexed entry {} '{}' ({} bytes at offset {})",
                index,
                entry.name_lossy(),
                entry.content_length(),
                entry.start_offset()
            );
            entries.push(entry);
        }

        Ok(Self {
            reader: scan.into_inner(),
            entries,
            format_version: header.format_version,
            config,
        })
    }

    /// Read one entry header and name, then skip over the payload
    fn scan_entry(
        scan: &mut BufReader<R>,
        index: usize,
        file_len: u64,
    ) -> PackResult<PackEntry> {
        let offset = scan.stream_position()?;
        let truncated = || PackError::TruncatedEntry { index, offset };

        let header = EntryHeader::read_from(scan, index)?;
        let start_offset = offset + ENTRY_HEADER_SIZE + header.name_len() as u64;
        let end_offset = start_offset + header.payload_len();
        if end_offset > file_len {
            return Err(truncated());
        }

        let mut name = vec![0u8; header.name_len()];
        scan.read_exact(&mut name).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                truncated()
            } else {
                e.into()
            }
        })?;

        scan.seek_relative(i64::from(header.payload_length))?;
        Ok(PackEntry::new(name, header.payload_len(), start_offset))
    }

    /// All indexed entries in on-disk order
    pub fn entries(&self) -> &[PackEntry] {
        &self.entries
    }

    /// Entry names in the order they were added
    pub fn list_entries(&self) -> Vec<&[u8]> {
        self.entries.iter().map(PackEntry::name).collect()
    }

    /// Number of indexed entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether an entry with this name is indexed
    pub fn entry_exists(&self, name: impl AsRef<[u8]>) -> bool {
        self.find_entry(name).is_some()
    }

    /// First entry whose name matches
    pub fn find_entry(&self, name: impl AsRef<[u8]>) -> Option<&PackEntry> {
        let name = name.as_ref();
        self.entries.iter().find(|entry| entry.matches(name))
    }

    /// Format version recorded in the global header
    pub fn format_version(&self) -> i32 {
        self.format_version
    }

    /// Configuration in use
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Bounded stream over the payload of the named entry
    pub fn get_entry_stream(&mut self, name: impl AsRef<[u8]>) -> PackResult<EntryStream<'_, R>> {
        let (start, len) = self.locate(name.as_ref())?;
        Ok(EntryStream::new(&mut self.reader, start, len)?)
    }

    /// Read the whole payload of the named entry into memory
    pub fn read_entry(&mut self, name: impl AsRef<[u8]>) -> PackResult<Vec<u8>> {
        let mut stream = self.get_entry_stream(name)?;
        let mut data = Vec::with_capacity(stream.len() as usize);
        stream.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Write the payload of the named entry to `destination`
    ///
    /// The destination is created or truncated only once the entry is known to
    /// exist. Returns the number of bytes written.
    pub fn extract_entry<P: AsRef<Path>>(
        &mut self,
        name: impl AsRef<[u8]>,
        destination: P,
    ) -> PackResult<u64> {
        let name = name.as_ref();
        let (start, len) = self.locate(name)?;
        let destination = destination.as_ref();
        let mut out = File::create(destination)?;

        let chunked = self.config.is_chunked(len);
        let chunk_size = self.config.chunk_size;
        let mut stream = EntryStream::new(&mut self.reader, start, len)?;
        if chunked {
            copy_chunked(&mut stream, &mut out, len, chunk_size)?;
        } else {
            let mut payload = Vec::with_capacity(len as usize);
            stream.read_to_end(&mut payload)?;
            if payload.len() as u64 != len {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("entry ended after {} of {len} bytes", payload.len()),
                )
                .into());
            }
            out.write_all(&payload)?;
        }
        out.flush()?;

        debug!(
            "Extracted '{}' ({} bytes{}) to {}",
            String::from_utf8_lossy(name),
            len,
            if chunked { ", chunked" } else { "" },
            destination.display()
        );
        Ok(len)
    }

    /// Recover the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn locate(&self, name: &[u8]) -> PackResult<(u64, u64)> {
        self.find_entry(name)
            .map(|entry| (entry.start_offset(), entry.content_length()))
            .ok_or_else(|| PackError::not_found(name))
    }
}
