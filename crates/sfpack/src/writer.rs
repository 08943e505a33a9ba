//! Sequential pack writer
//!
//! Entries are appended one at a time. After each payload is fully written the
//! `entry_count` field of the global header is patched in place, so a pack is
//! readable after any successful append, even if the writer never closes it.
//!
//! The writer tracks the end of the last committed entry and starts every
//! append there. A failed append leaves the count untouched, and its partial
//! bytes sit past the committed end where the next append overwrites them.
//! In-memory payloads are read and checked before any byte reaches the pack.

use crate::chunked::copy_chunked;
use crate::config::PackConfig;
use crate::error::{PackError, PackResult};
use crate::header::{
    ENTRY_COUNT_OFFSET, ENTRY_HEADER_SIZE, EntryHeader, GLOBAL_HEADER_SIZE, GlobalHeader,
    MAX_FIELD_LENGTH,
};
use binrw::{BinRead, BinWrite};
use std::fs::{File, OpenOptions};
use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Append-only writer producing a pack file
pub struct PackWriter<W: Read + Write + Seek = File> {
    writer: W,
    config: PackConfig,
    entries_written: usize,
    committed_end: u64,
}

impl PackWriter<File> {
    /// Create a pack at `path`, destroying any file already there
    pub fn create<P: AsRef<Path>>(path: P, config: PackConfig) -> PackResult<Self> {
        config.validate()?;
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let writer = Self::new(file, config)?;
        info!("Created pack {}", path.display());
        Ok(writer)
    }

    /// Cut the file back to the end of the last committed entry
    ///
    /// Drops the bytes left behind by a failed append.
    pub fn truncate_uncommitted(&mut self) -> PackResult<()> {
        let len = self.writer.metadata()?.len();
        if len > self.committed_end {
            self.writer.set_len(self.committed_end)?;
            debug!(
                "Discarded {} uncommitted bytes after offset {}",
                len - self.committed_end,
                self.committed_end
            );
        }
        Ok(())
    }
}

impl<W: Read + Write + Seek> PackWriter<W> {
    /// Start a pack on an empty writer by emitting the global header
    pub fn new(mut writer: W, config: PackConfig) -> PackResult<Self> {
        config.validate()?;
        writer.seek(SeekFrom::Start(0))?;
        GlobalHeader::new().write_to(&mut writer)?;

        Ok(Self {
            writer,
            config,
            entries_written: 0,
            committed_end: GLOBAL_HEADER_SIZE,
        })
    }

    /// Append an entry whose payload is held in memory
    pub fn add_entry(&mut self, data: &[u8], name: impl AsRef<[u8]>) -> PackResult<()> {
        self.add_entry_from_reader(&mut Cursor::new(data), name)
    }

    /// Append an entry whose payload is the whole file at `source`
    pub fn add_entry_from_path<P: AsRef<Path>>(
        &mut self,
        source: P,
        name: impl AsRef<[u8]>,
    ) -> PackResult<()> {
        let mut file = File::open(source)?;
        self.add_entry_from_reader(&mut file, name)
    }

    /// Append an entry whose payload is the full contents of `source`
    ///
    /// The source is measured by seeking to its end, then read from its start.
    /// Payloads above the configured threshold are copied in chunks; smaller
    /// ones are read in full before anything is written.
    pub fn add_entry_from_reader<S: Read + Seek>(
        &mut self,
        source: &mut S,
        name: impl AsRef<[u8]>,
    ) -> PackResult<()> {
        let name = name.as_ref();
        let size = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        let header = EntryHeader::new(name.len(), size)?;

        let staged = if self.config.is_chunked(size) {
            None
        } else {
            let mut payload = Vec::with_capacity(size as usize);
            source.by_ref().take(size).read_to_end(&mut payload)?;
            if payload.len() as u64 != size {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("source ended after {} of {size} bytes", payload.len()),
                )
                .into());
            }
            Some(payload)
        };

        let offset = self.committed_end;
        self.writer.seek(SeekFrom::Start(offset))?;
        header.write_to(&mut self.writer)?;
        self.writer.write_all(name)?;

        if let Some(payload) = staged {
            self.writer.write_all(&payload)?;
        } else {
            debug!(
                "Writing {} byte payload in chunks of {} bytes",
                size, self.config.chunk_size
            );
            if let Err(e) = copy_chunked(&mut *source, &mut self.writer, size, self.config.chunk_size)
            {
                warn!(
                    "Abandoned entry {} at offset {}: {}",
                    String::from_utf8_lossy(name),
                    offset,
                    e
                );
                return Err(e.into());
            }
        }

        let count = self.increment_entry_count()?;
        self.committed_end = offset + ENTRY_HEADER_SIZE + name.len() as u64 + size;
        debug!(
            "Added entry {} ({} bytes) at offset {}, pack now holds {} entries",
            String::from_utf8_lossy(name),
            size,
            offset,
            count
        );
        Ok(())
    }

    /// Number of entries recorded in the header
    pub fn entries_written(&self) -> usize {
        self.entries_written
    }

    /// Configuration in use
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Offset one past the last fully written entry
    pub fn committed_end(&self) -> u64 {
        self.committed_end
    }

    /// Flush and recover the underlying writer
    pub fn into_inner(mut self) -> PackResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Read the count field, increment it, write it back and restore the cursor
    fn increment_entry_count(&mut self) -> PackResult<usize> {
        let resume = self.writer.stream_position()?;

        self.writer.seek(SeekFrom::Start(ENTRY_COUNT_OFFSET))?;
        let current = i32::read_le(&mut self.writer)?;
        let count = current
            .checked_add(1)
            .ok_or(PackError::EntryTooLarge {
                field: "entry_count",
                size: u64::from(current.unsigned_abs()) + 1,
                max: MAX_FIELD_LENGTH,
            })?;

        self.writer.seek(SeekFrom::Start(ENTRY_COUNT_OFFSET))?;
        count.write_le(&mut self.writer)?;
        self.writer.seek(SeekFrom::Start(resume))?;
        self.writer.flush()?;

        self.entries_written = count.max(0) as usize;
        Ok(self.entries_written)
    }
}
