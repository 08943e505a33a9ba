//! Mode-tagged pack handle
//!
//! [`PackFile`] is a single stateful handle that is either closed, writing a
//! new pack, or reading an existing one. Every operation belongs to exactly one
//! mode; calling it in another mode returns [`PackError::WrongMode`] and leaves
//! the handle untouched. The backing file is owned by the active state, so it
//! is released on [`PackFile::close`] and whenever the handle is dropped.

use crate::config::PackConfig;
use crate::entry::PackEntry;
use crate::error::{PackError, PackResult};
use crate::reader::PackReader;
use crate::stream::EntryStream;
use crate::writer::PackWriter;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};

/// Mode of a [`PackFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackMode {
    /// No file is associated with the handle
    Closed,
    /// An existing pack is open and indexed
    Reading,
    /// A new pack is being written
    Writing,
}

impl fmt::Display for PackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Reading => write!(f, "reading"),
            Self::Writing => write!(f, "writing"),
        }
    }
}

enum PackState {
    Closed,
    Writing(PackWriter),
    Reading(PackReader),
}

/// Stateful pack handle switching between writing and reading
///
/// # Example
///
/// ```rust,no_run
/// use sfpack::PackFile;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut pack = PackFile::new();
/// pack.create("p.dat")?;
/// pack.add_entry(b"hello", "a.txt")?;
/// pack.add_entry(b"world!", "b.txt")?;
///
/// pack.open("p.dat")?;
/// assert_eq!(pack.entry_count()?, 2);
/// assert_eq!(pack.read_entry("b.txt")?, b"world!");
/// pack.close();
/// # Ok(())
/// # }
/// ```
pub struct PackFile {
    state: PackState,
    config: PackConfig,
}

impl Default for PackFile {
    fn default() -> Self {
        Self::new()
    }
}

impl PackFile {
    /// Create a closed handle with default sizing
    pub fn new() -> Self {
        Self::with_config(PackConfig::default())
    }

    /// Create a closed handle that uses `config` for every pack it opens
    pub fn with_config(config: PackConfig) -> Self {
        Self {
            state: PackState::Closed,
            config,
        }
    }

    /// Current mode
    pub fn mode(&self) -> PackMode {
        match self.state {
            PackState::Closed => PackMode::Closed,
            PackState::Writing(_) => PackMode::Writing,
            PackState::Reading(_) => PackMode::Reading,
        }
    }

    /// Whether a file is currently associated with the handle
    pub fn is_active(&self) -> bool {
        !matches!(self.state, PackState::Closed)
    }

    /// Configuration applied to packs opened through this handle
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Create a new pack at `path` and switch to writing mode
    ///
    /// Any active pack is closed first. An existing file at `path` is
    /// overwritten. On failure the handle is left closed.
    pub fn create<P: AsRef<Path>>(&mut self, path: P) -> PackResult<()> {
        self.close();
        let writer = PackWriter::create(path, self.config.clone())?;
        self.state = PackState::Writing(writer);
        Ok(())
    }

    /// Append an in-memory payload under `name`
    ///
    /// A failed append leaves the pack as it was before the call.
    pub fn add_entry(&mut self, data: &[u8], name: impl AsRef<[u8]>) -> PackResult<()> {
        self.append("add_entry", |writer| writer.add_entry(data, name))
    }

    /// Append the contents of the file at `source` under `name`
    pub fn add_entry_from_path<P: AsRef<Path>>(
        &mut self,
        source: P,
        name: impl AsRef<[u8]>,
    ) -> PackResult<()> {
        self.append("add_entry_from_path", |writer| {
            writer.add_entry_from_path(source, name)
        })
    }

    /// Append the full contents of `source` under `name`
    pub fn add_entry_from_reader<S: Read + Seek>(
        &mut self,
        source: &mut S,
        name: impl AsRef<[u8]>,
    ) -> PackResult<()> {
        self.append("add_entry_from_reader", |writer| {
            writer.add_entry_from_reader(source, name)
        })
    }

    /// Open the existing pack at `path` and switch to reading mode
    ///
    /// Any active pack is closed first. If the file is not a valid pack the
    /// handle is left closed with no entries indexed.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> PackResult<()> {
        self.close();
        let reader = PackReader::open(path, self.config.clone())?;
        self.state = PackState::Reading(reader);
        Ok(())
    }

    /// Entry names in the order they were added
    pub fn list_entries(&self) -> PackResult<Vec<&[u8]>> {
        Ok(self.reader("list_entries")?.list_entries())
    }

    /// Indexed entry descriptors in on-disk order
    pub fn entries(&self) -> PackResult<&[PackEntry]> {
        Ok(self.reader("entries")?.entries())
    }

    /// Number of indexed entries
    pub fn entry_count(&self) -> PackResult<usize> {
        Ok(self.reader("entry_count")?.entry_count())
    }

    /// Whether an entry named `name` is indexed
    pub fn entry_exists(&self, name: impl AsRef<[u8]>) -> PackResult<bool> {
        Ok(self.reader("entry_exists")?.entry_exists(name))
    }

    /// Bounded stream over the payload of the named entry
    pub fn get_entry_stream(
        &mut self,
        name: impl AsRef<[u8]>,
    ) -> PackResult<EntryStream<'_, File>> {
        self.reader_mut("get_entry_stream")?.get_entry_stream(name)
    }

    /// Read the whole payload of the named entry into memory
    pub fn read_entry(&mut self, name: impl AsRef<[u8]>) -> PackResult<Vec<u8>> {
        self.reader_mut("read_entry")?.read_entry(name)
    }

    /// Write the payload of the named entry to `destination`
    pub fn extract_entry<P: AsRef<Path>>(
        &mut self,
        name: impl AsRef<[u8]>,
        destination: P,
    ) -> PackResult<u64> {
        self.reader_mut("extract_entry")?
            .extract_entry(name, destination)
    }

    /// Release the backing file and return to the closed state
    ///
    /// Closing a closed handle does nothing.
    pub fn close(&mut self) {
        let previous = self.mode();
        if previous != PackMode::Closed {
            self.state = PackState::Closed;
            debug!("Closed pack that was open for {}", previous);
        }
    }

    fn wrong_mode(&self, operation: &'static str, expected: PackMode) -> PackError {
        PackError::WrongMode {
            operation,
            expected,
            actual: self.mode(),
        }
    }

    fn reader(&self, operation: &'static str) -> PackResult<&PackReader> {
        match &self.state {
            PackState::Reading(reader) => Ok(reader),
            _ => Err(self.wrong_mode(operation, PackMode::Reading)),
        }
    }

    fn reader_mut(&mut self, operation: &'static str) -> PackResult<&mut PackReader> {
        let err = self.wrong_mode(operation, PackMode::Reading);
        match &mut self.state {
            PackState::Reading(reader) => Ok(reader),
            _ => Err(err),
        }
    }

    fn append(
        &mut self,
        operation: &'static str,
        add: impl FnOnce(&mut PackWriter) -> PackResult<()>,
    ) -> PackResult<()> {
        let writer = self.writer_mut(operation)?;
        let result = add(&mut *writer);
        if result.is_err()
            && let Err(e) = writer.truncate_uncommitted()
        {
            warn!("Failed to discard partial entry after {}: {}", operation, e);
        }
        result
    }

    fn writer_mut(&mut self, operation: &'static str) -> PackResult<&mut PackWriter> {
        let err = self.wrong_mode(operation, PackMode::Writing);
        match &mut self.state {
            PackState::Writing(writer) => Ok(writer),
            _ => Err(err),
        }
    }
}
