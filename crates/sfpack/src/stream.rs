//! Bounded read-only view over one entry's payload

use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// Lazily-read window onto an entry inside a pack
///
/// The stream borrows the pack's backing reader for its whole lifetime and
/// exposes exactly the entry's payload bytes. Positions are relative to the
/// start of the payload; reads never cross the entry boundary and nothing is
/// buffered beyond the caller's own buffer.
pub struct EntryStream<'a, R: Read + Seek> {
    inner: &'a mut R,
    start: u64,
    len: u64,
    pos: u64,
}

impl<'a, R: Read + Seek> EntryStream<'a, R> {
    /// Create a view of `len` bytes starting at absolute offset `start`
    pub fn new(inner: &'a mut R, start: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            start,
            len,
            pos: 0,
        })
    }

    /// Payload length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current position relative to the start of the payload
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes left before the end of the payload
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }
}

impl<R: Read + Seek> Read for EntryStream<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for EntryStream<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
        };
        let target = u64::try_from(target).map_err(|_| {
            io::Error::new(
                ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        // Past-the-end positions are allowed; reads there return 0
        self.inner
            .seek(SeekFrom::Start(self.start + target.min(self.len)))?;
        self.pos = target;
        Ok(target)
    }
}
