//! Chunked transfer of large payloads
//!
//! [`ChunkReader`] turns a reader into a finite sequence of owned buffers no
//! larger than a fixed chunk size, so payloads of hundreds of megabytes can be
//! copied without a single allocation of the whole payload. The sequence reads
//! from wherever the source is currently positioned and is not restartable.

use std::io::{self, ErrorKind, Read, Write};
use tracing::debug;

/// Iterator yielding fixed-size chunks from a reader
///
/// With a byte budget (`until`), the total yielded never exceeds the budget
/// and the final chunk is truncated to exactly fill it. Without one the
/// source is read until it is exhausted. Iteration stops after the first
/// short or empty read, and after the first I/O error.
pub struct ChunkReader<R: Read> {
    reader: R,
    chunk_size: usize,
    until: Option<u64>,
    consumed: u64,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    /// Read `reader` in chunks of `chunk_size` bytes until it is exhausted
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            until: None,
            consumed: 0,
            done: false,
        }
    }

    /// Read at most `until` bytes in chunks of `chunk_size` bytes
    pub fn with_limit(reader: R, chunk_size: usize, until: u64) -> Self {
        Self {
            until: Some(until),
            ..Self::new(reader, chunk_size)
        }
    }

    /// Total bytes yielded so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Recover the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn next_request(&self) -> u64 {
        let chunk = self.chunk_size as u64;
        match self.until {
            Some(until) => chunk.min(until.saturating_sub(self.consumed)),
            None => chunk,
        }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let request = self.next_request();
        if request == 0 {
            self.done = true;
            return None;
        }

        let mut chunk = Vec::with_capacity(request as usize);
        if let Err(e) = self.reader.by_ref().take(request).read_to_end(&mut chunk) {
            self.done = true;
            return Some(Err(e));
        }

        if chunk.is_empty() {
            self.done = true;
            return None;
        }
        if (chunk.len() as u64) < request {
            self.done = true;
        }

        self.consumed += chunk.len() as u64;
        Some(Ok(chunk))
    }
}

/// Copy exactly `len` bytes from `reader` to `writer` in chunks
///
/// Fails with [`ErrorKind::UnexpectedEof`] if the reader runs dry first.
pub fn copy_chunked<R: Read, W: Write>(
    reader: R,
    writer: &mut W,
    len: u64,
    chunk_size: usize,
) -> io::Result<u64> {
    let mut chunks = ChunkReader::with_limit(reader, chunk_size, len);
    let mut count = 0usize;
    for chunk in chunks.by_ref() {
        writer.write_all(&chunk?)?;
        count += 1;
    }

    let copied = chunks.consumed();
    debug!("Copied {} bytes in {} chunks", copied, count);

    if copied < len {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("source ended after {copied} of {len} bytes"),
        ));
    }
    Ok(copied)
}
