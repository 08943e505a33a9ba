//! Sequential pack container for named byte blobs
//!
#![allow(clippy::cast_possible_truncation)] // Lengths are bounded by the 32-bit format fields
#![allow(clippy::cast_possible_wrap)] // Intentional for binary format fields
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
//! A pack concatenates named payloads into a single file. Each entry is
//! preceded by a small header, and a global header at the start of the file
//! records how many entries have been fully written. Packs are created by
//! appending entries one at a time and are read by indexing every entry once
//! at open time, after which any payload can be streamed or extracted without
//! touching the others.
//!
//! # File Layout
//!
//! ```text
//! +--------------------+  16 bytes: "SFPv", version, entry_count, reserved
//! | global header      |
//! +--------------------+  16 bytes: "SFPv", name_length, reserved, payload_length
//! | entry header       |
//! | name               |
//! | payload            |
//! +--------------------+
//! | entry header ...   |
//! ```
//!
//! All integers are little-endian signed 32-bit values. The entry count is
//! patched after every append, so a pack stays readable even if the writer
//! stops before closing it.
//!
//! # Usage
//!
//! [`PackFile`] is a single handle that switches between writing and reading.
//! [`PackWriter`] and [`PackReader`] expose the same operations as separately
//! owned values for callers that only need one direction.
//!
//! ```rust,no_run
//! use sfpack::PackFile;
//! use std::io::Read;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pack = PackFile::new();
//! pack.create("pack.dat")?;
//! pack.add_entry(b"hello", "a.txt")?;
//! pack.add_entry_from_path("test2.txt", "t2")?;
//! pack.close();
//!
//! pack.open("pack.dat")?;
//! for name in pack.list_entries()? {
//!     println!("{}", String::from_utf8_lossy(name));
//! }
//! let mut text = String::new();
//! pack.get_entry_stream("a.txt")?.read_to_string(&mut text)?;
//! pack.extract_entry("t2", "t2.out")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod chunked;
pub mod config;
pub mod entry;
pub mod error;
pub mod header;
pub mod pack;
pub mod reader;
pub mod stream;
pub mod writer;

pub use chunked::{ChunkReader, copy_chunked};
pub use config::PackConfig;
pub use entry::PackEntry;
pub use error::{PackError, PackResult};
pub use pack::{PackFile, PackMode};
pub use reader::PackReader;
pub use stream::EntryStream;
pub use writer::PackWriter;

/// Version information for the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
