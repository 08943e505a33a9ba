//! Pack Demo
//!
//! Creates `pack.dat` in the current directory with two small entries if it
//! does not exist yet, otherwise opens it and lists its contents.
//!
//! Run with: cargo run --example pack_demo

use sfpack::PackFile;
use std::error::Error;
use std::io::Read;
use std::path::Path;

const PACK_PATH: &str = "pack.dat";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("sfpack=debug")
        .init();

    let mut pack = PackFile::new();

    if !Path::new(PACK_PATH).exists() {
        println!("Creating {PACK_PATH}...");
        pack.create(PACK_PATH)?;
        pack.add_entry(b"hello", "a.txt")?;
        pack.add_entry(b"world!", "b.txt")?;
        pack.close();
        println!("Wrote 2 entries. Run again to list them.");
        return Ok(());
    }

    pack.open(PACK_PATH)?;
    println!("{} entries in {PACK_PATH}:\n", pack.entry_count()?);

    let names: Vec<Vec<u8>> = pack
        .list_entries()?
        .into_iter()
        .map(<[u8]>::to_vec)
        .collect();

    for name in names {
        let mut content = Vec::new();
        pack.get_entry_stream(&name)?.read_to_end(&mut content)?;
        println!(
            "  {:<20} {:>8} bytes  {}",
            String::from_utf8_lossy(&name),
            content.len(),
            String::from_utf8_lossy(&content)
        );
    }

    pack.close();
    Ok(())
}
