//! Deterministic zip writing and archive merging
//!
//! Output archives must be byte-for-byte reproducible, so every entry is
//! written with fixed metadata: modification time 2001-01-01 00:00:00, unix
//! mode 0644, deflate compression. Nothing about the machine or the clock
//! leaks into the archive.
//!
//! Writers enforce one duplicate policy: a repeated destination path whose
//! content matches what was already written (CRC32 and size) is silently
//! skipped, a repeated path with different content is an error.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::filter::PathTransform;

/// Fixed entry timestamp, safely past the zip format's 1980 epoch.
fn hermetic_timestamp() -> DateTime {
    DateTime::from_date_and_time(2001, 1, 1, 0, 0, 0).unwrap_or_default()
}

fn hermetic_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(hermetic_timestamp())
        .unix_permissions(0o644)
}

/// Zip writer wrapper applying the deterministic metadata and the
/// duplicate entry policy to everything written through it.
pub struct ZipOut<W: Write + Seek> {
    writer: ZipWriter<W>,
    entries: BTreeMap<String, (u32, u64)>,
}

impl<W: Write + Seek> ZipOut<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: ZipWriter::new(inner),
            entries: BTreeMap::new(),
        }
    }

    /// Write one entry from an in-memory buffer.
    pub fn add_bytes(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        let digest = (crc32fast::hash(contents), contents.len() as u64);
        if let Some(existing) = self.entries.get(name) {
            if *existing == digest {
                debug!("skipping duplicate entry {}", name);
                return Ok(());
            }
            return Err(Error::DuplicateEntry(name.to_string()));
        }
        self.writer.start_file(name, hermetic_options())?;
        self.writer.write_all(contents)?;
        self.entries.insert(name.to_string(), digest);
        Ok(())
    }

    /// Write one entry from a file on disk.
    pub fn add_file(&mut self, name: &str, path: &Path) -> Result<()> {
        let contents = std::fs::read(path)?;
        self.add_bytes(name, &contents)
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalize the central directory and return the inner writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.writer.finish()?)
    }
}

/// Copy every file entry of `input` into `out`, naming each through
/// `dest_path`. Returning `None` drops the entry. Directory entries are
/// never copied.
pub fn copy_zip_entries<W, F>(out: &mut ZipOut<W>, input: &Path, mut dest_path: F) -> Result<()>
where
    W: Write + Seek,
    F: FnMut(&str) -> Option<String>,
{
    let file = File::open(input)?;
    let mut archive = ZipArchive::new(file)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(dest) = dest_path(entry.name()) else {
            debug!("dropping {} from {}", entry.name(), input.display());
            continue;
        };
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        out.add_bytes(&dest, &contents)?;
    }
    Ok(())
}

/// Merge the entries of several archives into one fresh archive written to
/// `destination`, filtering entry paths through `transform`.
pub fn merge_zips<W, P>(destination: W, inputs: &[P], transform: &PathTransform) -> Result<W>
where
    W: Write + Seek,
    P: AsRef<Path>,
{
    let mut out = ZipOut::new(destination);
    for input in inputs {
        copy_zip_entries(&mut out, input.as_ref(), |name| transform.apply(name))?;
    }
    debug!("merged {} entries from {} archives", out.len(), inputs.len());
    out.finish()
}
