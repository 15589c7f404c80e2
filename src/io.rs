use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;
use roxmltree::{Document, ParsingOptions};

/// Threshold in bytes above which we attempt to use mmap for reading.
/// PDML dumps of a busy capture easily reach hundreds of MiB.
pub const DEFAULT_MMAP_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024; // 16 MiB

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("dump is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("dump is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Raw bytes of a dump file, either mapped or read into memory.
pub enum DumpBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for DumpBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            DumpBytes::Mapped(m) => m,
            DumpBytes::Owned(v) => v,
        }
    }
}

/// Decide whether to use mmap based on file size and threshold.
pub fn should_use_mmap(file_size_bytes: u64, threshold_bytes: u64) -> bool {
    file_size_bytes >= threshold_bytes
}

pub fn read_dump_owned<P: AsRef<Path>>(path: P) -> Result<DumpBytes> {
    let bytes =
        std::fs::read(&path).with_context(|| format!("read {}", path.as_ref().display()))?;
    Ok(DumpBytes::Owned(bytes))
}

pub fn read_dump_mmap<P: AsRef<Path>>(path: P) -> Result<DumpBytes> {
    let file = File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
    let mmap =
        unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.as_ref().display()))?;
    Ok(DumpBytes::Mapped(mmap))
}

/// Choose mmap or a plain read depending on the file size.
pub fn read_dump_auto<P: AsRef<Path>>(path: P, threshold_bytes: u64) -> Result<DumpBytes> {
    let meta =
        std::fs::metadata(&path).with_context(|| format!("stat {}", path.as_ref().display()))?;
    if meta.is_file() && should_use_mmap(meta.len(), threshold_bytes) {
        read_dump_mmap(path)
    } else {
        read_dump_owned(path)
    }
}

pub fn dump_text(bytes: &[u8]) -> Result<&str, LoadError> {
    Ok(std::str::from_utf8(bytes)?)
}

/// Parse dump text into a tree. tshark may prepend a DTD, so DTDs are allowed.
pub fn parse_dump(text: &str) -> Result<Document<'_>, LoadError> {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, opts)?)
}
