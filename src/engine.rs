//! Engine: drives loading, scanning, exchange tracking and line emission for
//! each dump, streaming `$krb5ng$` lines to a writer as they are produced.
//!
//! Every dump gets a fresh [`Tracker`], so exchange state never crosses file
//! boundaries. Counters and emitted hashes accumulate on the engine for the
//! summary and exports.
//!
//! ```no_run
//! use krbng2john::engine::Engine;
//! # fn main() -> anyhow::Result<()> {
//! let mut engine = Engine::new();
//! let stdout = std::io::stdout();
//! engine.process_path("/path/to/capture.pdml", &mut stdout.lock())?;
//! # Ok(())
//! # }
//! ```
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info, warn};
use roxmltree::Document;

use crate::exchange::{Step, Tracker};
use crate::hash::KrbHash;
use crate::io::{DEFAULT_MMAP_THRESHOLD_BYTES, dump_text, parse_dump, read_dump_auto};
use crate::pdml::{is_pdml, kerberos_messages};
use crate::stats::ExtractStats;

/// A line emitted from a given dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedHash {
    pub source: String,
    pub hash: KrbHash,
}

#[derive(Debug)]
pub struct Engine {
    pub hashes: Vec<CapturedHash>,
    pub stats: ExtractStats,
    mmap_threshold_bytes: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_mmap_threshold(DEFAULT_MMAP_THRESHOLD_BYTES)
    }

    pub fn with_mmap_threshold(mmap_threshold_bytes: u64) -> Self {
        Self {
            hashes: Vec::new(),
            stats: ExtractStats::default(),
            mmap_threshold_bytes,
        }
    }

    /// Process one dump file. Load and parse failures fail this file only;
    /// they are counted and returned to the caller.
    pub fn process_path<P: AsRef<Path>, W: Write>(
        &mut self,
        path: P,
        out: &mut W,
    ) -> Result<ExtractStats> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let res = read_dump_auto(path, self.mmap_threshold_bytes).and_then(|bytes| {
            let text = dump_text(&bytes).with_context(|| format!("load {}", source))?;
            self.process_str(&source, text, out)
        });
        if res.is_err() {
            self.stats.files_failed += 1;
        }
        res
    }

    /// Process an in-memory dump. `source` labels the dump in logs and exports.
    pub fn process_str<W: Write>(
        &mut self,
        source: &str,
        contents: &str,
        out: &mut W,
    ) -> Result<ExtractStats> {
        let doc = parse_dump(contents).with_context(|| format!("parse {}", source))?;
        let file_stats = self.scan_document(source, &doc, out)?;
        self.stats += &file_stats;
        Ok(file_stats)
    }

    fn scan_document<W: Write>(
        &mut self,
        source: &str,
        doc: &Document<'_>,
        out: &mut W,
    ) -> Result<ExtractStats> {
        if !is_pdml(doc) {
            warn!(
                "{}: root element is <{}>, not <pdml>; nothing to scan",
                source,
                doc.root_element().tag_name().name()
            );
        }
        let mut stats = ExtractStats {
            files: 1,
            ..ExtractStats::default()
        };
        let mut tracker = Tracker::new();
        for msg in kerberos_messages(doc) {
            stats.count_message(msg.kind());
            match tracker.observe_message(msg) {
                Ok(Step::Complete(hash)) => {
                    hash.write_line(out)
                        .with_context(|| format!("write hash from {}", source))?;
                    stats.exchanges += 1;
                    self.hashes.push(CapturedHash {
                        source: source.to_string(),
                        hash,
                    });
                }
                Ok(Step::OutOfSequence(_)) => stats.out_of_sequence += 1,
                Ok(_) => {}
                Err(e) => {
                    error!("{}: exchange dropped: {}", source, e);
                    stats.exchange_errors += 1;
                }
            }
        }
        out.flush()?;
        info!(
            "{}: {} kerberos messages, {} exchanges",
            source, stats.messages, stats.exchanges
        );
        Ok(stats)
    }
}
