//! Export helpers for writing captured exchanges to files.
//!
//! - `save_hashes_txt` writes the same `$krb5ng$` lines that went to stdout.
//! - `save_exchanges_csv` writes one row per exchange with the salt as hex.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use csv::Writer;
use serde::Serialize;

use crate::engine::Engine;
use crate::hash::KrbHash;

#[derive(Debug, Serialize)]
struct ExchangeRecord<'a> {
    #[serde(rename = "File")]
    file: &'a str,
    #[serde(rename = "Mode")]
    mode: &'static str,
    #[serde(rename = "User")]
    user: &'a str,
    #[serde(rename = "Realm")]
    realm: &'a str,
    #[serde(rename = "Salt")]
    salt: String,
    #[serde(rename = "Timestamp")]
    timestamp: &'a str,
}

pub fn save_hashes_txt<P: AsRef<Path>>(engine: &Engine, path: P) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    for c in &engine.hashes {
        c.hash.write_line(&mut f)?;
    }
    f.flush()?;
    Ok(())
}

pub fn save_exchanges_csv<P: AsRef<Path>>(engine: &Engine, path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    for c in &engine.hashes {
        let (user, realm, salt) = match &c.hash {
            KrbHash::Ad { salt, .. } => ("", "", hex::encode(salt)),
            KrbHash::Plain { user, realm, .. } => (user.as_str(), realm.as_str(), String::new()),
        };
        wtr.serialize(ExchangeRecord {
            file: &c.source,
            mode: c.hash.mode().as_str(),
            user,
            realm,
            salt,
            timestamp: c.hash.timestamp(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
