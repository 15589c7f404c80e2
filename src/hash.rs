//! `$krb5ng$` line rendering for John the Ripper.
//!
//! Two layouts exist, keyed on how the KDC told the client to derive its key:
//!
//! - AD (`$krb5ng$1$`): `<salt>:$krb5ng$1$<salt>$<ts[..88]>$<ts[88..]> `
//! - plain (`$krb5ng$0$`): `<user>:$krb5ng$0$<user>$<realm>$<ts[..88]>$<ts[88..]> `
//!
//! The AD salt is written as the raw bytes its hex text decodes to, so lines
//! are produced as bytes rather than `String`.
use std::io::{self, Write};

/// Character index at which the encrypted timestamp is split.
pub const TIMESTAMP_SPLIT: usize = 88;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Ad,
    Plain,
}

impl ServerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerMode::Ad => "AD",
            ServerMode::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KrbHash {
    Ad {
        salt: Vec<u8>,
        timestamp: String,
    },
    Plain {
        user: String,
        realm: String,
        timestamp: String,
    },
}

/// Split at character [`TIMESTAMP_SPLIT`]; shorter input leaves the tail empty.
pub fn split_timestamp(timestamp: &str) -> (&str, &str) {
    let at = timestamp
        .char_indices()
        .nth(TIMESTAMP_SPLIT)
        .map(|(i, _)| i)
        .unwrap_or(timestamp.len());
    timestamp.split_at(at)
}

impl KrbHash {
    pub fn mode(&self) -> ServerMode {
        match self {
            KrbHash::Ad { .. } => ServerMode::Ad,
            KrbHash::Plain { .. } => ServerMode::Plain,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            KrbHash::Ad { timestamp, .. } | KrbHash::Plain { timestamp, .. } => timestamp,
        }
    }

    pub fn write_line<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let (head, tail) = split_timestamp(self.timestamp());
        match self {
            KrbHash::Ad { salt, .. } => {
                out.write_all(salt)?;
                out.write_all(b":$krb5ng$1$")?;
                out.write_all(salt)?;
                writeln!(out, "${}${} ", head, tail)
            }
            KrbHash::Plain { user, realm, .. } => {
                writeln!(out, "{user}:$krb5ng$0${user}${realm}${head}${tail} ")
            }
        }
    }

    pub fn to_line(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_line(&mut buf);
        buf
    }
}
