//! Tracks progress through an AS-REQ / KRB-ERROR / AS-REQ / AS-REP
//! pre-authentication exchange within one dump and captures the values the
//! cracking line needs.
//!
//! Transitions on the declared message kind:
//!
//! | state      | AS-REQ                    | KRB-ERROR          | AS-REP            |
//! |------------|---------------------------|--------------------|-------------------|
//! | `None`     | `AsReq`                   | anomaly            | ignored           |
//! | `AsReq`    | `AsReq2` + timestamp      | `KrbError`         | ignored           |
//! | `KrbError` | `AsReq2` + timestamp      | anomaly            | ignored           |
//! | `AsReq2`   | `AsReq2` + timestamp      | anomaly            | emit line         |
//!
//! Every KRB-ERROR is scanned for salt, realm and client name regardless of
//! the transition taken.
use log::{debug, info, warn};

use crate::hash::{KrbHash, ServerMode};
use crate::pdml::{Field, Message, MessageKind};

pub const ENC_TIMESTAMP_FIELD: &str = "kerberos.PA_ENC_TIMESTAMP.encrypted";
pub const SALT_FIELD: &str = "kerberos.etype_info2.salt";
pub const REALM_FIELD: &str = "kerberos.realm";
pub const CNAME_FIELD: &str = "kerberos.cname";

/// tshark renders the client name as `Client Name (Principal): <name>`; the
/// username starts right after this fixed-width label.
pub const CNAME_PREFIX_LEN: usize = 25;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    #[default]
    None,
    AsReq,
    AsReq2,
    KrbError,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("AS-REP completes an exchange but no {0} was captured")]
    Missing(&'static str),
    #[error("salt is not valid hex: {0:?}")]
    SaltHex(String),
    #[error("cname display text lacks the 25-character label: {0:?}")]
    CnameDisplay(String),
}

/// Values collected while scanning one dump.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    pub encrypted_timestamp: Option<String>,
    pub salt: Option<String>,
    pub realm: Option<String>,
    pub user: Option<String>,
    pub mode: Option<ServerMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Ignored,
    Advanced(ExchangeState),
    OutOfSequence(ExchangeState),
    Complete(KrbHash),
}

/// Strip the fixed-width label from a cname `showname`.
pub fn username_from_cname(showname: &str) -> Result<&str, ExchangeError> {
    match (
        showname.get(..CNAME_PREFIX_LEN),
        showname.get(CNAME_PREFIX_LEN..),
    ) {
        (Some(label), Some(user)) if label.ends_with(": ") => Ok(user),
        _ => Err(ExchangeError::CnameDisplay(showname.to_string())),
    }
}

#[derive(Debug, Default)]
pub struct Tracker {
    state: ExchangeState,
    captured: Captured,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn captured(&self) -> &Captured {
        &self.captured
    }

    pub fn observe_message(&mut self, msg: Message<'_, '_>) -> Result<Step, ExchangeError> {
        self.observe(msg.kind(), msg.fields())
    }

    /// Feed one message. `Err` means an AS-REP arrived in the right state
    /// but the captures cannot form a line; the captures are dropped either way.
    pub fn observe<'f, I>(&mut self, kind: MessageKind, fields: I) -> Result<Step, ExchangeError>
    where
        I: IntoIterator<Item = Field<'f>>,
    {
        match kind {
            MessageKind::AsReq => {
                if self.state == ExchangeState::None {
                    self.state = ExchangeState::AsReq;
                } else {
                    self.state = ExchangeState::AsReq2;
                    self.capture_timestamp(fields);
                }
                Ok(Step::Advanced(self.state))
            }
            MessageKind::KrbError => {
                let step = if self.state == ExchangeState::AsReq {
                    self.state = ExchangeState::KrbError;
                    Step::Advanced(self.state)
                } else {
                    info!("KRB-ERROR out of sequence (state {:?})", self.state);
                    Step::OutOfSequence(self.state)
                };
                self.capture_error_fields(fields);
                Ok(step)
            }
            MessageKind::AsRep if self.state == ExchangeState::AsReq2 => {
                self.complete().map(Step::Complete)
            }
            MessageKind::AsRep => {
                debug!("AS-REP without a pre-authenticated request (state {:?})", self.state);
                Ok(Step::Ignored)
            }
            MessageKind::Other => Ok(Step::Ignored),
        }
    }

    fn capture_timestamp<'f>(&mut self, fields: impl IntoIterator<Item = Field<'f>>) {
        for f in fields {
            if f.name == Some(ENC_TIMESTAMP_FIELD) {
                if let Some(v) = f.value {
                    self.captured.encrypted_timestamp = Some(v.to_string());
                }
            }
        }
    }

    fn capture_error_fields<'f>(&mut self, fields: impl IntoIterator<Item = Field<'f>>) {
        for f in fields {
            match f.name {
                Some(SALT_FIELD) => {
                    if let Some(v) = f.value {
                        self.captured.salt = Some(v.to_string());
                    }
                    self.captured.mode = Some(ServerMode::Ad);
                }
                Some(REALM_FIELD) => {
                    if let Some(v) = f.show {
                        self.captured.realm = Some(v.to_string());
                    }
                    self.captured.mode = Some(ServerMode::Plain);
                }
                Some(CNAME_FIELD) => match f.showname.map(username_from_cname) {
                    Some(Ok(user)) => self.captured.user = Some(user.to_string()),
                    Some(Err(e)) => warn!("{}", e),
                    None => warn!("{} field without showname", CNAME_FIELD),
                },
                _ => {}
            }
        }
    }

    fn complete(&mut self) -> Result<KrbHash, ExchangeError> {
        let captured = std::mem::take(&mut self.captured);
        let timestamp = captured
            .encrypted_timestamp
            .ok_or(ExchangeError::Missing("encrypted timestamp"))?;
        match captured
            .mode
            .ok_or(ExchangeError::Missing("salt or realm"))?
        {
            ServerMode::Ad => {
                let salt_hex = captured.salt.ok_or(ExchangeError::Missing("salt"))?;
                let salt = hex::decode(&salt_hex).map_err(|_| ExchangeError::SaltHex(salt_hex))?;
                Ok(KrbHash::Ad { salt, timestamp })
            }
            ServerMode::Plain => Ok(KrbHash::Plain {
                user: captured.user.ok_or(ExchangeError::Missing("username"))?,
                realm: captured.realm.ok_or(ExchangeError::Missing("realm"))?,
                timestamp,
            }),
        }
    }
}
