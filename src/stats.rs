//! Counters collected while scanning dumps.
use std::ops::AddAssign;

use crate::pdml::MessageKind;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub files_failed: usize,
    pub messages: usize,
    pub as_req: usize,
    pub krb_error: usize,
    pub as_rep: usize,
    pub exchanges: usize,
    pub out_of_sequence: usize,
    pub exchange_errors: usize,
}

impl ExtractStats {
    pub fn count_message(&mut self, kind: MessageKind) {
        self.messages += 1;
        match kind {
            MessageKind::AsReq => self.as_req += 1,
            MessageKind::KrbError => self.krb_error += 1,
            MessageKind::AsRep => self.as_rep += 1,
            MessageKind::Other => {}
        }
    }
}

impl AddAssign<&ExtractStats> for ExtractStats {
    fn add_assign(&mut self, rhs: &ExtractStats) {
        self.files += rhs.files;
        self.files_failed += rhs.files_failed;
        self.messages += rhs.messages;
        self.as_req += rhs.as_req;
        self.krb_error += rhs.krb_error;
        self.as_rep += rhs.as_rep;
        self.exchanges += rhs.exchanges;
        self.out_of_sequence += rhs.out_of_sequence;
        self.exchange_errors += rhs.exchange_errors;
    }
}
