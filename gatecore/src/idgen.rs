use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

/// A hex id which implements a Display of zero-padded hexadecimal
/// digits, such that the lexical order of the rendered ids follows the
/// order they were issued in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexId {
    id: i64,
}

impl From<i64> for HexId {
    fn from(id: i64) -> Self {
        Self { id }
    }
}

impl Display for HexId {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{:08x}", self.id)
    }
}

/// Issues sequential ids with a fixed prefix.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeqIdGen {
    prefix: String,
    last: i64,
}

impl SeqIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last: 0,
        }
    }

    pub fn next(&mut self) -> String {
        self.last += 1;
        format!("{}{}", self.prefix, HexId::from(self.last))
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    /// Resume issuing after `last`, e.g. when restoring persisted state.
    pub fn resume(&mut self, last: i64) {
        self.last = self.last.max(last);
    }
}
