use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Outcome leg of a binary prediction market (YES or NO).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    #[display("YES")]
    Yes,
    #[display("NO")]
    No,
}

impl Outcome {
    /// Both legs, YES first.
    pub const ALL: [Outcome; 2] = [Outcome::Yes, Outcome::No];

    /// Get the opposite leg.
    pub fn inverse(&self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Outcome::Yes)
    }
}
