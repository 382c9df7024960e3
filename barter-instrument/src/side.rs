use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[display("BUY")]
    Buy,
    #[display("SELL")]
    Sell,
}
