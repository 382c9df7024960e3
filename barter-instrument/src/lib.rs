//! Shared vocabulary for binary YES/NO prediction market instruments.
//!
//! A binary market has two legs, [`Outcome::Yes`] and [`Outcome::No`], that
//! together pay out exactly 1.00 at settlement. Orders against either leg are
//! placed on a [`Side`].

pub mod outcome;
pub mod side;

pub use outcome::Outcome;
pub use side::Side;
