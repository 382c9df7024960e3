//! External data contracts for the prediction strategy core.
//!
//! Two feeds are consumed each cycle:
//!
//! - An [`OptionChainSource`] supplying the reference options venue's instrument list and
//!   per-instrument implied volatility (see [`exchange::deribit`]).
//! - A [`MarketCatalog`] supplying the prediction venue's market listings and top-of-book
//!   (see [`exchange::kalshi`]).
//!
//! Both are traits so the hosting engine (or a test) can substitute its own implementation.

/// Top-of-book types for binary YES/NO markets.
pub mod books;

/// Prediction venue market listing contract.
pub mod catalog;

/// Errors produced by feed implementations.
pub mod error;

/// Venue specific REST clients.
pub mod exchange;

/// Option chain contract for the reference volatility venue.
pub mod options;

pub use books::{Level, OutcomeBooks, TopOfBook};
pub use catalog::{MarketCatalog, MarketListing};
pub use error::FeedError;
pub use options::{OptionChain, OptionChainSource, OptionInstrument, OptionKind, OptionTicker};
