/// Deribit public REST client implementing [`OptionChainSource`](crate::OptionChainSource).
pub mod deribit;

/// Kalshi public REST client implementing [`MarketCatalog`](crate::MarketCatalog).
pub mod kalshi;
