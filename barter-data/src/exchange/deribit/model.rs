//! Deribit public API v2 response models.

use crate::options::{OptionInstrument, OptionKind, OptionTicker};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// JSON-RPC envelope wrapping every Deribit response.
///
/// ### Raw Payload
/// ```json
/// { "jsonrpc": "2.0", "result": [ ... ], "usIn": 1, "usOut": 2 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DeribitResponse<T> {
    pub result: Option<T>,
    pub error: Option<DeribitError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeribitError {
    pub code: i64,
    pub message: String,
}

/// Entry from `public/get_instruments`.
///
/// ### Raw Payload
/// ```json
/// {
///   "instrument_name": "BTC-27DEC24-100000-C",
///   "strike": 100000.0,
///   "expiration_timestamp": 1735286400000,
///   "option_type": "call",
///   "is_active": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeribitInstrument {
    pub instrument_name: String,
    #[serde(default)]
    pub strike: Option<f64>,
    pub expiration_timestamp: i64,
    #[serde(default)]
    pub option_type: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl DeribitInstrument {
    /// Convert to a normalised [`OptionInstrument`], `None` for non-options or inactive listings.
    pub fn to_option_instrument(&self) -> Option<OptionInstrument> {
        if !self.is_active {
            return None;
        }

        let kind = match self.option_type.as_deref()? {
            "call" => OptionKind::Call,
            "put" => OptionKind::Put,
            _ => return None,
        };

        Some(OptionInstrument {
            name: SmolStr::new(&self.instrument_name),
            strike: self.strike?,
            expiry: DateTime::from_timestamp_millis(self.expiration_timestamp)?,
            kind,
        })
    }
}

/// Entry from `public/get_book_summary_by_currency` or the result of `public/ticker`.
///
/// ### Raw Payload
/// ```json
/// {
///   "instrument_name": "BTC-27DEC24-100000-C",
///   "mark_iv": 55.21,
///   "bid_iv": 54.8,
///   "ask_iv": 56.1,
///   "underlying_price": 97125.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeribitTicker {
    pub instrument_name: String,
    #[serde(default)]
    pub mark_iv: Option<f64>,
    #[serde(default)]
    pub bid_iv: Option<f64>,
    #[serde(default)]
    pub ask_iv: Option<f64>,
    #[serde(default)]
    pub underlying_price: Option<f64>,
}

impl From<DeribitTicker> for OptionTicker {
    fn from(ticker: DeribitTicker) -> Self {
        Self {
            name: SmolStr::new(ticker.instrument_name),
            mark_iv: ticker.mark_iv,
            bid_iv: ticker.bid_iv.filter(|iv| *iv > 0.0),
            ask_iv: ticker.ask_iv.filter(|iv| *iv > 0.0),
            underlying_price: ticker.underlying_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_instruments_response() {
        let input = r#"{
            "jsonrpc": "2.0",
            "result": [
                {
                    "instrument_name": "BTC-27DEC24-100000-C",
                    "strike": 100000.0,
                    "expiration_timestamp": 1735286400000,
                    "option_type": "call",
                    "kind": "option",
                    "is_active": true
                },
                {
                    "instrument_name": "BTC-PERPETUAL",
                    "expiration_timestamp": 32503708800000,
                    "kind": "future",
                    "is_active": true
                }
            ],
            "usIn": 1, "usOut": 2
        }"#;

        let response: DeribitResponse<Vec<DeribitInstrument>> =
            serde_json::from_str(input).unwrap();
        let instruments: Vec<_> = response
            .result
            .unwrap()
            .iter()
            .filter_map(DeribitInstrument::to_option_instrument)
            .collect();

        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].name.as_str(), "BTC-27DEC24-100000-C");
        assert_eq!(instruments[0].strike, 100000.0);
        assert_eq!(instruments[0].kind, OptionKind::Call);
        assert_eq!(instruments[0].expiry.timestamp_millis(), 1735286400000);
    }

    #[test]
    fn test_de_ticker_zero_bid_iv_is_dropped() {
        let input = r#"{
            "instrument_name": "BTC-27DEC24-100000-P",
            "mark_iv": 61.5,
            "bid_iv": 0.0,
            "ask_iv": 63.0,
            "underlying_price": 97000.0
        }"#;

        let ticker: OptionTicker = serde_json::from_str::<DeribitTicker>(input).unwrap().into();
        assert_eq!(ticker.mark_iv, Some(61.5));
        assert_eq!(ticker.bid_iv, None);
        assert_eq!(ticker.ask_iv, Some(63.0));
    }

    #[test]
    fn test_de_error_response() {
        let input = r#"{"jsonrpc":"2.0","error":{"code":10020,"message":"invalid currency"}}"#;
        let response: DeribitResponse<Vec<DeribitTicker>> = serde_json::from_str(input).unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, 10020);
    }
}
