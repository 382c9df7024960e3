//! Coercion of the loosely-typed bot parameter map into typed values.
//!
//! Hosts send numbers either as JSON numbers or as numeric strings. Missing,
//! `null` and empty-string values fall back to the caller's default, while a
//! value that is present but unparseable is a [`ConfigError`].

use crate::context::Params;
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// All errors generated while parsing strategy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required parameter: {key}")]
    Missing { key: &'static str },

    #[error("parameter {key} is not a valid number: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("parameter {key} is not a valid boolean: {value}")]
    InvalidBool { key: &'static str, value: String },

    #[error("invalid market pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid settlement date: {value}")]
    InvalidDate { value: String },
}

/// Typed, defaulting view over a [`Params`] map.
#[derive(Debug, Clone, Copy)]
pub struct ParamReader<'a> {
    params: &'a Params,
}

impl<'a> ParamReader<'a> {
    pub fn new(params: &'a Params) -> Self {
        Self { params }
    }

    fn value(&self, key: &str) -> Option<&'a Value> {
        match self.params.get(key)? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            value => Some(value),
        }
    }

    pub fn decimal(&self, key: &'static str, default: Decimal) -> Result<Decimal, ConfigError> {
        let Some(value) = self.value(key) else {
            return Ok(default);
        };

        let parsed = match value {
            Value::Number(number) => parse_decimal(&number.to_string())
                .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
            Value::String(text) => parse_decimal(text.trim()),
            _ => None,
        };

        parsed.ok_or_else(|| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
    }

    pub fn f64(&self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        let Some(value) = self.value(key) else {
            return Ok(default);
        };

        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };

        parsed
            .filter(|number| number.is_finite())
            .ok_or_else(|| ConfigError::InvalidNumber {
                key,
                value: value.to_string(),
            })
    }

    /// Non-negative whole number. Fractional input is truncated.
    pub fn u64(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        if self.value(key).is_none() {
            return Ok(default);
        }

        let decimal = self.decimal(key, Decimal::ZERO)?;
        decimal
            .trunc()
            .to_u64()
            .ok_or_else(|| ConfigError::InvalidNumber {
                key,
                value: decimal.to_string(),
            })
    }

    pub fn bool(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.value(key) else {
            return Ok(default);
        };

        let parsed = match value {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => number.as_f64().map(|number| number != 0.0),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        };

        parsed.ok_or_else(|| ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        })
    }

    pub fn string(&self, key: &'static str) -> Option<String> {
        match self.value(key)? {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// List of strings from either a JSON array or a comma-separated string.
    pub fn string_list(&self, key: &'static str) -> Vec<String> {
        match self.value(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|value| match value {
                    Value::String(text) => Some(text.trim().to_string()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                })
                .filter(|text| !text.is_empty())
                .collect(),
            Some(Value::String(text)) => text
                .split(',')
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}
