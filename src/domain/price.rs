//! Lossless, strictly positive price backed by rust_decimal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A submitted commodity price.
///
/// Only positive values can be constructed. Serializes to a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must be a positive number, got {0}")]
    NotPositive(Decimal),
    #[error("invalid price literal: {0}")]
    Parse(String),
}

impl Price {
    /// Validate a raw decimal as a price.
    pub fn new(value: Decimal) -> Result<Self, PriceError> {
        if value > Decimal::ZERO {
            Ok(Price(value))
        } else {
            Err(PriceError::NotPositive(value))
        }
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Format without trailing zeros or exponent notation.
    pub fn to_canonical_string(&self) -> String {
        self.0.normalize().to_string()
    }

    /// Parse the canonical storage form written by [`Price::to_canonical_string`].
    pub fn from_canonical_str(s: &str) -> Result<Self, PriceError> {
        let value = Decimal::from_str(s.trim()).map_err(|e| PriceError::Parse(e.to_string()))?;
        Price::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_canonical_str(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Price::new(value).map_err(serde::de::Error::custom)
    }
}

/// Why a price moved, as classified by the submitting manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Up,
    Down,
    Other,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Up => "up",
            NoteType::Down => "down",
            NoteType::Other => "other",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(NoteType::Up),
            "down" => Ok(NoteType::Down),
            "other" => Ok(NoteType::Other),
            other => Err(format!("unknown note type: {}", other)),
        }
    }
}
