//! Calendar day in the business timezone.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar day (`YYYY-MM-DD`) expressed in the fixed business timezone.
///
/// Rounds and price entries are keyed by this value, never by an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessDate(pub NaiveDate);

impl BusinessDate {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    pub fn new(date: NaiveDate) -> Self {
        BusinessDate(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(BusinessDate)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day.
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(BusinessDate)
    }

    /// The next calendar day.
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(BusinessDate)
    }

    /// Canonical storage representation.
    pub fn to_key(&self) -> String {
        self.0.format(Self::FORMAT).to_string()
    }
}

impl fmt::Display for BusinessDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

impl FromStr for BusinessDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT).map(BusinessDate)
    }
}
