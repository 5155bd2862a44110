//! Current-value price rows and their append-only audit trail.

use crate::domain::{
    BusinessDate, HistoryEntryId, MarketId, NoteType, Price, PriceEntryId, ProductId, ProfileId,
    UnitId,
};
use chrono::{DateTime, Utc};

/// The current price for a (market, product, date) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEntry {
    pub id: PriceEntryId,
    pub market_id: MarketId,
    pub product_id: ProductId,
    pub for_date: BusinessDate,
    pub unit_id: UnitId,
    pub price: Price,
    pub note_type: Option<NoteType>,
    pub notes: Option<String>,
    pub last_editor_id: ProfileId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One immutable change record for a [`PriceEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryEntry {
    pub id: HistoryEntryId,
    pub price_entry_id: PriceEntryId,
    /// Absent on the first write for the key.
    pub before_price: Option<Price>,
    pub after_price: Price,
    pub editor_id: ProfileId,
    pub note_type: Option<NoteType>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Everything needed to write one submission into the ledger.
#[derive(Debug, Clone)]
pub struct PriceWrite {
    pub market_id: MarketId,
    pub product_id: ProductId,
    pub for_date: BusinessDate,
    pub unit_id: UnitId,
    pub price: Price,
    pub note_type: Option<NoteType>,
    pub notes: Option<String>,
    pub editor_id: ProfileId,
    pub at: DateTime<Utc>,
}

/// Outcome of a ledger upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceWriteOutcome {
    pub entry_id: PriceEntryId,
    pub history_id: HistoryEntryId,
    pub before_price: Option<Price>,
}
