//! Domain types for the market price round service.
//!
//! This module provides:
//! - Strongly typed UUID identifiers per entity
//! - The business calendar day used to key rounds and prices
//! - Lossless, strictly positive `Price`
//! - Catalog/registry records, the `PriceRound` aggregate and ledger rows

pub mod catalog;
pub mod date;
pub mod ids;
pub mod ledger;
pub mod price;
pub mod round;

pub use catalog::{ManagerAssignment, Market, MarketCatalogEntry, Product, Unit};
pub use date::BusinessDate;
pub use ids::{HistoryEntryId, MarketId, PriceEntryId, ProductId, ProfileId, RoundId, UnitId};
pub use ledger::{PriceEntry, PriceHistoryEntry, PriceWrite, PriceWriteOutcome};
pub use price::{NoteType, Price, PriceError};
pub use round::{Actor, ManagerLock, PriceRound, Role, RoundItem, RoundStatus};
