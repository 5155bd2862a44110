use crate::directory::DirectoryError;
use crate::domain::{BusinessDate, MarketId, ProductId, ProfileId, RoundId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule violations and infrastructure failures raised by the round
/// engine. Rule violations are never retried; they go back to the caller.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("market {0} has no active manager")]
    NoManager(MarketId),
    #[error("market {0} has no active catalog entries")]
    EmptyCatalog(MarketId),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("price must be a positive number, got {0}")]
    InvalidPrice(Decimal),
    #[error("round {0} is closed")]
    RoundClosed(RoundId),
    #[error("round is for {round_date} but today is {today}")]
    OutsideWindow {
        round_date: BusinessDate,
        today: BusinessDate,
    },
    #[error("product {product_id} is not part of round {round_id}")]
    ProductNotInRound {
        round_id: RoundId,
        product_id: ProductId,
    },
    #[error("round is locked to manager {locked}; {editor} may not submit")]
    NotLockedManager { locked: ProfileId, editor: ProfileId },
    #[error("an open round already exists for market {market_id} on {for_date}")]
    DuplicateDate {
        market_id: MarketId,
        for_date: BusinessDate,
    },
    #[error("price data already recorded for market {market_id} on {for_date}")]
    DataExists {
        market_id: MarketId,
        for_date: BusinessDate,
    },
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RoundError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        RoundError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RoundError::NotFound { .. } => "not_found",
            RoundError::NoManager(_) => "no_manager",
            RoundError::EmptyCatalog(_) => "empty_catalog",
            RoundError::Unauthorized(_) => "unauthorized",
            RoundError::InvalidPrice(_) => "invalid_price",
            RoundError::RoundClosed(_) => "round_closed",
            RoundError::OutsideWindow { .. } => "outside_window",
            RoundError::ProductNotInRound { .. } => "product_not_in_round",
            RoundError::NotLockedManager { .. } => "not_locked_manager",
            RoundError::DuplicateDate { .. } => "duplicate_date",
            RoundError::DataExists { .. } => "data_exists",
            RoundError::Directory(_) | RoundError::Storage(_) => "internal",
        }
    }
}

pub type RoundResult<T> = Result<T, RoundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(RoundError::NoManager(MarketId::new()).kind(), "no_manager");
        assert_eq!(
            RoundError::InvalidPrice(Decimal::ZERO).kind(),
            "invalid_price"
        );
        assert_eq!(RoundError::not_found("round", "x").kind(), "not_found");
    }

    #[test]
    fn test_outside_window_message_names_both_days() {
        let err = RoundError::OutsideWindow {
            round_date: BusinessDate::from_ymd(2026, 10, 18).unwrap(),
            today: BusinessDate::from_ymd(2026, 10, 19).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "round is for 2026-10-18 but today is 2026-10-19"
        );
    }
}
