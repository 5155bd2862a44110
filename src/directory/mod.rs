//! Lookups against the catalog store and manager registry.
//!
//! The round engine consults these only when opening a round (and, for
//! unlocked rounds, when authorizing an editor). Both are owned by the admin
//! side of the platform and are read-only from the engine's point of view.

use crate::domain::{MarketId, ProfileId, RoundItem};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;
pub mod sqlite;

pub use mock::MockDirectory;
pub use sqlite::SqliteDirectory;

/// Markets and their per-market product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync + fmt::Debug {
    /// True when the market exists and is active.
    async fn market_exists(&self, market_id: MarketId) -> Result<bool, DirectoryError>;

    /// Active (product, unit) rows for a market, in a stable order.
    async fn active_catalog_entries(
        &self,
        market_id: MarketId,
    ) -> Result<Vec<RoundItem>, DirectoryError>;
}

/// Manager assignments per market.
#[async_trait]
pub trait ManagerRegistry: Send + Sync + fmt::Debug {
    /// Active managers, in assignment order. The first one is the one a new
    /// round locks in.
    async fn active_managers(&self, market_id: MarketId) -> Result<Vec<ProfileId>, DirectoryError>;

    async fn is_active_manager(
        &self,
        market_id: MarketId,
        profile_id: ProfileId,
    ) -> Result<bool, DirectoryError>;
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}
