//! Directory backed by the service's own SQLite catalog tables.

use super::{CatalogStore, DirectoryError, ManagerRegistry};
use crate::db::Repository;
use crate::domain::{MarketId, ProfileId, RoundItem};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct SqliteDirectory {
    repo: Arc<Repository>,
}

impl SqliteDirectory {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

impl fmt::Debug for SqliteDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDirectory").finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogStore for SqliteDirectory {
    async fn market_exists(&self, market_id: MarketId) -> Result<bool, DirectoryError> {
        Ok(self.repo.market_exists(market_id).await?)
    }

    async fn active_catalog_entries(
        &self,
        market_id: MarketId,
    ) -> Result<Vec<RoundItem>, DirectoryError> {
        Ok(self.repo.active_catalog_entries(market_id).await?)
    }
}

#[async_trait]
impl ManagerRegistry for SqliteDirectory {
    async fn active_managers(&self, market_id: MarketId) -> Result<Vec<ProfileId>, DirectoryError> {
        Ok(self.repo.active_managers(market_id).await?)
    }

    async fn is_active_manager(
        &self,
        market_id: MarketId,
        profile_id: ProfileId,
    ) -> Result<bool, DirectoryError> {
        Ok(self.repo.is_active_manager(market_id, profile_id).await?)
    }
}
