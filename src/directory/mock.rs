//! In-memory directory for tests without a catalog database.

use super::{CatalogStore, DirectoryError, ManagerRegistry};
use crate::domain::{MarketId, ProductId, ProfileId, RoundItem, UnitId};
use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    markets: Vec<MarketId>,
    catalog: Vec<(MarketId, RoundItem, bool)>,
    managers: Vec<(MarketId, ProfileId, bool)>,
    offline: bool,
}

/// Mock directory holding markets, catalog rows and manager assignments in
/// memory. Rows keep insertion order, which doubles as creation order.
#[derive(Debug, Default)]
pub struct MockDirectory {
    state: RwLock<State>,
}

impl MockDirectory {
    /// Create a new, empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active market.
    pub fn with_market(self, market_id: MarketId) -> Self {
        self.write().markets.push(market_id);
        self
    }

    /// Add an active catalog row.
    pub fn with_catalog_entry(self, market_id: MarketId, product_id: ProductId, unit_id: UnitId) -> Self {
        self.add_catalog_entry(market_id, product_id, unit_id);
        self
    }

    /// Add an active manager assignment.
    pub fn with_manager(self, market_id: MarketId, profile_id: ProfileId) -> Self {
        self.set_manager(market_id, profile_id, true);
        self
    }

    pub fn add_catalog_entry(&self, market_id: MarketId, product_id: ProductId, unit_id: UnitId) {
        self.write().catalog.push((
            market_id,
            RoundItem {
                product_id,
                unit_id,
            },
            true,
        ));
    }

    /// Deactivate every catalog row of a market.
    pub fn clear_catalog(&self, market_id: MarketId) {
        for row in self.write().catalog.iter_mut().filter(|row| row.0 == market_id) {
            row.2 = false;
        }
    }

    /// Insert or toggle a manager assignment. Existing rows keep their position.
    pub fn set_manager(&self, market_id: MarketId, profile_id: ProfileId, active: bool) {
        let mut state = self.write();
        match state
            .managers
            .iter_mut()
            .find(|row| row.0 == market_id && row.1 == profile_id)
        {
            Some(row) => row.2 = active,
            None => state.managers.push((market_id, profile_id, active)),
        }
    }

    /// While offline every lookup fails with [`DirectoryError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.write().offline = offline;
    }

    fn online(&self) -> Result<RwLockReadGuard<'_, State>, DirectoryError> {
        let state = self.read();
        if state.offline {
            return Err(DirectoryError::Unavailable("mock directory offline".to_string()));
        }
        Ok(state)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CatalogStore for MockDirectory {
    async fn market_exists(&self, market_id: MarketId) -> Result<bool, DirectoryError> {
        Ok(self.online()?.markets.contains(&market_id))
    }

    async fn active_catalog_entries(
        &self,
        market_id: MarketId,
    ) -> Result<Vec<RoundItem>, DirectoryError> {
        Ok(self
            .online()?
            .catalog
            .iter()
            .filter(|(m, _, active)| *m == market_id && *active)
            .map(|(_, item, _)| *item)
            .collect())
    }
}

#[async_trait]
impl ManagerRegistry for MockDirectory {
    async fn active_managers(&self, market_id: MarketId) -> Result<Vec<ProfileId>, DirectoryError> {
        Ok(self
            .online()?
            .managers
            .iter()
            .filter(|(m, _, active)| *m == market_id && *active)
            .map(|(_, profile, _)| *profile)
            .collect())
    }

    async fn is_active_manager(
        &self,
        market_id: MarketId,
        profile_id: ProfileId,
    ) -> Result<bool, DirectoryError> {
        Ok(self
            .online()?
            .managers
            .iter()
            .any(|(m, p, active)| *m == market_id && *p == profile_id && *active))
    }
}
