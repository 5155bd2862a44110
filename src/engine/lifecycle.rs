//! Round lifecycle: `(none) -> open -> closed`.
//!
//! Reopen, date edits and removal are administrative escape hatches. They do
//! not re-validate catalog or manager state.

use super::{round_key, RoundEngine, RoundError, RoundResult};
use crate::db::OpenOutcome;
use crate::domain::{
    Actor, BusinessDate, ManagerLock, MarketId, Price, PriceEntryId, PriceRound, ProductId,
    RoundId, RoundItem, RoundStatus, UnitId,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct OpenRoundRequest {
    pub market_id: MarketId,
    pub creator: Actor,
    /// Defaults to business today.
    pub for_date: Option<BusinessDate>,
    /// Replaces the catalog snapshot when present.
    pub items: Option<Vec<RoundItem>>,
}

impl OpenRoundRequest {
    pub fn new(market_id: MarketId, creator: Actor) -> Self {
        Self {
            market_id,
            creator,
            for_date: None,
            items: None,
        }
    }

    pub fn for_date(mut self, for_date: BusinessDate) -> Self {
        self.for_date = Some(for_date);
        self
    }

    pub fn with_items(mut self, items: Vec<RoundItem>) -> Self {
        self.items = Some(items);
        self
    }
}

/// One snapshot item joined with its current price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRow {
    pub product_id: ProductId,
    pub unit_id: UnitId,
    pub price: Option<Price>,
    pub entry_id: Option<PriceEntryId>,
}

/// A round together with the live ledger values for its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundView {
    pub round: PriceRound,
    pub rows: Vec<RoundRow>,
}

impl RoundEngine {
    /// Open the round for a market day, or return the one already open.
    pub async fn open_round(&self, request: OpenRoundRequest) -> RoundResult<OpenOutcome> {
        let market_id = request.market_id;
        let for_date = request
            .for_date
            .unwrap_or_else(|| self.clock.business_today());

        if !self.catalog.market_exists(market_id).await? {
            return Err(RoundError::not_found("market", market_id));
        }

        let managers = self.managers.active_managers(market_id).await?;
        let Some(&locked_manager) = managers.first() else {
            warn!(market_id = %market_id, "cannot open round: no active manager");
            return Err(RoundError::NoManager(market_id));
        };

        let creator = request.creator;
        if !creator.role.is_privileged() && !managers.contains(&creator.profile_id) {
            warn!(
                market_id = %market_id,
                creator = %creator.profile_id,
                "cannot open round: creator is not an active manager"
            );
            return Err(RoundError::Unauthorized(format!(
                "{} is not an active manager of market {}",
                creator.profile_id, market_id
            )));
        }

        let _guard = self.locks.lock(round_key(market_id, for_date)).await;

        if let Some(existing) = self.repo.find_open_round(market_id, for_date).await? {
            debug!(round_id = %existing.id, market_id = %market_id, for_date = %for_date, "reusing open round");
            return Ok(OpenOutcome::Existing(existing.id));
        }

        let items = match request.items {
            Some(items) => dedupe_items(items),
            None => self.catalog.active_catalog_entries(market_id).await?,
        };
        if items.is_empty() {
            warn!(market_id = %market_id, "cannot open round: empty catalog");
            return Err(RoundError::EmptyCatalog(market_id));
        }

        let round = PriceRound {
            id: RoundId::new(),
            market_id,
            for_date,
            items,
            manager: ManagerLock::Locked(locked_manager),
            status: RoundStatus::Open,
            created_by: creator.profile_id,
            created_at: self.clock.now(),
        };

        let outcome = self.repo.insert_round_if_absent(&round).await?;
        if let OpenOutcome::Created(round_id) = &outcome {
            info!(
                round_id = %round_id,
                market_id = %market_id,
                for_date = %for_date,
                items = round.items.len(),
                manager = %locked_manager,
                "round opened"
            );
        }
        Ok(outcome)
    }

    /// Close a round. Closing a missing or already closed round is a no-op.
    ///
    /// Returns whether the round transitioned.
    pub async fn close_round(&self, round_id: RoundId) -> RoundResult<bool> {
        let Some(round) = self.repo.get_round(round_id).await? else {
            debug!(round_id = %round_id, "close of unknown round ignored");
            return Ok(false);
        };

        let _guard = self.locks.lock(round_key(round.market_id, round.for_date)).await;
        let closed = self
            .repo
            .set_round_status(round_id, RoundStatus::Closed)
            .await?;
        if closed {
            info!(round_id = %round_id, market_id = %round.market_id, "round closed");
        }
        Ok(closed)
    }

    /// The round for a market day (default today) with current prices per
    /// snapshot item. `None` when no round exists for the day.
    pub async fn get_active_for_market(
        &self,
        market_id: MarketId,
        date: Option<BusinessDate>,
    ) -> RoundResult<Option<RoundView>> {
        let for_date = date.unwrap_or_else(|| self.clock.business_today());
        let Some(round) = self.repo.find_round_for_market(market_id, for_date).await? else {
            return Ok(None);
        };

        let entries: HashMap<ProductId, _> = self
            .repo
            .price_entries_for_day(market_id, for_date)
            .await?
            .into_iter()
            .map(|entry| (entry.product_id, entry))
            .collect();

        let rows = round
            .items
            .iter()
            .map(|item| {
                let entry = entries.get(&item.product_id);
                RoundRow {
                    product_id: item.product_id,
                    unit_id: item.unit_id,
                    price: entry.map(|e| e.price),
                    entry_id: entry.map(|e| e.id),
                }
            })
            .collect();

        Ok(Some(RoundView { round, rows }))
    }

    pub async fn get_round(&self, round_id: RoundId) -> RoundResult<PriceRound> {
        self.repo
            .get_round(round_id)
            .await?
            .ok_or_else(|| RoundError::not_found("round", round_id))
    }

    // =========================================================================
    // Administrative operations
    // =========================================================================

    /// Put a closed round back into `open`.
    pub async fn reopen_round(&self, round_id: RoundId) -> RoundResult<bool> {
        let round = self.get_round(round_id).await?;
        if round.status.is_open() {
            return Ok(false);
        }

        let _guard = self.locks.lock(round_key(round.market_id, round.for_date)).await;
        if let Some(other) = self
            .repo
            .find_open_round(round.market_id, round.for_date)
            .await?
        {
            warn!(round_id = %round_id, open_round = %other.id, "reopen blocked by another open round");
            return Err(RoundError::DuplicateDate {
                market_id: round.market_id,
                for_date: round.for_date,
            });
        }

        let reopened = self
            .repo
            .set_round_status(round_id, RoundStatus::Open)
            .await
            .map_err(|e| duplicate_or_storage(e, round.market_id, round.for_date))?;
        if reopened {
            info!(round_id = %round_id, market_id = %round.market_id, "round reopened by admin");
        }
        Ok(reopened)
    }

    /// Move a round to another day. Rejected once prices exist for its
    /// current day.
    pub async fn update_for_date(
        &self,
        round_id: RoundId,
        new_date: BusinessDate,
    ) -> RoundResult<PriceRound> {
        let round = self.get_round(round_id).await?;
        if round.for_date == new_date {
            return Ok(round);
        }

        let _guard = self.locks.lock(round_key(round.market_id, round.for_date)).await;
        if self
            .repo
            .has_price_data(round.market_id, round.for_date)
            .await?
        {
            return Err(RoundError::DataExists {
                market_id: round.market_id,
                for_date: round.for_date,
            });
        }

        if round.status.is_open()
            && self
                .repo
                .find_open_round(round.market_id, new_date)
                .await?
                .is_some()
        {
            return Err(RoundError::DuplicateDate {
                market_id: round.market_id,
                for_date: new_date,
            });
        }

        self.repo
            .update_round_date(round_id, new_date)
            .await
            .map_err(|e| duplicate_or_storage(e, round.market_id, new_date))?;
        info!(
            round_id = %round_id,
            from = %round.for_date,
            to = %new_date,
            "round date changed by admin"
        );

        Ok(PriceRound {
            for_date: new_date,
            ..round
        })
    }

    /// Delete a round that never collected any price.
    pub async fn remove_round(&self, round_id: RoundId) -> RoundResult<()> {
        let round = self.get_round(round_id).await?;

        let _guard = self.locks.lock(round_key(round.market_id, round.for_date)).await;
        if self
            .repo
            .has_price_data(round.market_id, round.for_date)
            .await?
        {
            return Err(RoundError::DataExists {
                market_id: round.market_id,
                for_date: round.for_date,
            });
        }

        self.repo.delete_round(round_id).await?;
        info!(round_id = %round_id, market_id = %round.market_id, "round removed by admin");
        Ok(())
    }
}

/// Keep the first occurrence of each product.
fn dedupe_items(items: Vec<RoundItem>) -> Vec<RoundItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.product_id))
        .collect()
}

fn duplicate_or_storage(err: sqlx::Error, market_id: MarketId, for_date: BusinessDate) -> RoundError {
    let unique_violation = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique_violation {
        RoundError::DuplicateDate {
            market_id,
            for_date,
        }
    } else {
        RoundError::Storage(err)
    }
}
