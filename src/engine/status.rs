//! Round progress reporting. Read-only and lock-free.

use super::{RoundEngine, RoundError, RoundResult};
use crate::domain::{PriceEntry, PriceEntryId, PriceHistoryEntry, ProductId, ProfileId, RoundId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerFill {
    pub profile_id: ProfileId,
    pub filled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundProgress {
    pub round_id: RoundId,
    pub product_count: usize,
    pub filled_count: usize,
    /// `filled_count / product_count`, or 0 for a round without items.
    pub completion: f64,
    /// Live entries per last editor, largest first.
    pub per_manager_filled: Vec<ManagerFill>,
}

impl RoundEngine {
    pub async fn status(&self, round_id: RoundId) -> RoundResult<RoundProgress> {
        let round = self.get_round(round_id).await?;
        let snapshot: HashSet<ProductId> = round.product_ids().collect();

        let entries = self
            .repo
            .price_entries_for_day(round.market_id, round.for_date)
            .await?;

        let mut filled = HashSet::new();
        let mut per_editor: BTreeMap<ProfileId, usize> = BTreeMap::new();
        for entry in entries
            .iter()
            .filter(|entry| snapshot.contains(&entry.product_id))
        {
            if filled.insert(entry.product_id) {
                *per_editor.entry(entry.last_editor_id).or_default() += 1;
            }
        }

        Ok(progress(round_id, snapshot.len(), filled.len(), per_editor))
    }

    /// A price entry and its full change log, oldest change first.
    pub async fn price_history(
        &self,
        entry_id: PriceEntryId,
    ) -> RoundResult<(PriceEntry, Vec<PriceHistoryEntry>)> {
        let entry = self
            .repo
            .get_price_entry(entry_id)
            .await?
            .ok_or_else(|| RoundError::not_found("price entry", entry_id))?;
        let history = self.repo.price_history(entry_id).await?;
        Ok((entry, history))
    }

    /// Change log of one product within a round's day.
    pub async fn entry_history_for_round(
        &self,
        round_id: RoundId,
        product_id: ProductId,
    ) -> RoundResult<(PriceEntry, Vec<PriceHistoryEntry>)> {
        let round = self.get_round(round_id).await?;
        if round.item_for(product_id).is_none() {
            return Err(RoundError::ProductNotInRound {
                round_id,
                product_id,
            });
        }

        let entry = self
            .repo
            .find_price_entry(round.market_id, product_id, round.for_date)
            .await?
            .ok_or_else(|| RoundError::not_found("price entry", product_id))?;
        let history = self.repo.price_history(entry.id).await?;
        Ok((entry, history))
    }
}

fn progress(
    round_id: RoundId,
    product_count: usize,
    filled_count: usize,
    per_editor: BTreeMap<ProfileId, usize>,
) -> RoundProgress {
    let completion = if product_count == 0 {
        0.0
    } else {
        filled_count as f64 / product_count as f64
    };

    let mut per_manager_filled: Vec<ManagerFill> = per_editor
        .into_iter()
        .map(|(profile_id, filled)| ManagerFill { profile_id, filled })
        .collect();
    per_manager_filled.sort_by(|a, b| b.filled.cmp(&a.filled).then(a.profile_id.cmp(&b.profile_id)));

    RoundProgress {
        round_id,
        product_count,
        filled_count,
        completion,
        per_manager_filled,
    }
}
