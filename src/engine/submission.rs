//! Price submission into an open round.

use super::{round_key, RoundEngine, RoundError, RoundResult};
use crate::domain::{
    ManagerLock, NoteType, Price, PriceRound, PriceWrite, PriceWriteOutcome, ProductId, ProfileId,
    RoundId, RoundItem,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SubmitPriceRequest {
    pub round_id: RoundId,
    pub product_id: ProductId,
    pub editor_id: ProfileId,
    /// Raw value; validated as a positive [`Price`].
    pub price: Decimal,
    pub note_type: Option<NoteType>,
    pub notes: Option<String>,
}

impl SubmitPriceRequest {
    pub fn new(
        round_id: RoundId,
        product_id: ProductId,
        editor_id: ProfileId,
        price: Decimal,
    ) -> Self {
        Self {
            round_id,
            product_id,
            editor_id,
            price,
            note_type: None,
            notes: None,
        }
    }

    pub fn with_note(mut self, note_type: NoteType, notes: impl Into<String>) -> Self {
        self.note_type = Some(note_type);
        self.notes = Some(notes.into());
        self
    }
}

impl RoundEngine {
    /// Record a price for one product of a round.
    ///
    /// Checks run in a fixed order: price, round existence, status, window,
    /// product membership, editor. Nothing is written unless all pass.
    pub async fn submit_price(&self, request: SubmitPriceRequest) -> RoundResult<PriceWriteOutcome> {
        let price = Price::new(request.price).map_err(|_| RoundError::InvalidPrice(request.price))?;

        let round = self.load_round(request.round_id).await?;
        let _guard = self.locks.lock(round_key(round.market_id, round.for_date)).await;

        // Re-read under the lock: a close or date edit may have landed meanwhile.
        let round = self.load_round(request.round_id).await?;
        let item = self.check_submission(&round, &request).await?;

        let note_type = request.note_type;
        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let outcome = self
            .repo
            .record_price(&PriceWrite {
                market_id: round.market_id,
                product_id: item.product_id,
                for_date: round.for_date,
                unit_id: item.unit_id,
                price,
                note_type,
                notes,
                editor_id: request.editor_id,
                at: self.clock.now(),
            })
            .await?;

        info!(
            round_id = %round.id,
            product_id = %item.product_id,
            editor = %request.editor_id,
            price = %price,
            before = ?outcome.before_price.map(|p| p.to_string()),
            "price recorded"
        );
        Ok(outcome)
    }

    async fn load_round(&self, round_id: RoundId) -> RoundResult<PriceRound> {
        self.repo
            .get_round(round_id)
            .await?
            .ok_or_else(|| RoundError::not_found("round", round_id))
    }

    async fn check_submission(
        &self,
        round: &PriceRound,
        request: &SubmitPriceRequest,
    ) -> RoundResult<RoundItem> {
        if !round.status.is_open() {
            return Err(RoundError::RoundClosed(round.id));
        }

        let today = self.clock.business_today();
        if round.for_date != today {
            warn!(
                round_id = %round.id,
                round_date = %round.for_date,
                today = %today,
                "submission outside round window"
            );
            return Err(RoundError::OutsideWindow {
                round_date: round.for_date,
                today,
            });
        }

        let item = *round
            .item_for(request.product_id)
            .ok_or(RoundError::ProductNotInRound {
                round_id: round.id,
                product_id: request.product_id,
            })?;

        match round.manager {
            ManagerLock::Locked(locked) => {
                if request.editor_id != locked {
                    warn!(
                        round_id = %round.id,
                        editor = %request.editor_id,
                        locked = %locked,
                        "submission from non-locked manager"
                    );
                    return Err(RoundError::NotLockedManager {
                        locked,
                        editor: request.editor_id,
                    });
                }
            }
            ManagerLock::Unlocked => {
                let active = self
                    .managers
                    .is_active_manager(round.market_id, request.editor_id)
                    .await?;
                if !active {
                    return Err(RoundError::Unauthorized(format!(
                        "{} is not an active manager of market {}",
                        request.editor_id, round.market_id
                    )));
                }
            }
        }

        Ok(item)
    }
}
