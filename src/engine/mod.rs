//! The price round engine.
//!
//! Opens and closes per-market daily rounds, routes price submissions into the
//! ledger under the round's window and manager lock, and reports progress.
//!
//! - `lifecycle.rs` - open/close/lookup plus the administrative escape hatches
//! - `submission.rs` - price submission validation and ledger write
//! - `status.rs` - read-only progress reporting

use crate::clock::Clock;
use crate::db::Repository;
use crate::directory::{CatalogStore, ManagerRegistry};
use crate::domain::{BusinessDate, MarketId};
use std::sync::Arc;

pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod status;
pub mod submission;

pub use error::{RoundError, RoundResult};
pub use lifecycle::{OpenRoundRequest, RoundRow, RoundView};
pub use locks::KeyedLocks;
pub use status::{ManagerFill, RoundProgress};
pub use submission::SubmitPriceRequest;

pub struct RoundEngine {
    repo: Arc<Repository>,
    catalog: Arc<dyn CatalogStore>,
    managers: Arc<dyn ManagerRegistry>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
}

impl RoundEngine {
    pub fn new(
        repo: Arc<Repository>,
        catalog: Arc<dyn CatalogStore>,
        managers: Arc<dyn ManagerRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            catalog,
            managers,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    pub fn repo(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Today in the business timezone, recomputed on every call.
    pub fn business_today(&self) -> BusinessDate {
        self.clock.business_today()
    }
}

/// Lock key for a round's natural key. Every mutation of a round, and every
/// price written through it, runs under this key.
fn round_key(market_id: MarketId, for_date: BusinessDate) -> String {
    format!("round:{}:{}", market_id, for_date)
}
