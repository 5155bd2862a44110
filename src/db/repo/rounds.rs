//! Price round persistence.

use super::{decode_parsed, decode_parsed_opt, decode_time, encode_time, Repository};
use crate::domain::{
    BusinessDate, ManagerLock, MarketId, PriceRound, RoundId, RoundItem, RoundStatus,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const ROUND_COLUMNS: &str =
    "id, market_id, for_date, items, manager_id, status, created_by, created_at";

/// Result of an atomic open attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The candidate round was inserted.
    Created(RoundId),
    /// An open round already existed for the key; nothing was written.
    Existing(RoundId),
}

impl OpenOutcome {
    pub fn round_id(&self) -> RoundId {
        match self {
            OpenOutcome::Created(id) | OpenOutcome::Existing(id) => *id,
        }
    }
}

impl Repository {
    // =========================================================================
    // Round operations
    // =========================================================================

    /// Insert `round` unless an open round already exists for its
    /// (market, date) key. Check and insert share one transaction.
    pub async fn insert_round_if_absent(
        &self,
        round: &PriceRound,
    ) -> Result<OpenOutcome, sqlx::Error> {
        let items = serde_json::to_string(&round.items)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let _gate = self.write_lock().await;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            "SELECT id FROM price_rounds WHERE market_id = ? AND for_date = ? AND status = 'open'",
        )
        .bind(round.market_id.to_string())
        .bind(round.for_date.to_key())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            tx.rollback().await?;
            return Ok(OpenOutcome::Existing(decode_parsed(&row, "id")?));
        }

        sqlx::query(
            r#"
            INSERT INTO price_rounds
            (id, market_id, for_date, items, manager_id, status, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(round.id.to_string())
        .bind(round.market_id.to_string())
        .bind(round.for_date.to_key())
        .bind(items)
        .bind(round.manager.manager().map(|id| id.to_string()))
        .bind(round.status.as_str())
        .bind(round.created_by.to_string())
        .bind(encode_time(round.created_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(OpenOutcome::Created(round.id))
    }

    pub async fn get_round(&self, round_id: RoundId) -> Result<Option<PriceRound>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM price_rounds WHERE id = ?",
            ROUND_COLUMNS
        ))
        .bind(round_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(round_from_row).transpose()
    }

    pub async fn find_open_round(
        &self,
        market_id: MarketId,
        for_date: BusinessDate,
    ) -> Result<Option<PriceRound>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM price_rounds WHERE market_id = ? AND for_date = ? AND status = 'open'",
            ROUND_COLUMNS
        ))
        .bind(market_id.to_string())
        .bind(for_date.to_key())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(round_from_row).transpose()
    }

    /// The round for a market day: the open one if any, otherwise the most
    /// recently created closed one.
    pub async fn find_round_for_market(
        &self,
        market_id: MarketId,
        for_date: BusinessDate,
    ) -> Result<Option<PriceRound>, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM price_rounds
            WHERE market_id = ? AND for_date = ?
            ORDER BY CASE status WHEN 'open' THEN 0 ELSE 1 END, created_at DESC, id DESC
            LIMIT 1
            "#,
            ROUND_COLUMNS
        ))
        .bind(market_id.to_string())
        .bind(for_date.to_key())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(round_from_row).transpose()
    }

    /// Set a round's status. Returns false when the round was missing or
    /// already had that status.
    pub async fn set_round_status(
        &self,
        round_id: RoundId,
        status: RoundStatus,
    ) -> Result<bool, sqlx::Error> {
        let _gate = self.write_lock().await;
        let result = sqlx::query("UPDATE price_rounds SET status = ? WHERE id = ? AND status != ?")
            .bind(status.as_str())
            .bind(round_id.to_string())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_round_date(
        &self,
        round_id: RoundId,
        for_date: BusinessDate,
    ) -> Result<bool, sqlx::Error> {
        let _gate = self.write_lock().await;
        let result = sqlx::query("UPDATE price_rounds SET for_date = ? WHERE id = ?")
            .bind(for_date.to_key())
            .bind(round_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_round(&self, round_id: RoundId) -> Result<bool, sqlx::Error> {
        let _gate = self.write_lock().await;
        let result = sqlx::query("DELETE FROM price_rounds WHERE id = ?")
            .bind(round_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn round_from_row(row: &SqliteRow) -> Result<PriceRound, sqlx::Error> {
    let items_json: String = row.try_get("items")?;
    let items: Vec<RoundItem> =
        serde_json::from_str(&items_json).map_err(|e| sqlx::Error::ColumnDecode {
            index: "items".to_string(),
            source: Box::new(e),
        })?;

    Ok(PriceRound {
        id: decode_parsed(row, "id")?,
        market_id: decode_parsed(row, "market_id")?,
        for_date: decode_parsed(row, "for_date")?,
        items,
        manager: ManagerLock::from_option(decode_parsed_opt(row, "manager_id")?),
        status: decode_parsed(row, "status")?,
        created_by: decode_parsed(row, "created_by")?,
        created_at: decode_time(row, "created_at")?,
    })
}
