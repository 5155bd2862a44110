//! Price ledger persistence: the current-value table and its audit trail.

use super::{decode_parsed, decode_parsed_opt, decode_time, encode_time, Repository};
use crate::domain::{
    BusinessDate, HistoryEntryId, MarketId, Price, PriceEntry, PriceEntryId, PriceHistoryEntry,
    PriceWrite, PriceWriteOutcome, ProductId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const ENTRY_COLUMNS: &str = "id, market_id, product_id, for_date, unit_id, price, note_type, \
                             notes, last_editor_id, created_at, updated_at";

impl Repository {
    // =========================================================================
    // Ledger writes
    // =========================================================================

    /// Upsert the current-value row for the write's key and append exactly one
    /// history row, in a single transaction.
    ///
    /// The prior price is read inside the same transaction, so the history
    /// chain stays consistent: each row's `before_price` equals the previous
    /// row's `after_price`.
    pub async fn record_price(&self, write: &PriceWrite) -> Result<PriceWriteOutcome, sqlx::Error> {
        let _gate = self.write_lock().await;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            r#"
            SELECT id, price
            FROM price_entries
            WHERE market_id = ? AND product_id = ? AND for_date = ?
            "#,
        )
        .bind(write.market_id.to_string())
        .bind(write.product_id.to_string())
        .bind(write.for_date.to_key())
        .fetch_optional(&mut *tx)
        .await?;

        let at = encode_time(write.at);
        let note_type = write.note_type.map(|n| n.as_str());

        let (entry_id, before_price) = match existing {
            Some(row) => {
                let entry_id: PriceEntryId = decode_parsed(&row, "id")?;
                let before: Price = decode_parsed(&row, "price")?;

                sqlx::query(
                    r#"
                    UPDATE price_entries
                    SET unit_id = ?, price = ?, note_type = ?, notes = ?,
                        last_editor_id = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(write.unit_id.to_string())
                .bind(write.price.to_canonical_string())
                .bind(note_type)
                .bind(write.notes.as_deref())
                .bind(write.editor_id.to_string())
                .bind(&at)
                .bind(entry_id.to_string())
                .execute(&mut *tx)
                .await?;

                (entry_id, Some(before))
            }
            None => {
                let entry_id = PriceEntryId::new();

                sqlx::query(
                    r#"
                    INSERT INTO price_entries
                    (id, market_id, product_id, for_date, unit_id, price, note_type, notes,
                     last_editor_id, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(entry_id.to_string())
                .bind(write.market_id.to_string())
                .bind(write.product_id.to_string())
                .bind(write.for_date.to_key())
                .bind(write.unit_id.to_string())
                .bind(write.price.to_canonical_string())
                .bind(note_type)
                .bind(write.notes.as_deref())
                .bind(write.editor_id.to_string())
                .bind(&at)
                .bind(&at)
                .execute(&mut *tx)
                .await?;

                (entry_id, None)
            }
        };

        let history_id = HistoryEntryId::new();
        sqlx::query(
            r#"
            INSERT INTO price_history
            (id, price_entry_id, before_price, after_price, editor_id, note_type, notes, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(history_id.to_string())
        .bind(entry_id.to_string())
        .bind(before_price.map(|p| p.to_canonical_string()))
        .bind(write.price.to_canonical_string())
        .bind(write.editor_id.to_string())
        .bind(note_type)
        .bind(write.notes.as_deref())
        .bind(&at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PriceWriteOutcome {
            entry_id,
            history_id,
            before_price,
        })
    }

    // =========================================================================
    // Ledger reads
    // =========================================================================

    pub async fn get_price_entry(
        &self,
        entry_id: PriceEntryId,
    ) -> Result<Option<PriceEntry>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM price_entries WHERE id = ?",
            ENTRY_COLUMNS
        ))
        .bind(entry_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    pub async fn find_price_entry(
        &self,
        market_id: MarketId,
        product_id: ProductId,
        for_date: BusinessDate,
    ) -> Result<Option<PriceEntry>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM price_entries WHERE market_id = ? AND product_id = ? AND for_date = ?",
            ENTRY_COLUMNS
        ))
        .bind(market_id.to_string())
        .bind(product_id.to_string())
        .bind(for_date.to_key())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    /// All current-value rows recorded for a market day.
    pub async fn price_entries_for_day(
        &self,
        market_id: MarketId,
        for_date: BusinessDate,
    ) -> Result<Vec<PriceEntry>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM price_entries WHERE market_id = ? AND for_date = ? ORDER BY created_at ASC, id ASC",
            ENTRY_COLUMNS
        ))
        .bind(market_id.to_string())
        .bind(for_date.to_key())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Whether any price has been recorded for the market day.
    pub async fn has_price_data(
        &self,
        market_id: MarketId,
        for_date: BusinessDate,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM price_entries WHERE market_id = ? AND for_date = ? LIMIT 1")
            .bind(market_id.to_string())
            .bind(for_date.to_key())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Full change log of one entry, oldest first.
    pub async fn price_history(
        &self,
        entry_id: PriceEntryId,
    ) -> Result<Vec<PriceHistoryEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, price_entry_id, before_price, after_price, editor_id, note_type, notes, recorded_at
            FROM price_history
            WHERE price_entry_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(entry_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<PriceHistoryEntry, sqlx::Error> {
                Ok(PriceHistoryEntry {
                    id: decode_parsed(row, "id")?,
                    price_entry_id: decode_parsed(row, "price_entry_id")?,
                    before_price: decode_parsed_opt(row, "before_price")?,
                    after_price: decode_parsed(row, "after_price")?,
                    editor_id: decode_parsed(row, "editor_id")?,
                    note_type: decode_parsed_opt(row, "note_type")?,
                    notes: row.try_get("notes")?,
                    recorded_at: decode_time(row, "recorded_at")?,
                })
            })
            .collect()
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<PriceEntry, sqlx::Error> {
    Ok(PriceEntry {
        id: decode_parsed(row, "id")?,
        market_id: decode_parsed(row, "market_id")?,
        product_id: decode_parsed(row, "product_id")?,
        for_date: decode_parsed(row, "for_date")?,
        unit_id: decode_parsed(row, "unit_id")?,
        price: decode_parsed(row, "price")?,
        note_type: decode_parsed_opt(row, "note_type")?,
        notes: row.try_get("notes")?,
        last_editor_id: decode_parsed(row, "last_editor_id")?,
        created_at: decode_time(row, "created_at")?,
        updated_at: decode_time(row, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_db;
    use crate::domain::{NoteType, ProfileId, UnitId};
    use chrono::Utc;
    use std::str::FromStr;

    fn write(market_id: MarketId, product_id: ProductId, price: &str) -> PriceWrite {
        PriceWrite {
            market_id,
            product_id,
            for_date: BusinessDate::from_ymd(2026, 10, 19).unwrap(),
            unit_id: UnitId::new(),
            price: Price::from_str(price).unwrap(),
            note_type: None,
            notes: None,
            editor_id: ProfileId::new(),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_first_write_inserts_entry_and_history() {
        let (repo, _temp) = setup_test_db().await;
        let w = write(MarketId::new(), ProductId::new(), "15000");

        let outcome = repo.record_price(&w).await.unwrap();
        assert!(outcome.before_price.is_none());

        let entry = repo.get_price_entry(outcome.entry_id).await.unwrap().unwrap();
        assert_eq!(entry.price.to_string(), "15000");
        assert_eq!(entry.unit_id, w.unit_id);

        let history = repo.price_history(outcome.entry_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, outcome.history_id);
        assert!(history[0].before_price.is_none());
    }

    #[tokio::test]
    async fn test_rewrite_updates_in_place_and_chains_history() {
        let (repo, _temp) = setup_test_db().await;
        let market_id = MarketId::new();
        let product_id = ProductId::new();

        let first = repo
            .record_price(&write(market_id, product_id, "15000"))
            .await
            .unwrap();
        let mut second_write = write(market_id, product_id, "16000");
        second_write.note_type = Some(NoteType::Up);
        second_write.notes = Some("mưa lớn".to_string());
        let second = repo.record_price(&second_write).await.unwrap();
        let third = repo
            .record_price(&write(market_id, product_id, "15500"))
            .await
            .unwrap();

        assert_eq!(first.entry_id, second.entry_id);
        assert_eq!(second.entry_id, third.entry_id);

        let entries = repo
            .price_entries_for_day(market_id, second_write.for_date)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].price.to_string(), "15500");

        let history = repo.price_history(first.entry_id).await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[0].before_price.is_none());
        for pair in history.windows(2) {
            assert_eq!(pair[1].before_price, Some(pair[0].after_price));
        }
        assert_eq!(history[1].note_type, Some(NoteType::Up));
        assert_eq!(history[1].notes.as_deref(), Some("mưa lớn"));
    }

    #[tokio::test]
    async fn test_has_price_data_scoped_to_market_day() {
        let (repo, _temp) = setup_test_db().await;
        let w = write(MarketId::new(), ProductId::new(), "900");
        assert!(!repo.has_price_data(w.market_id, w.for_date).await.unwrap());

        repo.record_price(&w).await.unwrap();
        assert!(repo.has_price_data(w.market_id, w.for_date).await.unwrap());
        assert!(!repo
            .has_price_data(w.market_id, w.for_date.succ().unwrap())
            .await
            .unwrap());
    }
}
