//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `mod.rs` - Catalog and manager registry operations
//! - `rounds.rs` - Price round persistence
//! - `prices.rs` - Price ledger (current values and history)

mod prices;
mod rounds;

pub use rounds::OpenOutcome;

use crate::domain::{
    ManagerAssignment, Market, MarketCatalogEntry, MarketId, Product, ProfileId, RoundItem, Unit,
};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::fmt::Display;
use std::str::FromStr;
use tokio::sync::{Mutex, MutexGuard};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
    /// SQLite admits one writer at a time; multi-statement write transactions
    /// take this gate so they never race each other into `SQLITE_BUSY`.
    write_gate: Mutex<()>,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository {
            pool,
            write_gate: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap round-trip used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    // =========================================================================
    // Catalog operations
    // =========================================================================

    pub async fn upsert_market(&self, market: &Market) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO markets (id, name, active)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                active = excluded.active
            "#,
        )
        .bind(market.id.to_string())
        .bind(&market.name)
        .bind(market.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_unit(&self, unit: &Unit) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO units (id, name, active)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                active = excluded.active
            "#,
        )
        .bind(unit.id.to_string())
        .bind(&unit.name)
        .bind(unit.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_product(&self, product: &Product) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, default_unit_id, active)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                default_unit_id = excluded.default_unit_id,
                active = excluded.active
            "#,
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(product.default_unit_id.to_string())
        .bind(product.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert or update a (market, product) catalog row.
    ///
    /// Updating keeps the row's original position in the catalog order.
    pub async fn upsert_catalog_entry(&self, entry: &MarketCatalogEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO market_products (market_id, product_id, unit_id, active)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(market_id, product_id) DO UPDATE SET
                unit_id = excluded.unit_id,
                active = excluded.active
            "#,
        )
        .bind(entry.market_id.to_string())
        .bind(entry.product_id.to_string())
        .bind(entry.unit_id.to_string())
        .bind(entry.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_manager_assignment(
        &self,
        assignment: &ManagerAssignment,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO market_managers (market_id, profile_id, active)
            VALUES (?, ?, ?)
            ON CONFLICT(market_id, profile_id) DO UPDATE SET
                active = excluded.active
            "#,
        )
        .bind(assignment.market_id.to_string())
        .bind(assignment.profile_id.to_string())
        .bind(assignment.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// True when the market exists and is active.
    pub async fn market_exists(&self, market_id: MarketId) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM markets WHERE id = ? AND active = 1")
            .bind(market_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Active catalog rows for a market, in the order they were added.
    pub async fn active_catalog_entries(
        &self,
        market_id: MarketId,
    ) -> Result<Vec<RoundItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, unit_id
            FROM market_products
            WHERE market_id = ? AND active = 1
            ORDER BY seq ASC
            "#,
        )
        .bind(market_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<RoundItem, sqlx::Error> {
                Ok(RoundItem {
                    product_id: decode_parsed(row, "product_id")?,
                    unit_id: decode_parsed(row, "unit_id")?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Manager registry operations
    // =========================================================================

    /// Active managers of a market, oldest assignment first.
    pub async fn active_managers(&self, market_id: MarketId) -> Result<Vec<ProfileId>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT profile_id
            FROM market_managers
            WHERE market_id = ? AND active = 1
            ORDER BY seq ASC
            "#,
        )
        .bind(market_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| decode_parsed(row, "profile_id"))
            .collect()
    }

    pub async fn is_active_manager(
        &self,
        market_id: MarketId,
        profile_id: ProfileId,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            "SELECT 1 FROM market_managers WHERE market_id = ? AND profile_id = ? AND active = 1",
        )
        .bind(market_id.to_string())
        .bind(profile_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}

// =============================================================================
// Column codecs shared by the submodules
// =============================================================================

fn decode_error(column: &str, raw: &str, err: impl Display) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("invalid value {:?}: {}", raw, err).into(),
    }
}

/// Read a TEXT column and parse it with `FromStr`.
pub(crate) fn decode_parsed<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| decode_error(column, &raw, e))
}

/// Nullable variant of [`decode_parsed`].
pub(crate) fn decode_parsed_opt<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| raw.parse::<T>().map_err(|e| decode_error(column, &raw, e)))
        .transpose()
}

pub(crate) fn decode_time(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| decode_error(column, &raw, e))
}

pub(crate) fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    pub async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::setup_test_db;
    use super::*;
    use crate::domain::{ProductId, UnitId};

    async fn seed_market(repo: &Repository, active: bool) -> MarketId {
        let market = Market {
            id: MarketId::new(),
            name: "Chợ Bến Thành".to_string(),
            active,
        };
        repo.upsert_market(&market).await.unwrap();
        market.id
    }

    async fn seed_product(repo: &Repository) -> (ProductId, UnitId) {
        let unit = Unit {
            id: UnitId::new(),
            name: "kg".to_string(),
            active: true,
        };
        repo.upsert_unit(&unit).await.unwrap();
        let product = Product {
            id: ProductId::new(),
            name: "Gạo".to_string(),
            default_unit_id: unit.id,
            active: true,
        };
        repo.upsert_product(&product).await.unwrap();
        (product.id, unit.id)
    }

    #[tokio::test]
    async fn test_market_exists_requires_active() {
        let (repo, _temp) = setup_test_db().await;
        let active = seed_market(&repo, true).await;
        let inactive = seed_market(&repo, false).await;

        assert!(repo.market_exists(active).await.unwrap());
        assert!(!repo.market_exists(inactive).await.unwrap());
        assert!(!repo.market_exists(MarketId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_active_catalog_entries_in_insertion_order() {
        let (repo, _temp) = setup_test_db().await;
        let market_id = seed_market(&repo, true).await;

        let mut expected = Vec::new();
        for i in 0..3 {
            let (product_id, unit_id) = seed_product(&repo).await;
            repo.upsert_catalog_entry(&MarketCatalogEntry {
                market_id,
                product_id,
                unit_id,
                active: i != 1,
            })
            .await
            .unwrap();
            if i != 1 {
                expected.push(RoundItem {
                    product_id,
                    unit_id,
                });
            }
        }

        let items = repo.active_catalog_entries(market_id).await.unwrap();
        assert_eq!(items, expected);
    }

    #[tokio::test]
    async fn test_manager_registry_order_and_deactivation() {
        let (repo, _temp) = setup_test_db().await;
        let market_id = seed_market(&repo, true).await;
        let first = ProfileId::new();
        let second = ProfileId::new();

        for profile_id in [first, second] {
            repo.upsert_manager_assignment(&ManagerAssignment {
                market_id,
                profile_id,
                active: true,
            })
            .await
            .unwrap();
        }
        assert_eq!(
            repo.active_managers(market_id).await.unwrap(),
            vec![first, second]
        );

        repo.upsert_manager_assignment(&ManagerAssignment {
            market_id,
            profile_id: first,
            active: false,
        })
        .await
        .unwrap();

        assert_eq!(repo.active_managers(market_id).await.unwrap(), vec![second]);
        assert!(!repo.is_active_manager(market_id, first).await.unwrap());
        assert!(repo.is_active_manager(market_id, second).await.unwrap());
    }
}
