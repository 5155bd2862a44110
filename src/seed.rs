//! Catalog seeding from a JSON file.
//!
//! Markets, units, products, catalog rows and manager assignments are owned
//! by the admin side of the platform. For standalone deployments and local
//! runs they can be loaded at startup from a file:
//!
//! ```json
//! {
//!   "units":    [{"id": "...", "name": "kg", "active": true}],
//!   "markets":  [{"id": "...", "name": "Chợ A", "active": true}],
//!   "products": [{"id": "...", "name": "Gạo", "defaultUnitId": "...", "active": true}],
//!   "catalog":  [{"marketId": "...", "productId": "...", "unitId": "...", "active": true}],
//!   "managers": [{"marketId": "...", "profileId": "...", "active": true}]
//! }
//! ```
//!
//! Every record is upserted, so re-running a seed is harmless.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::db::Repository;
use crate::domain::{ManagerAssignment, Market, MarketCatalogEntry, Product, Unit};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub units: Vec<Unit>,
    pub markets: Vec<Market>,
    pub products: Vec<Product>,
    pub catalog: Vec<MarketCatalogEntry>,
    pub managers: Vec<ManagerAssignment>,
}

impl Seed {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("seed file is not valid JSON for the catalog schema")
    }

    fn record_count(&self) -> usize {
        self.units.len()
            + self.markets.len()
            + self.products.len()
            + self.catalog.len()
            + self.managers.len()
    }
}

pub async fn load_seed_file(repo: &Repository, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let seed = Seed::from_json(&raw)?;
    apply_seed(repo, &seed).await?;
    info!(path = %path.display(), records = seed.record_count(), "catalog seed applied");
    Ok(seed.record_count())
}

/// Upsert in dependency order: units and markets before products, products
/// before catalog rows.
pub async fn apply_seed(repo: &Repository, seed: &Seed) -> Result<()> {
    for unit in &seed.units {
        repo.upsert_unit(unit)
            .await
            .with_context(|| format!("unit {}", unit.id))?;
    }
    for market in &seed.markets {
        repo.upsert_market(market)
            .await
            .with_context(|| format!("market {}", market.id))?;
    }
    for product in &seed.products {
        repo.upsert_product(product)
            .await
            .with_context(|| format!("product {}", product.id))?;
    }
    for entry in &seed.catalog {
        repo.upsert_catalog_entry(entry)
            .await
            .with_context(|| format!("catalog row {}/{}", entry.market_id, entry.product_id))?;
    }
    for assignment in &seed.managers {
        repo.upsert_manager_assignment(assignment)
            .await
            .with_context(|| {
                format!("manager {}/{}", assignment.market_id, assignment.profile_id)
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_db;
    use crate::domain::{MarketId, ProductId, ProfileId, UnitId};
    use serde_json::json;

    fn seed_json(market: MarketId, product: ProductId, unit: UnitId, manager: ProfileId) -> String {
        json!({
            "units": [{"id": unit, "name": "kg", "active": true}],
            "markets": [{"id": market, "name": "Chợ A", "active": true}],
            "products": [{"id": product, "name": "Gạo", "defaultUnitId": unit, "active": true}],
            "catalog": [{"marketId": market, "productId": product, "unitId": unit, "active": true}],
            "managers": [{"marketId": market, "profileId": manager, "active": true}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_seed_file_populates_catalog() {
        let (repo, temp_dir) = setup_test_db().await;
        let (market, product, unit, manager) =
            (MarketId::new(), ProductId::new(), UnitId::new(), ProfileId::new());
        let path = temp_dir.path().join("seed.json");
        std::fs::write(&path, seed_json(market, product, unit, manager)).unwrap();

        let count = load_seed_file(&repo, &path).await.unwrap();
        assert_eq!(count, 5);

        assert!(repo.market_exists(market).await.unwrap());
        let items = repo.active_catalog_entries(market).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_id, unit);
        assert_eq!(repo.active_managers(market).await.unwrap(), vec![manager]);

        // Idempotent.
        load_seed_file(&repo, &path).await.unwrap();
        assert_eq!(repo.active_catalog_entries(market).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_sections_default_to_empty() {
        let seed = Seed::from_json(r#"{"units": []}"#).unwrap();
        assert_eq!(seed.record_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_seed_reports_context() {
        let (repo, temp_dir) = setup_test_db().await;
        let missing = temp_dir.path().join("absent.json");
        let err = load_seed_file(&repo, &missing).await.unwrap_err();
        assert!(err.to_string().contains("failed to read seed file"));

        assert!(Seed::from_json("{\"markets\": [{\"id\": \"nope\"}]}").is_err());
    }
}
