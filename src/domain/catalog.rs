//! Catalog and registry records owned by the admin side of the platform.
//!
//! The round engine only ever reads these, and only when a round is opened.

use crate::domain::{MarketId, ProductId, ProfileId, UnitId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub default_unit_id: UnitId,
    pub active: bool,
}

/// A (market, product) pair surveyed in a given unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCatalogEntry {
    pub market_id: MarketId,
    pub product_id: ProductId,
    pub unit_id: UnitId,
    pub active: bool,
}

/// Grants a profile the manager role for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerAssignment {
    pub market_id: MarketId,
    pub profile_id: ProfileId,
    pub active: bool,
}
