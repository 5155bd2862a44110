//! The price round aggregate.

use crate::domain::{BusinessDate, MarketId, ProductId, ProfileId, RoundId, UnitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One product collected by a round, frozen with the unit it is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundItem {
    pub product_id: ProductId,
    pub unit_id: UnitId,
}

/// Who may submit prices into a round.
///
/// Captured once when the round is created and never rewritten afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerLock {
    /// Only this profile may submit.
    Locked(ProfileId),
    /// Rounds created without a snapshot: any currently active manager of the
    /// market may submit.
    Unlocked,
}

impl ManagerLock {
    pub fn from_option(manager: Option<ProfileId>) -> Self {
        match manager {
            Some(id) => ManagerLock::Locked(id),
            None => ManagerLock::Unlocked,
        }
    }

    pub fn manager(&self) -> Option<ProfileId> {
        match self {
            ManagerLock::Locked(id) => Some(*id),
            ManagerLock::Unlocked => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Open,
    Closed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Open => "open",
            RoundStatus::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, RoundStatus::Open)
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RoundStatus::Open),
            "closed" => Ok(RoundStatus::Closed),
            other => Err(format!("unknown round status: {}", other)),
        }
    }
}

/// A per-market, per-day price collection round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRound {
    pub id: RoundId,
    pub market_id: MarketId,
    pub for_date: BusinessDate,
    pub items: Vec<RoundItem>,
    pub manager: ManagerLock,
    pub status: RoundStatus,
    pub created_by: ProfileId,
    pub created_at: DateTime<Utc>,
}

impl PriceRound {
    /// The snapshot item for a product, if the round collects it.
    pub fn item_for(&self, product_id: ProductId) -> Option<&RoundItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.items.iter().map(|item| item.product_id)
    }
}

/// Role of the caller as asserted by the authentication gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
}

impl Role {
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub profile_id: ProfileId,
    pub role: Role,
}

impl Actor {
    pub fn admin(profile_id: ProfileId) -> Self {
        Actor {
            profile_id,
            role: Role::Admin,
        }
    }

    pub fn manager(profile_id: ProfileId) -> Self {
        Actor {
            profile_id,
            role: Role::Manager,
        }
    }
}
