pub mod actor;
pub mod admin;
pub mod health;
pub mod prices;
pub mod rounds;

use crate::db::Repository;
use crate::engine::RoundEngine;
use crate::error::AppError;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub engine: Arc<RoundEngine>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, engine: Arc<RoundEngine>) -> Self {
        Self { repo, engine }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/rounds", post(rounds::open_round))
        .route(
            "/v1/markets/:market_id/round",
            get(rounds::get_active_for_market),
        )
        .route("/v1/rounds/:round_id/close", post(rounds::close_round))
        .route("/v1/rounds/:round_id/status", get(rounds::get_status))
        .route("/v1/rounds/:round_id/prices", post(prices::submit_price))
        .route(
            "/v1/rounds/:round_id/prices/:product_id/history",
            get(prices::get_round_product_history),
        )
        .route("/v1/prices/:entry_id/history", get(prices::get_history))
        .route(
            "/v1/admin/rounds/:round_id/reopen",
            post(admin::reopen_round),
        )
        .route("/v1/admin/rounds/:round_id/date", put(admin::update_for_date))
        .route("/v1/admin/rounds/:round_id", delete(admin::remove_round))
        .layer(cors)
        .with_state(state)
}

/// Parse an identifier or date from a path/query/body string.
pub(crate) fn parse_field<T: FromStr>(field: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>()
        .map_err(|_| AppError::BadRequest(format!("Invalid {}: {}", field, raw)))
}
