//! Administrative round corrections. Every route requires the admin role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::actor::require_admin;
use crate::api::rounds::RoundResponse;
use crate::api::{parse_field, AppState};
use crate::domain::{Actor, BusinessDate, RoundId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDateBody {
    pub for_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReopenResponse {
    pub round_id: RoundId,
    pub changed: bool,
}

pub async fn reopen_round(
    State(state): State<AppState>,
    actor: Actor,
    Path(round_id): Path<String>,
) -> Result<Json<ReopenResponse>, AppError> {
    require_admin(&actor)?;
    let round_id: RoundId = parse_field("roundId", &round_id)?;
    let changed = state.engine.reopen_round(round_id).await?;
    Ok(Json(ReopenResponse { round_id, changed }))
}

pub async fn update_for_date(
    State(state): State<AppState>,
    actor: Actor,
    Path(round_id): Path<String>,
    Json(body): Json<UpdateDateBody>,
) -> Result<Json<RoundResponse>, AppError> {
    require_admin(&actor)?;
    let round_id: RoundId = parse_field("roundId", &round_id)?;
    let for_date: BusinessDate = parse_field("forDate", &body.for_date)?;
    let round = state.engine.update_for_date(round_id, for_date).await?;
    Ok(Json(RoundResponse::header(&round)))
}

pub async fn remove_round(
    State(state): State<AppState>,
    actor: Actor,
    Path(round_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_admin(&actor)?;
    let round_id: RoundId = parse_field("roundId", &round_id)?;
    state.engine.remove_round(round_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
