use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_field, AppState};
use crate::db::OpenOutcome;
use crate::domain::{Actor, BusinessDate, MarketId, PriceRound, RoundId, RoundItem};
use crate::engine::{OpenRoundRequest, RoundProgress, RoundView};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    pub product_id: String,
    pub unit_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRoundBody {
    pub market_id: String,
    pub for_date: Option<String>,
    pub items: Option<Vec<ItemBody>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRoundResponse {
    pub round_id: RoundId,
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRowResponse {
    pub product_id: String,
    pub unit_id: String,
    pub price: Option<String>,
    pub price_entry_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    pub id: String,
    pub market_id: String,
    pub for_date: String,
    pub status: String,
    pub manager_id: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub items: Vec<RoundRowResponse>,
}

impl RoundResponse {
    pub(crate) fn header(round: &PriceRound) -> Self {
        Self {
            id: round.id.to_string(),
            market_id: round.market_id.to_string(),
            for_date: round.for_date.to_string(),
            status: round.status.to_string(),
            manager_id: round.manager.manager().map(|id| id.to_string()),
            created_by: round.created_by.to_string(),
            created_at: round.created_at.to_rfc3339(),
            items: round
                .items
                .iter()
                .map(|item| RoundRowResponse {
                    product_id: item.product_id.to_string(),
                    unit_id: item.unit_id.to_string(),
                    price: None,
                    price_entry_id: None,
                })
                .collect(),
        }
    }

    fn from_view(view: RoundView) -> Self {
        Self {
            items: view
                .rows
                .into_iter()
                .map(|row| RoundRowResponse {
                    product_id: row.product_id.to_string(),
                    unit_id: row.unit_id.to_string(),
                    price: row.price.map(|p| p.to_canonical_string()),
                    price_entry_id: row.entry_id.map(|id| id.to_string()),
                })
                .collect(),
            ..Self::header(&view.round)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRoundResponse {
    pub round_id: RoundId,
    pub changed: bool,
}

pub async fn open_round(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<OpenRoundBody>,
) -> Result<(StatusCode, Json<OpenRoundResponse>), AppError> {
    let market_id: MarketId = parse_field("marketId", &body.market_id)?;

    let mut request = OpenRoundRequest::new(market_id, actor);
    if let Some(raw) = body.for_date.as_deref() {
        request = request.for_date(parse_field::<BusinessDate>("forDate", raw)?);
    }
    if let Some(items) = body.items {
        let items = items
            .iter()
            .map(|item| -> Result<RoundItem, AppError> {
                Ok(RoundItem {
                    product_id: parse_field("productId", &item.product_id)?,
                    unit_id: parse_field("unitId", &item.unit_id)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        request = request.with_items(items);
    }

    let outcome = state.engine.open_round(request).await?;
    let (status, created) = match outcome {
        OpenOutcome::Created(_) => (StatusCode::CREATED, true),
        OpenOutcome::Existing(_) => (StatusCode::OK, false),
    };

    Ok((
        status,
        Json(OpenRoundResponse {
            round_id: outcome.round_id(),
            created,
        }),
    ))
}

pub async fn get_active_for_market(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Query(params): Query<DateQuery>,
) -> Result<Json<RoundResponse>, AppError> {
    let market_id: MarketId = parse_field("marketId", &market_id)?;
    let date = params
        .date
        .as_deref()
        .map(|raw| parse_field::<BusinessDate>("date", raw))
        .transpose()?;

    let view = state
        .engine
        .get_active_for_market(market_id, date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No round for market {}", market_id)))?;

    Ok(Json(RoundResponse::from_view(view)))
}

pub async fn close_round(
    State(state): State<AppState>,
    _actor: Actor,
    Path(round_id): Path<String>,
) -> Result<Json<CloseRoundResponse>, AppError> {
    let round_id: RoundId = parse_field("roundId", &round_id)?;
    let changed = state.engine.close_round(round_id).await?;
    Ok(Json(CloseRoundResponse { round_id, changed }))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
) -> Result<Json<RoundProgress>, AppError> {
    let round_id: RoundId = parse_field("roundId", &round_id)?;
    Ok(Json(state.engine.status(round_id).await?))
}
