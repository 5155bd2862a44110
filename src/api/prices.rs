use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{parse_field, AppState};
use crate::domain::{Actor, NoteType, PriceEntry, PriceHistoryEntry, RoundId};
use crate::engine::SubmitPriceRequest;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPriceBody {
    pub product_id: String,
    pub price: Decimal,
    pub note_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPriceResponse {
    pub price_entry_id: String,
    pub history_id: String,
    pub before_price: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntryResponse {
    pub id: String,
    pub market_id: String,
    pub product_id: String,
    pub for_date: String,
    pub unit_id: String,
    pub price: String,
    pub note_type: Option<NoteType>,
    pub notes: Option<String>,
    pub last_editor_id: String,
    pub updated_at: String,
}

impl From<PriceEntry> for PriceEntryResponse {
    fn from(entry: PriceEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            market_id: entry.market_id.to_string(),
            product_id: entry.product_id.to_string(),
            for_date: entry.for_date.to_string(),
            unit_id: entry.unit_id.to_string(),
            price: entry.price.to_canonical_string(),
            note_type: entry.note_type,
            notes: entry.notes,
            last_editor_id: entry.last_editor_id.to_string(),
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItemResponse {
    pub id: String,
    pub before_price: Option<String>,
    pub after_price: String,
    pub editor_id: String,
    pub note_type: Option<NoteType>,
    pub notes: Option<String>,
    pub recorded_at: String,
}

impl From<PriceHistoryEntry> for HistoryItemResponse {
    fn from(item: PriceHistoryEntry) -> Self {
        Self {
            id: item.id.to_string(),
            before_price: item.before_price.map(|p| p.to_canonical_string()),
            after_price: item.after_price.to_canonical_string(),
            editor_id: item.editor_id.to_string(),
            note_type: item.note_type,
            notes: item.notes,
            recorded_at: item.recorded_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entry: PriceEntryResponse,
    pub history: Vec<HistoryItemResponse>,
}

impl HistoryResponse {
    fn new(entry: PriceEntry, history: Vec<PriceHistoryEntry>) -> Self {
        Self {
            entry: entry.into(),
            history: history.into_iter().map(Into::into).collect(),
        }
    }
}

/// The caller is recorded as the editor.
pub async fn submit_price(
    State(state): State<AppState>,
    actor: Actor,
    Path(round_id): Path<String>,
    Json(body): Json<SubmitPriceBody>,
) -> Result<(StatusCode, Json<SubmitPriceResponse>), AppError> {
    let round_id: RoundId = parse_field("roundId", &round_id)?;
    let product_id = parse_field("productId", &body.product_id)?;
    let note_type = body
        .note_type
        .as_deref()
        .map(|raw| parse_field::<NoteType>("noteType", raw))
        .transpose()?;

    let mut request = SubmitPriceRequest::new(round_id, product_id, actor.profile_id, body.price);
    request.note_type = note_type;
    request.notes = body.notes;

    let outcome = state.engine.submit_price(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitPriceResponse {
            price_entry_id: outcome.entry_id.to_string(),
            history_id: outcome.history_id.to_string(),
            before_price: outcome.before_price.map(|p| p.to_canonical_string()),
        }),
    ))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let entry_id = parse_field("priceEntryId", &entry_id)?;
    let (entry, history) = state.engine.price_history(entry_id).await?;
    Ok(Json(HistoryResponse::new(entry, history)))
}

pub async fn get_round_product_history(
    State(state): State<AppState>,
    Path((round_id, product_id)): Path<(String, String)>,
) -> Result<Json<HistoryResponse>, AppError> {
    let round_id: RoundId = parse_field("roundId", &round_id)?;
    let product_id = parse_field("productId", &product_id)?;
    let (entry, history) = state
        .engine
        .entry_history_for_round(round_id, product_id)
        .await?;
    Ok(Json(HistoryResponse::new(entry, history)))
}
