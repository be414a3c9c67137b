//! Recorded-settlement endpoints (audit log of actual repayments).

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::settlement::{
    SettlementCreated, SettlementNew, SettlementView, SettlementsResponse,
};
use engine::MoneyCents;

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<SettlementCreated>), ServerError> {
    let amount: MoneyCents = payload.amount.parse()?;
    let settlement_id = state
        .engine
        .record_settlement(
            &topic_id,
            &user.username,
            &payload.from_member_id,
            &payload.to_member_id,
            amount,
            payload.note.as_deref(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SettlementCreated { settlement_id }),
    ))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<SettlementsResponse>, ServerError> {
    let settlements = state
        .engine
        .list_settlements(&topic_id, &user.username)
        .await?
        .into_iter()
        .map(|settlement| SettlementView {
            id: settlement.id,
            from_member_id: settlement.from_member_id,
            to_member_id: settlement.to_member_id,
            amount: settlement.amount.to_string(),
            note: settlement.note,
            settled_at: settlement.settled_at,
        })
        .collect();

    Ok(Json(SettlementsResponse { settlements }))
}
