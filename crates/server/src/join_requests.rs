//! Join-request endpoints (creation for requesters, decisions for owners).

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use api_types::join_request::{
    JoinRequestCreated, JoinRequestDecision, JoinRequestNew, JoinRequestStatus, JoinRequestView,
    JoinRequestsResponse,
};

use crate::{ServerError, server::ServerState, user};

fn status_view(status: engine::JoinRequestStatus) -> JoinRequestStatus {
    match status {
        engine::JoinRequestStatus::Pending => JoinRequestStatus::Pending,
        engine::JoinRequestStatus::Approved => JoinRequestStatus::Approved,
        engine::JoinRequestStatus::Denied => JoinRequestStatus::Denied,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
    Json(payload): Json<JoinRequestNew>,
) -> Result<Json<JoinRequestCreated>, ServerError> {
    let outcome = state
        .engine
        .create_join_request(&topic_id, &user.username, payload.message.as_deref())
        .await?;

    let created = match outcome {
        engine::JoinRequestOutcome::AlreadyMember => JoinRequestCreated {
            request_id: None,
            status: "already_member".to_string(),
        },
        engine::JoinRequestOutcome::Pending { request_id } => JoinRequestCreated {
            request_id: Some(request_id),
            status: "pending".to_string(),
        },
    };
    Ok(Json(created))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<JoinRequestsResponse>, ServerError> {
    let requests = state
        .engine
        .list_join_requests(&topic_id, &user.username)
        .await?
        .into_iter()
        .map(|request| JoinRequestView {
            id: request.id,
            requester_user_id: request.requester_user_id,
            status: status_view(request.status),
            message: request.message,
            decided_by_user_id: request.decided_by_user_id,
            decided_at: request.decided_at,
            created_at: request.created_at,
        })
        .collect();

    Ok(Json(JoinRequestsResponse { requests }))
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((topic_id, request_id)): Path<(String, String)>,
) -> Result<Json<JoinRequestDecision>, ServerError> {
    let status = state
        .engine
        .approve_join_request(&topic_id, &request_id, &user.username)
        .await?;
    Ok(Json(JoinRequestDecision {
        status: status_view(status),
    }))
}

pub async fn deny(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((topic_id, request_id)): Path<(String, String)>,
) -> Result<Json<JoinRequestDecision>, ServerError> {
    let status = state
        .engine
        .deny_join_request(&topic_id, &request_id, &user.username)
        .await?;
    Ok(Json(JoinRequestDecision {
        status: status_view(status),
    }))
}
