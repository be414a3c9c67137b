//! Topic and membership endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::{
    membership::{MemberRole, MemberView, MembersResponse},
    topic::{
        InviteTokenResponse, StatusResponse, TopicCreated, TopicJoined, TopicNew, TopicStatus,
        TopicView, TopicsResponse,
    },
};

use crate::{ServerError, server::ServerState, user};

pub(crate) fn status_view(status: engine::TopicStatus) -> TopicStatus {
    match status {
        engine::TopicStatus::Open => TopicStatus::Open,
        engine::TopicStatus::Closed => TopicStatus::Closed,
    }
}

fn member_view(member: engine::Member) -> MemberView {
    MemberView {
        id: member.id,
        user_id: member.user_id,
        display_name: member.display_name,
        role: match member.role {
            engine::MemberRole::Owner => MemberRole::Owner,
            engine::MemberRole::Member => MemberRole::Member,
        },
        joined_at: member.joined_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TopicNew>,
) -> Result<(StatusCode, Json<TopicCreated>), ServerError> {
    let (topic_id, invite_token) = state
        .engine
        .create_topic(&payload.title, &payload.currency, &user.username)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TopicCreated {
            topic_id,
            invite_token,
        }),
    ))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<TopicsResponse>, ServerError> {
    let topics = state
        .engine
        .list_topics(&user.username)
        .await?
        .into_iter()
        .map(|summary| TopicView {
            id: summary.topic.id,
            title: summary.topic.title,
            currency: summary.topic.currency.as_str().to_string(),
            status: status_view(summary.topic.status),
            members: summary.member_count,
        })
        .collect();

    Ok(Json(TopicsResponse { topics }))
}

pub async fn members(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let overview = state.engine.list_members(&topic_id, &user.username).await?;

    Ok(Json(MembersResponse {
        members: overview.members.into_iter().map(member_view).collect(),
        invite_token: overview.invite_token,
        is_owner: overview.is_owner,
        status: status_view(overview.status),
    }))
}

pub async fn rotate_invite(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<InviteTokenResponse>, ServerError> {
    let invite_token = state
        .engine
        .rotate_invite(&topic_id, &user.username)
        .await?;
    Ok(Json(InviteTokenResponse { invite_token }))
}

pub async fn join_by_token(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<TopicJoined>, ServerError> {
    let topic_id = state.engine.join_by_token(&token, &user.username).await?;
    Ok(Json(TopicJoined { topic_id }))
}

pub async fn leave(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.leave_topic(&topic_id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn close(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<StatusResponse>, ServerError> {
    let status = state
        .engine
        .set_topic_status(&topic_id, engine::TopicStatus::Closed, &user.username)
        .await?;
    Ok(Json(StatusResponse {
        topic_id,
        status: status_view(status),
    }))
}

pub async fn open(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<StatusResponse>, ServerError> {
    let status = state
        .engine
        .set_topic_status(&topic_id, engine::TopicStatus::Open, &user.username)
        .await?;
    Ok(Json(StatusResponse {
        topic_id,
        status: status_view(status),
    }))
}
