//! Balance endpoint: per-member net positions and suggested transfers,
//! recomputed fresh on every call.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use api_types::{
    balance::{BalanceView, BalancesResponse, TransferView},
    membership::{MemberRole, MemberView},
};

use crate::{ServerError, server::ServerState, user};

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let report = state
        .engine
        .topic_balances(&topic_id, &user.username)
        .await?;

    let members = report
        .members
        .into_iter()
        .map(|member| MemberView {
            id: member.id,
            user_id: member.user_id,
            display_name: member.display_name,
            role: match member.role {
                engine::MemberRole::Owner => MemberRole::Owner,
                engine::MemberRole::Member => MemberRole::Member,
            },
            joined_at: member.joined_at,
        })
        .collect();

    let balances = report
        .balances
        .into_iter()
        .map(|position| BalanceView {
            member_id: position.member_id,
            display_name: position.display_name,
            net: position.net.to_string(),
            net_minor: position.net.cents(),
        })
        .collect();

    let transfers = report
        .transfers
        .into_iter()
        .map(|transfer| TransferView {
            from_member_id: transfer.from_member_id,
            to_member_id: transfer.to_member_id,
            amount: transfer.amount.to_string(),
            amount_minor: transfer.amount.cents(),
        })
        .collect();

    Ok(Json(BalancesResponse {
        members,
        balances,
        transfers,
    }))
}
