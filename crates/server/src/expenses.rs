//! Shared-expense endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::expense::{ExpenseCreated, ExpenseNew, ExpenseView, ExpensesResponse};
use engine::MoneyCents;

use crate::{ServerError, server::ServerState, topics::status_view, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let amount: MoneyCents = payload.amount.parse()?;
    let expense_id = state
        .engine
        .create_expense(
            &topic_id,
            &user.username,
            &payload.description,
            amount,
            payload.date,
            payload.notes.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ExpenseCreated { expense_id })))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(topic_id): Path<String>,
) -> Result<Json<ExpensesResponse>, ServerError> {
    let (expense_list, status) = state.engine.list_expenses(&topic_id, &user.username).await?;

    let expenses = expense_list
        .into_iter()
        .map(|expense| ExpenseView {
            id: expense.id,
            description: expense.description,
            amount: expense.amount.to_string(),
            currency: expense.currency.as_str().to_string(),
            payer_user_id: expense.payer_user_id,
            date: expense.date,
            notes: expense.notes,
            created_at: expense.created_at,
        })
        .collect();

    Ok(Json(ExpensesResponse {
        expenses,
        status: status_view(status),
    }))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((topic_id, expense_id)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(&topic_id, &expense_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
