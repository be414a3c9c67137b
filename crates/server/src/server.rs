use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{balances, expenses, join_requests, settlements, topics, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route("/topics", post(topics::create).get(topics::list))
        .route("/topics/{topic_id}/members", get(topics::members))
        .route("/topics/{topic_id}/invite/rotate", post(topics::rotate_invite))
        .route("/topics/{topic_id}/leave", post(topics::leave))
        .route("/topics/{topic_id}/close", post(topics::close))
        .route("/topics/{topic_id}/open", post(topics::open))
        .route("/join/{token}", post(topics::join_by_token))
        .route(
            "/topics/{topic_id}/join-requests",
            post(join_requests::create).get(join_requests::list),
        )
        .route(
            "/topics/{topic_id}/join-requests/{request_id}/approve",
            post(join_requests::approve),
        )
        .route(
            "/topics/{topic_id}/join-requests/{request_id}/deny",
            post(join_requests::deny),
        )
        .route(
            "/topics/{topic_id}/expenses",
            post(expenses::create).get(expenses::list),
        )
        .route(
            "/topics/{topic_id}/expenses/{expense_id}",
            axum::routing::delete(expenses::delete),
        )
        .route("/topics/{topic_id}/balances", get(balances::get))
        .route(
            "/topics/{topic_id}/settlements",
            post(settlements::create).get(settlements::list),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
