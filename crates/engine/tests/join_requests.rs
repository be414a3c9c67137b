use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, JoinRequestOutcome, JoinRequestStatus};
use migration::MigratorTrait;

async fn engine_with_db(usernames: &[&str]) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in usernames {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![(*username).into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn pending_id(outcome: JoinRequestOutcome) -> String {
    match outcome {
        JoinRequestOutcome::Pending { request_id } => request_id,
        JoinRequestOutcome::AlreadyMember => panic!("expected a pending request"),
    }
}

async fn member_rows(engine: &Engine, topic_id: &str, owner: &str, user: &str) -> usize {
    engine
        .list_members(topic_id, owner)
        .await
        .unwrap()
        .members
        .iter()
        .filter(|m| m.user_id.as_deref() == Some(user))
        .count()
}

#[tokio::test]
async fn store_reports_already_member() {
    let (engine, _db) = engine_with_db(&["anna"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();

    let outcome = engine
        .create_join_request(&topic_id, "anna", None)
        .await
        .unwrap();
    assert_eq!(outcome, JoinRequestOutcome::AlreadyMember);
}

#[tokio::test]
async fn store_is_idempotent_for_pending_requests() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();

    let first = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", Some("hi"))
            .await
            .unwrap(),
    );
    let second = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );
    assert_eq!(first, second);

    let requests = engine.list_join_requests(&topic_id, "anna").await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, JoinRequestStatus::Pending);
    assert_eq!(requests[0].message.as_deref(), Some("hi"));
}

#[tokio::test]
async fn store_rejects_overlong_message() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();

    let message = "x".repeat(501);
    assert!(matches!(
        engine
            .create_join_request(&topic_id, "bruno", Some(&message))
            .await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn approve_creates_membership_and_records_decision() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    let status = engine
        .approve_join_request(&topic_id, &request_id, "anna")
        .await
        .unwrap();
    assert_eq!(status, JoinRequestStatus::Approved);
    assert_eq!(member_rows(&engine, &topic_id, "anna", "bruno").await, 1);

    let requests = engine.list_join_requests(&topic_id, "anna").await.unwrap();
    assert_eq!(requests[0].status, JoinRequestStatus::Approved);
    assert_eq!(requests[0].decided_by_user_id.as_deref(), Some("anna"));
    assert!(requests[0].decided_at.is_some());
}

#[tokio::test]
async fn approve_is_idempotent() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    for _ in 0..2 {
        let status = engine
            .approve_join_request(&topic_id, &request_id, "anna")
            .await
            .unwrap();
        assert_eq!(status, JoinRequestStatus::Approved);
    }
    assert_eq!(member_rows(&engine, &topic_id, "anna", "bruno").await, 1);
}

#[tokio::test]
async fn deny_does_not_create_membership() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    let status = engine
        .deny_join_request(&topic_id, &request_id, "anna")
        .await
        .unwrap();
    assert_eq!(status, JoinRequestStatus::Denied);
    assert_eq!(member_rows(&engine, &topic_id, "anna", "bruno").await, 0);
}

#[tokio::test]
async fn approve_after_deny_returns_denied_as_is() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    engine
        .deny_join_request(&topic_id, &request_id, "anna")
        .await
        .unwrap();
    let status = engine
        .approve_join_request(&topic_id, &request_id, "anna")
        .await
        .unwrap();
    assert_eq!(status, JoinRequestStatus::Denied);
    assert_eq!(member_rows(&engine, &topic_id, "anna", "bruno").await, 0);
}

#[tokio::test]
async fn deny_after_approve_keeps_approval() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    engine
        .approve_join_request(&topic_id, &request_id, "anna")
        .await
        .unwrap();
    let status = engine
        .deny_join_request(&topic_id, &request_id, "anna")
        .await
        .unwrap();
    assert_eq!(status, JoinRequestStatus::Approved);
    assert_eq!(member_rows(&engine, &topic_id, "anna", "bruno").await, 1);
}

#[tokio::test]
async fn stale_pending_after_leave_and_rejoin_converges() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();

    // First request is approved, then the member leaves.
    let first = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );
    engine
        .approve_join_request(&topic_id, &first, "anna")
        .await
        .unwrap();
    engine.leave_topic(&topic_id, "bruno").await.unwrap();

    // A second pending request exists next to the old approved row. An
    // approval cannot write a second approved row; it keeps the membership
    // and drops the now-redundant pending row.
    let second = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );
    let status = engine
        .approve_join_request(&topic_id, &second, "anna")
        .await
        .unwrap();
    assert_eq!(status, JoinRequestStatus::Approved);
    assert_eq!(member_rows(&engine, &topic_id, "anna", "bruno").await, 1);

    let requests = engine.list_join_requests(&topic_id, "anna").await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].id, first);
    assert_eq!(requests[0].status, JoinRequestStatus::Approved);
}

#[tokio::test]
async fn concurrent_approvals_converge_to_one_membership() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    let engine = Arc::new(engine);
    let (first, second) = tokio::join!(
        engine.approve_join_request(&topic_id, &request_id, "anna"),
        engine.approve_join_request(&topic_id, &request_id, "anna"),
    );
    assert_eq!(first.unwrap(), JoinRequestStatus::Approved);
    assert_eq!(second.unwrap(), JoinRequestStatus::Approved);
    assert_eq!(member_rows(&engine, &topic_id, "anna", "bruno").await, 1);
}

#[tokio::test]
async fn decisions_are_owner_only() {
    let (engine, _db) = engine_with_db(&["anna", "bruno", "carla"]).await;
    let (topic_id, invite_token) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    engine.join_by_token(&invite_token, "carla").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    assert!(matches!(
        engine
            .approve_join_request(&topic_id, &request_id, "carla")
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.list_join_requests(&topic_id, "carla").await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn request_from_another_topic_is_not_found() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let (other_id, _) = engine.create_topic("Dinner", "EUR", "anna").await.unwrap();
    let request_id = pending_id(
        engine
            .create_join_request(&topic_id, "bruno", None)
            .await
            .unwrap(),
    );

    assert!(matches!(
        engine
            .approve_join_request(&other_id, &request_id, "anna")
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
}
