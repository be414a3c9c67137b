use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, MoneyCents};
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

async fn member_id_of(engine: &Engine, topic_id: &str, user: &str) -> String {
    engine
        .list_members(topic_id, "anna")
        .await
        .unwrap()
        .members
        .into_iter()
        .find(|m| m.user_id.as_deref() == Some(user))
        .unwrap()
        .id
}

#[tokio::test]
async fn record_and_list_settlements() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, invite_token) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    engine.join_by_token(&invite_token, "bruno").await.unwrap();

    let bruno = member_id_of(&engine, &topic_id, "bruno").await;
    let anna = member_id_of(&engine, &topic_id, "anna").await;

    let settlement_id = engine
        .record_settlement(
            &topic_id,
            "bruno",
            &bruno,
            &anna,
            MoneyCents::new(1250),
            Some("cash, at the station"),
        )
        .await
        .unwrap();

    let settlements = engine.list_settlements(&topic_id, "anna").await.unwrap();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].id, settlement_id);
    assert_eq!(settlements[0].from_member_id, bruno);
    assert_eq!(settlements[0].to_member_id, anna);
    assert_eq!(settlements[0].amount.cents(), 1250);
    assert_eq!(settlements[0].note.as_deref(), Some("cash, at the station"));
}

#[tokio::test]
async fn settlements_do_not_change_balances() {
    let (engine, _db) = engine_with_db(&["anna", "bruno"]).await;
    let (topic_id, invite_token) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    engine.join_by_token(&invite_token, "bruno").await.unwrap();

    engine
        .create_expense(
            &topic_id,
            "anna",
            "hotel",
            MoneyCents::new(1000),
            None,
            None,
        )
        .await
        .unwrap();

    let bruno = member_id_of(&engine, &topic_id, "bruno").await;
    let anna = member_id_of(&engine, &topic_id, "anna").await;
    engine
        .record_settlement(&topic_id, "bruno", &bruno, &anna, MoneyCents::new(500), None)
        .await
        .unwrap();

    // The audit log is not an input to balance computation.
    let report = engine.topic_balances(&topic_id, "anna").await.unwrap();
    let anna_net = report
        .balances
        .iter()
        .find(|b| b.display_name == "anna")
        .unwrap()
        .net;
    assert_eq!(anna_net.cents(), 500);
}

#[tokio::test]
async fn record_settlement_validates_members_and_amount() {
    let (engine, _db) = engine_with_db(&["anna", "bruno", "mallory"]).await;
    let (topic_id, invite_token) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    engine.join_by_token(&invite_token, "bruno").await.unwrap();
    let (other_id, _) = engine.create_topic("Dinner", "EUR", "anna").await.unwrap();

    let bruno = member_id_of(&engine, &topic_id, "bruno").await;
    let anna = member_id_of(&engine, &topic_id, "anna").await;

    // Same member on both sides.
    assert!(matches!(
        engine
            .record_settlement(&topic_id, "anna", &anna, &anna, MoneyCents::new(100), None)
            .await,
        Err(EngineError::InvalidInput(_))
    ));

    // Member row from a different topic.
    assert!(matches!(
        engine
            .record_settlement(&other_id, "anna", &bruno, &anna, MoneyCents::new(100), None)
            .await,
        Err(EngineError::KeyNotFound(_))
    ));

    // Non-positive amount.
    assert!(matches!(
        engine
            .record_settlement(&topic_id, "anna", &bruno, &anna, MoneyCents::ZERO, None)
            .await,
        Err(EngineError::InvalidAmount(_))
    ));

    // Outsiders cannot record.
    assert!(matches!(
        engine
            .record_settlement(
                &topic_id,
                "mallory",
                &bruno,
                &anna,
                MoneyCents::new(100),
                None
            )
            .await,
        Err(EngineError::Forbidden(_))
    ));
}
