use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, MoneyCents, TopicStatus};
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

async fn split_shares_in_member_order(db: &DatabaseConnection, expense_id: &str) -> Vec<i64> {
    let backend = db.get_database_backend();
    let rows = db
        .query_all(Statement::from_sql_and_values(
            backend,
            "SELECT es.share_minor AS share_minor \
             FROM expense_splits es \
             JOIN topic_members tm ON tm.id = es.member_id \
             WHERE es.expense_id = ? \
             ORDER BY tm.joined_at ASC, tm.id ASC",
            vec![expense_id.into()],
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|row| row.try_get::<i64>("", "share_minor").unwrap())
        .collect()
}

#[tokio::test]
async fn create_expense_snapshots_equal_split() {
    let (engine, db) = engine_with_db(&["anna", "bruno", "carla"]).await;
    let (topic_id, invite_token) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    engine.join_by_token(&invite_token, "bruno").await.unwrap();
    engine.join_by_token(&invite_token, "carla").await.unwrap();

    let expense_id = engine
        .create_expense(
            &topic_id,
            "anna",
            "dinner",
            MoneyCents::new(1000),
            None,
            None,
        )
        .await
        .unwrap();

    // 10.00 over three members: 3.34 to the earliest member, 3.33 to the
    // rest; the snapshot sums exactly to the amount.
    let shares = split_shares_in_member_order(&db, &expense_id).await;
    assert_eq!(shares, vec![334, 333, 333]);
}

#[tokio::test]
async fn create_expense_rejects_closed_topic() {
    let (engine, _db) = engine_with_db(&["anna"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    engine
        .set_topic_status(&topic_id, TopicStatus::Closed, "anna")
        .await
        .unwrap();

    assert!(matches!(
        engine
            .create_expense(
                &topic_id,
                "anna",
                "dinner",
                MoneyCents::new(1000),
                None,
                None
            )
            .await,
        Err(EngineError::TopicClosed(_))
    ));
}

#[tokio::test]
async fn create_expense_requires_membership_and_positive_amount() {
    let (engine, _db) = engine_with_db(&["anna", "mallory"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();

    assert!(matches!(
        engine
            .create_expense(
                &topic_id,
                "mallory",
                "dinner",
                MoneyCents::new(1000),
                None,
                None
            )
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine
            .create_expense(&topic_id, "anna", "dinner", MoneyCents::ZERO, None, None)
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
}

#[tokio::test]
async fn list_expenses_is_newest_first_and_carries_status() {
    let (engine, _db) = engine_with_db(&["anna"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();

    engine
        .create_expense(
            &topic_id,
            "anna",
            "first",
            MoneyCents::new(100),
            None,
            None,
        )
        .await
        .unwrap();
    engine
        .create_expense(
            &topic_id,
            "anna",
            "second",
            MoneyCents::new(200),
            None,
            None,
        )
        .await
        .unwrap();

    let (expenses, status) = engine.list_expenses(&topic_id, "anna").await.unwrap();
    assert_eq!(status, TopicStatus::Open);
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0].description, "second");
    assert_eq!(expenses[1].description, "first");
    assert_eq!(expenses[0].currency.as_str(), "EUR");
}

#[tokio::test]
async fn delete_expense_is_owner_or_payer_only_and_cascades_splits() {
    let (engine, db) = engine_with_db(&["anna", "bruno", "carla"]).await;
    let (topic_id, invite_token) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    engine.join_by_token(&invite_token, "bruno").await.unwrap();
    engine.join_by_token(&invite_token, "carla").await.unwrap();

    let paid_by_bruno = engine
        .create_expense(
            &topic_id,
            "bruno",
            "taxi",
            MoneyCents::new(900),
            None,
            None,
        )
        .await
        .unwrap();

    // Another member is neither owner nor payer.
    assert!(matches!(
        engine.delete_expense(&topic_id, &paid_by_bruno, "carla").await,
        Err(EngineError::Forbidden(_))
    ));

    // The payer can delete; split rows go with the expense.
    engine
        .delete_expense(&topic_id, &paid_by_bruno, "bruno")
        .await
        .unwrap();
    assert!(split_shares_in_member_order(&db, &paid_by_bruno)
        .await
        .is_empty());

    // The owner can delete another member's expense, even on a closed topic.
    let paid_by_carla = engine
        .create_expense(
            &topic_id,
            "carla",
            "museum",
            MoneyCents::new(1500),
            None,
            None,
        )
        .await
        .unwrap();
    engine
        .set_topic_status(&topic_id, TopicStatus::Closed, "anna")
        .await
        .unwrap();
    engine
        .delete_expense(&topic_id, &paid_by_carla, "anna")
        .await
        .unwrap();

    let (expenses, _) = engine.list_expenses(&topic_id, "anna").await.unwrap();
    assert!(expenses.is_empty());
}

#[tokio::test]
async fn delete_expense_from_another_topic_is_not_found() {
    let (engine, _db) = engine_with_db(&["anna"]).await;
    let (topic_id, _) = engine.create_topic("Trip", "EUR", "anna").await.unwrap();
    let (other_id, _) = engine.create_topic("Dinner", "EUR", "anna").await.unwrap();
    let expense_id = engine
        .create_expense(
            &topic_id,
            "anna",
            "dinner",
            MoneyCents::new(100),
            None,
            None,
        )
        .await
        .unwrap();

    assert!(matches!(
        engine.delete_expense(&other_id, &expense_id, "anna").await,
        Err(EngineError::KeyNotFound(_))
    ));
}
