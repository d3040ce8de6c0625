//! Tests against a live PostgreSQL database configured as connection `TEST`
//! (`EXTENDEDDB_TEST_TYPE`, `EXTENDEDDB_TEST_HOST`, ...). They return early
//! when `EXTENDEDDB_TEST_HOST` is not set.

use extended_db::utils::time::{deserialize_offset_date_time, serialize_offset_date_time};
use extended_db::{Column, DatabaseValue, DbError, Entity, ExtendedDb, register_entities};
use serde::{Deserialize, Serialize};
use sqlx::{Error, Row, postgres::PgRow};
use time::OffsetDateTime;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TestAccount {
    id: u64,
    email: String,
    nickname: Option<String>,
    active: bool,
    balance: i64,
    #[serde(
        serialize_with = "serialize_offset_date_time",
        deserialize_with = "deserialize_offset_date_time"
    )]
    created_at: Option<OffsetDateTime>,
}

impl TestAccount {
    fn new(email: &str) -> Self {
        TestAccount {
            email: email.to_string(),
            active: true,
            ..Default::default()
        }
    }
}

impl Entity for TestAccount {
    fn columns() -> Vec<Column> {
        vec![
            Column::id(),
            Column::new("email", "TEXT"),
            Column::new("nickname", "TEXT").nullable(),
            Column::new("active", "BOOLEAN"),
            Column::new("balance", "BIGINT"),
            Column::new("created_at", "TIMESTAMPTZ").default_value("now()"),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, Error> {
        Ok(TestAccount {
            id: row.try_get::<i64, _>("id")? as u64,
            email: row.try_get("email")?,
            nickname: row.try_get("nickname")?,
            active: row.try_get("active")?,
            balance: row.try_get("balance")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Serialize, Default)]
struct AccountFilter {
    email: String,
    active: bool,
    balance: i64,
}

static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn connect() -> Option<ExtendedDb> {
    dotenvy::dotenv().ok();
    if std::env::var("EXTENDEDDB_TEST_HOST").is_err() {
        eprintln!("EXTENDEDDB_TEST_HOST is not set, skipping");
        return None;
    }
    let db = ExtendedDb::connect("TEST").await.unwrap();
    MIGRATED
        .get_or_init(|| async {
            register_entities!(db, TestAccount).await.unwrap();
        })
        .await;
    Some(db)
}

fn unique_email(tag: &str) -> String {
    format!(
        "{}-{}@extended-db.test",
        tag,
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    )
}

#[tokio::test]
async fn test_connect() {
    let Some(db) = connect().await else { return };
    assert_eq!(db.connection_name(), "TEST");
    db.ping().await.unwrap();
}

#[tokio::test]
async fn test_register_entities_is_repeatable() {
    let Some(db) = connect().await else { return };
    register_entities!(db, TestAccount).await.unwrap();
}

#[tokio::test]
async fn test_create_update_select_delete() {
    let Some(db) = connect().await else { return };

    let mut account = TestAccount::new(&unique_email("crud"));
    db.create(&mut account).await.unwrap();
    assert_ne!(account.id, 0);
    assert!(account.created_at.is_some());

    let mut duplicate = account.clone();
    assert!(matches!(
        db.create(&mut duplicate).await,
        Err(DbError::IdAlreadySet { entity }) if entity == "TestAccount"
    ));

    account.nickname = Some("ace".to_string());
    account.balance = 250;
    db.update(&mut account).await.unwrap();

    let found: TestAccount = db.select_by_id(account.id).await.unwrap();
    assert_eq!(found, account);

    assert_eq!(db.delete_by_id::<TestAccount>(account.id).await.unwrap(), 1);
    assert!(matches!(
        db.select_by_id::<TestAccount>(account.id).await,
        Err(DbError::NotFound { id, .. }) if id == account.id
    ));
    assert_eq!(db.delete_by_id::<TestAccount>(account.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_requires_id() {
    let Some(db) = connect().await else { return };
    let mut account = TestAccount::new(&unique_email("blank"));
    assert!(matches!(
        db.update(&mut account).await,
        Err(DbError::BlankId { .. })
    ));
}

#[tokio::test]
async fn test_update_inserts_missing_row() {
    let Some(db) = connect().await else { return };

    let mut account = TestAccount::new(&unique_email("save"));
    db.create(&mut account).await.unwrap();
    db.delete_by_id::<TestAccount>(account.id).await.unwrap();

    db.update(&mut account).await.unwrap();
    let found: TestAccount = db.select_by_id(account.id).await.unwrap();
    assert_eq!(found.email, account.email);
}

#[tokio::test]
async fn test_update_fills_defaults_for_new_and_existing_rows() {
    let Some(db) = connect().await else { return };

    let mut placeholder = TestAccount::new(&unique_email("defaults"));
    db.create(&mut placeholder).await.unwrap();
    db.delete_by_id::<TestAccount>(placeholder.id).await.unwrap();

    let mut fresh = TestAccount::new(&placeholder.email);
    fresh.id = placeholder.id;
    db.update(&mut fresh).await.unwrap();
    let stamped = fresh.created_at;
    assert!(stamped.is_some());

    fresh.created_at = None;
    fresh.balance = 7;
    db.update(&mut fresh).await.unwrap();
    assert_eq!(fresh.created_at, stamped);
    assert_eq!(fresh.balance, 7);
}

#[tokio::test]
async fn test_filter_and_select_all() {
    let Some(db) = connect().await else { return };

    let email = unique_email("filter");
    let mut rich = TestAccount::new(&email);
    rich.balance = 1_000;
    db.create(&mut rich).await.unwrap();
    let mut inactive = TestAccount::new(&email);
    inactive.active = false;
    db.create(&mut inactive).await.unwrap();

    let by_email: Vec<TestAccount> = db
        .filter(&AccountFilter {
            email: email.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_email, vec![rich.clone(), inactive.clone()]);

    let rich_only: Vec<TestAccount> = db
        .filter(&AccountFilter {
            email: email.clone(),
            balance: 1_000,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rich_only, vec![rich.clone()]);

    let inactive_only: Vec<TestAccount> = db
        .filter_by(vec![
            ("email", email.clone().into()),
            ("active", DatabaseValue::Boolean(false)),
        ])
        .await
        .unwrap();
    assert_eq!(inactive_only, vec![inactive.clone()]);

    let nobody: Vec<TestAccount> = db
        .filter(&AccountFilter {
            email: unique_email("nobody"),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(nobody.is_empty());

    let all: Vec<TestAccount> = db.select_all().await.unwrap();
    assert!(all.contains(&rich));
    assert!(all.contains(&inactive));
}

#[tokio::test]
async fn test_transaction_commits() {
    let Some(db) = connect().await else { return };

    let email = unique_email("commit");
    let created = db
        .transaction(|tx| {
            let email = email.clone();
            Box::pin(async move {
                assert_eq!(tx.connection_name(), "TEST");
                let mut account = TestAccount::new(&email);
                tx.create(&mut account).await?;
                account.balance = 5;
                tx.update(&mut account).await?;
                Ok(account)
            })
        })
        .await
        .unwrap();

    let found: TestAccount = db.select_by_id(created.id).await.unwrap();
    assert_eq!(found.balance, 5);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_error() {
    let Some(db) = connect().await else { return };

    let email = unique_email("rollback");
    let result: Result<(), DbError> = db
        .transaction(|tx| {
            let email = email.clone();
            Box::pin(async move {
                let mut account = TestAccount::new(&email);
                tx.create(&mut account).await?;
                tx.select_by_id::<TestAccount>(u64::from(u32::MAX)).await?;
                Ok(())
            })
        })
        .await;
    assert!(matches!(result, Err(DbError::NotFound { .. })));

    let leftovers: Vec<TestAccount> = db
        .filter_by(vec![("email", email.into())])
        .await
        .unwrap();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_begin_and_rollback() {
    let Some(db) = connect().await else { return };

    let email = unique_email("manual");
    let mut tx = db.begin().await.unwrap();
    let mut account = TestAccount::new(&email);
    tx.create(&mut account).await.unwrap();
    let seen: Vec<TestAccount> = tx
        .filter_by(vec![("email", email.clone().into())])
        .await
        .unwrap();
    assert_eq!(seen.len(), 1);
    tx.rollback().await.unwrap();

    assert!(matches!(
        db.select_by_id::<TestAccount>(account.id).await,
        Err(DbError::NotFound { .. })
    ));
}
