use chrono::{DateTime, Duration, TimeZone, Utc};
use cheddar_core::repo::TransactionSupport;
use cheddar_core::{
    DataModel, Entity, Filter, Migration, Operator, Readiness, RepoError, Repository, Row,
    RowError, SqliteRepository, SqliteStore,
};

const MIGRATIONS: &[Migration] = &[Migration::new(
    1,
    "CREATE TABLE my_model (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_on INTEGER NOT NULL
    );
    CREATE TABLE tasting (
        id INTEGER PRIMARY KEY,
        model_id INTEGER NOT NULL REFERENCES my_model(id) DEFERRABLE INITIALLY DEFERRED
    );
    INSERT INTO my_model (id, name, created_on) VALUES (1, 'seed', -62135596800000000);",
)];

#[derive(Debug, Clone, PartialEq)]
struct MyModel {
    id: i32,
    name: String,
    created_on: DateTime<Utc>,
}

impl MyModel {
    fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            created_on: Utc::now(),
        }
    }
}

impl DataModel for MyModel {
    type Key = i32;

    fn id(&self) -> &i32 {
        &self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

impl Entity for MyModel {
    const TABLE: &'static str = "my_model";
    const COLUMNS: &'static [&'static str] = &["name", "created_on"];

    fn to_row(&self) -> Row {
        Row::new()
            .with("name", self.name.as_str())
            .with("created_on", self.created_on)
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_as("id")?,
            name: row.get_as("name")?,
            created_on: row.get_as("created_on")?,
        })
    }
}

fn epoch_min() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap()
}

async fn ready_repo() -> SqliteRepository<MyModel> {
    let store = SqliteStore::open_in_memory(MIGRATIONS).unwrap();
    let repo = SqliteRepository::new(store);
    repo.initialize().await.unwrap();
    repo
}

async fn row_count(repo: &SqliteRepository<MyModel>) -> i64 {
    repo.store()
        .with_connection(|conn| -> Result<i64, RepoError> {
            Ok(conn.query_row("SELECT COUNT(*) FROM my_model", [], |row| row.get(0))?)
        })
        .await
        .unwrap()
}

fn assert_not_initialized(err: RepoError, expected_operation: &str) {
    match err {
        RepoError::NotInitialized {
            operation,
            location,
        } => {
            assert_eq!(operation, expected_operation);
            assert!(!location.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn every_operation_fails_before_initialize() {
    let store = SqliteStore::open_in_memory(MIGRATIONS).unwrap();
    let repo = SqliteRepository::<MyModel>::new(store);
    assert!(!repo.is_initialized());

    assert_not_initialized(repo.get_by_id(&1).await.unwrap_err(), "get_by_id");
    assert_not_initialized(repo.get(&Filter::all()).await.unwrap_err(), "get");
    assert_not_initialized(repo.get_all().await.unwrap_err(), "get_all");
    assert_not_initialized(repo.delete(&1).await.unwrap_err(), "delete");
    assert_not_initialized(repo.begin_transaction().await.unwrap_err(), "begin_transaction");

    let mut entity = MyModel::new("blocked");
    assert_not_initialized(
        repo.insert_or_update(&mut entity).await.unwrap_err(),
        "insert_or_update",
    );
    assert_eq!(entity.id, 0);

    repo.initialize().await.unwrap();
    assert_eq!(row_count(&repo).await, 1);
}

#[tokio::test]
async fn initialize_fails_when_table_is_missing() {
    let store = SqliteStore::open_in_memory(&[]).unwrap();
    let repo = SqliteRepository::<MyModel>::new(store);

    assert!(repo.initialize().await.is_err());
    assert!(!repo.is_initialized());
    assert_not_initialized(repo.get_all().await.unwrap_err(), "get_all");
}

#[tokio::test]
async fn initialize_is_repeatable() {
    let repo = ready_repo().await;
    repo.initialize().await.unwrap();
    assert!(repo.is_initialized());
}

#[tokio::test]
async fn insert_assigns_key_and_round_trips() {
    let repo = ready_repo().await;

    let mut entity = MyModel::new("gouda");
    entity.created_on = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    repo.insert_or_update(&mut entity).await.unwrap();
    assert!(entity.id > 1);
    assert_eq!(entity.created_on.timestamp_subsec_nanos(), 123_456_000);

    let loaded = repo.get_by_id(&entity.id).await.unwrap().unwrap();
    assert_eq!(loaded, entity);
}

#[tokio::test]
async fn get_by_id_of_unknown_key_is_none() {
    let repo = ready_repo().await;
    assert!(repo.get_by_id(&4242).await.unwrap().is_none());
}

#[tokio::test]
async fn update_replaces_fields_without_duplicating() {
    let repo = ready_repo().await;

    let mut entity = MyModel::new("brie");
    repo.insert_or_update(&mut entity).await.unwrap();
    let id = entity.id;

    entity.name = "aged brie".to_string();
    repo.insert_or_update(&mut entity).await.unwrap();

    assert_eq!(entity.id, id);
    assert_eq!(repo.get_all().await.unwrap().len(), 2);
    let loaded = repo.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "aged brie");
    assert_eq!(loaded, entity);
}

#[tokio::test]
async fn update_of_unknown_key_is_not_found() {
    let repo = ready_repo().await;

    let mut entity = MyModel::new("phantom");
    entity.id = 99;
    let err = repo.insert_or_update(&mut entity).await.unwrap_err();

    assert!(matches!(err, RepoError::NotFound { entity: "my_model", .. }));
    assert_eq!(row_count(&repo).await, 1);
}

#[tokio::test]
async fn delete_removes_row() {
    let repo = ready_repo().await;

    let mut entity = MyModel::new("feta");
    repo.insert_or_update(&mut entity).await.unwrap();
    repo.delete(&entity.id).await.unwrap();

    let remaining = repo.get(&Filter::eq("id", entity.id)).await.unwrap();
    assert!(remaining.is_empty());
    assert_eq!(row_count(&repo).await, 1);
}

#[tokio::test]
async fn delete_of_unknown_key_is_not_found() {
    let repo = ready_repo().await;

    let err = repo.delete(&77).await.unwrap_err();
    match err {
        RepoError::NotFound { entity, key } => {
            assert_eq!(entity, "my_model");
            assert_eq!(key, "77");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn get_all_counts_seeded_and_inserted_rows() {
    let repo = ready_repo().await;

    for name in ["cheddar", "stilton", "comte"] {
        let mut entity = MyModel::new(name);
        repo.insert_or_update(&mut entity).await.unwrap();
    }

    assert_eq!(repo.get_all().await.unwrap().len(), 4);
}

#[tokio::test]
async fn seeded_row_is_excluded_by_created_on_filter() {
    let repo = ready_repo().await;

    let seed = repo.get_by_id(&1).await.unwrap().unwrap();
    assert_eq!(seed.created_on, epoch_min());

    let mut entity = MyModel::new("manchego");
    repo.insert_or_update(&mut entity).await.unwrap();

    let recent = repo
        .get(&Filter::by("created_on", Operator::Gt, epoch_min()))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, entity.id);
}

#[tokio::test]
async fn conjunctive_filter_narrows_results() {
    let repo = ready_repo().await;

    let mut old = MyModel::new("old");
    old.created_on = Utc::now() - Duration::days(30);
    repo.insert_or_update(&mut old).await.unwrap();
    let mut fresh = MyModel::new("fresh");
    repo.insert_or_update(&mut fresh).await.unwrap();

    let filter = Filter::by("created_on", Operator::Gt, epoch_min())
        .and("name", Operator::Ne, "old");
    let found = repo.get(&filter).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "fresh");
}

#[tokio::test]
async fn filter_on_unknown_column_is_rejected() {
    let repo = ready_repo().await;

    let err = repo.get(&Filter::eq("flavour", "sharp")).await.unwrap_err();
    assert!(matches!(err, RepoError::InvalidFilter(_)));
}

#[tokio::test]
async fn unique_violation_surfaces_as_constraint_error() {
    let repo = ready_repo().await;

    let mut duplicate = MyModel::new("seed");
    let err = repo.insert_or_update(&mut duplicate).await.unwrap_err();

    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert_eq!(duplicate.id, 0);
}

#[tokio::test]
async fn rolled_back_transaction_discards_writes() {
    let repo = ready_repo().await;

    let tx = repo.begin_transaction().await.unwrap();
    assert!(tx.is_active());
    let mut entity = MyModel::new("discarded");
    repo.insert_or_update(&mut entity).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(repo.get_by_id(&entity.id).await.unwrap().is_none());
    assert_eq!(row_count(&repo).await, 1);
}

#[tokio::test]
async fn committed_transaction_keeps_writes() {
    let repo = ready_repo().await;

    let tx = repo.begin_transaction().await.unwrap();
    let mut entity = MyModel::new("kept");
    repo.insert_or_update(&mut entity).await.unwrap();
    tx.commit().await.unwrap();

    assert!(repo.get_by_id(&entity.id).await.unwrap().is_some());
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let repo = ready_repo().await;

    let mut entity = MyModel::new("abandoned");
    {
        let _tx = repo.begin_transaction().await.unwrap();
        repo.insert_or_update(&mut entity).await.unwrap();
    }

    assert!(repo.get_by_id(&entity.id).await.unwrap().is_none());
    assert_eq!(row_count(&repo).await, 1);
}

#[tokio::test]
async fn failed_commit_releases_connection() {
    let repo = ready_repo().await;

    let tx = repo.begin_transaction().await.unwrap();
    let mut entity = MyModel::new("orphaned");
    repo.insert_or_update(&mut entity).await.unwrap();
    repo.store()
        .with_connection(|conn| -> Result<usize, RepoError> {
            Ok(conn.execute("INSERT INTO tasting (model_id) VALUES (999)", [])?)
        })
        .await
        .unwrap();

    assert!(tx.commit().await.is_err());

    let autocommit = repo
        .store()
        .with_connection(|conn| -> Result<bool, RepoError> { Ok(conn.is_autocommit()) })
        .await
        .unwrap();
    assert!(autocommit);
    assert!(repo.get_by_id(&entity.id).await.unwrap().is_none());
    assert_eq!(row_count(&repo).await, 1);

    let retry = repo.begin_transaction().await.unwrap();
    retry.rollback().await.unwrap();
}

async fn insert_pair(
    repo: &SqliteRepository<MyModel>,
    first: &str,
    second: &str,
) -> Result<(), RepoError> {
    let tx = repo.begin_transaction().await?;
    repo.insert_or_update(&mut MyModel::new(first)).await?;
    repo.insert_or_update(&mut MyModel::new(second)).await?;
    tx.commit().await?;
    Ok(())
}

#[tokio::test]
async fn early_return_inside_transaction_rolls_back() {
    let repo = ready_repo().await;

    let err = insert_pair(&repo, "gruyere", "seed").await.unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));

    let gruyere = repo.get(&Filter::eq("name", "gruyere")).await.unwrap();
    assert!(gruyere.is_empty());
    assert_eq!(row_count(&repo).await, 1);

    insert_pair(&repo, "gruyere", "emmental").await.unwrap();
    assert_eq!(row_count(&repo).await, 3);
}

#[tokio::test]
async fn transaction_capability_is_reachable_through_contract() {
    let repo = ready_repo().await;
    let contract: &dyn Repository<MyModel> = &repo;

    let support: &dyn TransactionSupport = contract
        .transactions()
        .expect("sqlite supports transactions");
    let tx = support.begin().await.unwrap();
    let mut entity = MyModel::new("boxed");
    contract.insert_or_update(&mut entity).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(contract.get_by_id(&entity.id).await.unwrap().is_none());
}

#[tokio::test]
async fn close_clears_initialized_state() {
    let repo = ready_repo().await;
    repo.close().await.unwrap();

    assert!(!repo.is_initialized());
    assert_not_initialized(repo.get_all().await.unwrap_err(), "get_all");

    repo.initialize().await.unwrap();
    assert_eq!(repo.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn repositories_share_one_store() {
    let store = SqliteStore::open_in_memory(MIGRATIONS).unwrap();
    let writer = SqliteRepository::<MyModel>::new(store.clone());
    let reader = SqliteRepository::<MyModel>::new(store);
    writer.initialize().await.unwrap();
    reader.initialize().await.unwrap();

    let mut entity = MyModel::new("shared");
    writer.insert_or_update(&mut entity).await.unwrap();

    assert!(reader.get_by_id(&entity.id).await.unwrap().is_some());
}
