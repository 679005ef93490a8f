use async_trait::async_trait;
use cheddar_core::{
    ColumnStoreConfig, ColumnStoreRepository, DataModel, Entity, Filter, MemoryCluster, Migration,
    Operator, Readiness, RepoError, Repository, RepositoryService, Row, RowError,
    SqliteRepository, SqliteStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const MIGRATIONS: &[Migration] = &[Migration::new(
    1,
    "CREATE TABLE cheese (id TEXT PRIMARY KEY, name TEXT NOT NULL, aged_days INTEGER NOT NULL);",
)];

#[derive(Debug, Clone, PartialEq)]
struct Cheese {
    id: String,
    name: String,
    aged_days: i64,
}

impl Cheese {
    fn new(name: &str, aged_days: i64) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            aged_days,
        }
    }
}

impl DataModel for Cheese {
    type Key = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Entity for Cheese {
    const TABLE: &'static str = "cheese";
    const COLUMNS: &'static [&'static str] = &["name", "aged_days"];

    fn to_row(&self) -> Row {
        Row::new()
            .with("name", self.name.as_str())
            .with("aged_days", self.aged_days)
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_as("id")?,
            name: row.get_as("name")?,
            aged_days: row.get_as("aged_days")?,
        })
    }
}

fn sqlite_service() -> RepositoryService<Cheese> {
    let store = SqliteStore::open_in_memory(MIGRATIONS).unwrap();
    RepositoryService::new(Arc::new(SqliteRepository::<Cheese>::new(store)))
}

fn column_service() -> RepositoryService<Cheese> {
    let config = ColumnStoreConfig::default();
    let cluster = MemoryCluster::new(config.contact_point.clone()).with_table(&config.keyspace, "cheese");
    RepositoryService::new(Arc::new(ColumnStoreRepository::<Cheese, _>::new(
        cluster, config,
    )))
}

/// Counts `initialize` calls on the wrapped repository.
struct CountingRepository {
    inner: SqliteRepository<Cheese>,
    initializations: Arc<AtomicUsize>,
}

impl Readiness for CountingRepository {
    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }
}

#[async_trait]
impl Repository<Cheese> for CountingRepository {
    async fn initialize(&self) -> Result<(), RepoError> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.initialize().await
    }

    async fn get_by_id(&self, id: &String) -> Result<Option<Cheese>, RepoError> {
        self.inner.get_by_id(id).await
    }

    async fn get(&self, filter: &Filter) -> Result<Vec<Cheese>, RepoError> {
        self.inner.get(filter).await
    }

    async fn get_all(&self) -> Result<Vec<Cheese>, RepoError> {
        self.inner.get_all().await
    }

    async fn insert_or_update(&self, entity: &mut Cheese) -> Result<(), RepoError> {
        self.inner.insert_or_update(entity).await
    }

    async fn delete(&self, id: &String) -> Result<(), RepoError> {
        self.inner.delete(id).await
    }

    async fn close(&self) -> Result<(), RepoError> {
        self.inner.close().await
    }
}

#[tokio::test]
async fn first_call_initializes_repository() {
    for service in [sqlite_service(), column_service()] {
        assert!(!service.is_initialized());

        assert!(service.get_all().await.unwrap().is_empty());
        assert!(service.is_initialized());
    }
}

#[tokio::test]
async fn insert_returns_generated_key() {
    for service in [sqlite_service(), column_service()] {
        let mut cheese = Cheese::new("cheddar", 180);
        let key = service.insert_or_update(&mut cheese).await.unwrap();

        assert!(Uuid::parse_str(&key).is_ok());
        assert_eq!(cheese.id, key);
        assert_eq!(service.get_by_id(&key).await.unwrap(), cheese);
    }
}

#[tokio::test]
async fn missing_key_is_not_found_or_none() {
    for service in [sqlite_service(), column_service()] {
        let missing = Uuid::new_v4().to_string();

        let err = service.get_by_id(&missing).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound { entity: "cheese", .. }));
        assert!(service.find_by_id(&missing).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn filtered_reads_and_deletes_go_through_repository() {
    for service in [sqlite_service(), column_service()] {
        let mut young = Cheese::new("mozzarella", 1);
        let mut old = Cheese::new("parmigiano", 730);
        service.insert_or_update(&mut young).await.unwrap();
        service.insert_or_update(&mut old).await.unwrap();

        let aged = service
            .get(&Filter::by("aged_days", Operator::Ge, 365))
            .await
            .unwrap();
        assert_eq!(aged, vec![old.clone()]);

        service.delete(&old.id).await.unwrap();
        assert_eq!(service.get_all().await.unwrap(), vec![young]);
    }
}

#[tokio::test]
async fn initialization_failure_is_returned_to_caller() {
    let store = SqliteStore::open_in_memory(&[]).unwrap();
    let service = RepositoryService::new(Arc::new(SqliteRepository::<Cheese>::new(store)));

    let err = service.get_all().await.unwrap_err();
    assert!(!matches!(err, RepoError::NotInitialized { .. }));
    assert!(!service.is_initialized());
}

#[tokio::test]
async fn wrapped_repository_keeps_adapter_capabilities() {
    let service = sqlite_service();
    service.initialize().await.unwrap();

    assert!(service.repository().transactions().is_some());
    assert!(column_service().repository().transactions().is_none());
}

#[tokio::test]
async fn clones_initialize_repository_once() {
    let initializations = Arc::new(AtomicUsize::new(0));
    let store = SqliteStore::open_in_memory(MIGRATIONS).unwrap();
    let service = RepositoryService::new(Arc::new(CountingRepository {
        inner: SqliteRepository::new(store),
        initializations: Arc::clone(&initializations),
    }));
    let clone = service.clone();

    let (first, second) = tokio::join!(service.get_all(), clone.get_all());
    first.unwrap();
    second.unwrap();

    assert_eq!(initializations.load(Ordering::SeqCst), 1);
    assert!(clone.is_initialized());
}
