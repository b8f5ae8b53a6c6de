//! The `StateStore` seam and its MySQL implementation

use crate::config::ServiceConfig;
use crate::connect::ConnectSpec;
use crate::keys::{self, KeyRegistry, SERVER_KEY_NAME};
use crate::{BootstrapError, StoreError};
use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::{debug, info};

const SENSOR_EXISTS: &str = "SELECT sensor_id FROM sensor WHERE sensor_id = ?";

const CREDENTIAL_MATCHES: &str = "SELECT sensor_id FROM sensor WHERE sensor_id = ? AND pass = ?";

const INSERT_STATE: &str =
    "INSERT INTO state_record (state, record_id, date, time, sensor_id) VALUES (?, ?, ?, ?, ?)";

/// A state record ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStateRecord {
    /// Reported state code
    pub state: i32,
    /// Freshly generated, never reused
    pub record_id: String,
    /// yyyyMMdd
    pub date: String,
    /// HHmm
    pub time: String,
    /// Reporting sensor
    pub sensor_id: String,
}

/// Store operations needed by the service call path.
///
/// The two lookups return `Ok(bool)` for their defined outcomes (found /
/// not found) and `Err` only for internal failures, so callers can classify
/// without inspecting error values.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Whether a sensor with this id is registered
    async fn sensor_exists(&self, sensor_id: &str) -> Result<bool, StoreError>;

    /// Whether this exact (sensor, pass) pair is registered.
    ///
    /// The password is a literal equality filter evaluated by the store;
    /// the comparison is not constant-time.
    async fn credential_matches(&self, sensor_id: &str, pass: &str) -> Result<bool, StoreError>;

    /// Durably insert a new state record
    async fn insert_state(&self, record: &NewStateRecord) -> Result<(), StoreError>;
}

/// MySQL-backed store over a shared connection pool
#[derive(Debug)]
pub struct MySqlStateStore {
    pool: MySqlPool,
    registry: KeyRegistry,
}

impl MySqlStateStore {
    /// Wrap an already-opened pool and its key registry
    pub fn new(pool: MySqlPool, registry: KeyRegistry) -> Self {
        Self { pool, registry }
    }

    /// The key registry this store's transport was negotiated with
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }
}

#[async_trait]
impl StateStore for MySqlStateStore {
    async fn sensor_exists(&self, sensor_id: &str) -> Result<bool, StoreError> {
        let row: Option<String> = sqlx::query_scalar(SENSOR_EXISTS)
            .bind(sensor_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        Ok(row.is_some())
    }

    async fn credential_matches(&self, sensor_id: &str, pass: &str) -> Result<bool, StoreError> {
        let row: Option<String> = sqlx::query_scalar(CREDENTIAL_MATCHES)
            .bind(sensor_id)
            .bind(pass)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        Ok(row.is_some())
    }

    async fn insert_state(&self, record: &NewStateRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::Acquire)?;

        sqlx::query(INSERT_STATE)
            .bind(record.state)
            .bind(&record.record_id)
            .bind(&record.date)
            .bind(&record.time)
            .bind(&record.sensor_id)
            .execute(&mut *conn)
            .await
            .map_err(StoreError::Query)?;

        debug!(
            "Recorded state {} for sensor {} as {}",
            record.state, record.sensor_id, record.record_id
        );
        Ok(())
    }
}

/// One-time store bootstrap.
///
/// Validates the DBMS public key, registers it under [`SERVER_KEY_NAME`],
/// builds the connection target, opens the pool, and pings it. Runs once at
/// process start; any failure here must leave the service refusing calls.
pub async fn bootstrap(config: ServiceConfig) -> Result<MySqlStateStore, BootstrapError> {
    let key = keys::load_server_public_key(&config.dbms_public_key)?;

    let mut registry = KeyRegistry::new();
    registry.register(SERVER_KEY_NAME, key);

    let spec = ConnectSpec::from_config(&config);
    let pool = spec.open(&registry).await?;

    info!("Store bootstrap complete");
    Ok(MySqlStateStore::new(pool, registry))
}
