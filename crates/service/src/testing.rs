//! Shared test doubles: an in-memory store and a capturing journal sink

use async_trait::async_trait;
use state_store::{NewStateRecord, StateStore, StoreError};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Which store operation should fail, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    None,
    Existence,
    Credential,
    Acquire,
    Insert,
}

/// In-memory stand-in for the MySQL store
pub struct MemoryStore {
    sensors: HashMap<String, String>,
    records: Arc<Mutex<Vec<NewStateRecord>>>,
    failure: FailureMode,
}

impl MemoryStore {
    /// Store seeded with (sensor_id, pass) pairs
    pub fn new(sensors: &[(&str, &str)]) -> Self {
        Self::failing(sensors, FailureMode::None)
    }

    /// Store that fails one operation with a simulated store error
    pub fn failing(sensors: &[(&str, &str)], failure: FailureMode) -> Self {
        Self {
            sensors: sensors
                .iter()
                .map(|(id, pass)| (id.to_string(), pass.to_string()))
                .collect(),
            records: Arc::new(Mutex::new(Vec::new())),
            failure,
        }
    }

    /// Snapshot of the inserted records
    pub fn records(&self) -> Vec<NewStateRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Shared handle to the inserted records, usable after the store has
    /// been moved into a service
    pub fn records_handle(&self) -> Arc<Mutex<Vec<NewStateRecord>>> {
        Arc::clone(&self.records)
    }

    fn query_error() -> StoreError {
        StoreError::Query(sqlx::Error::Protocol("simulated store failure".into()))
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn sensor_exists(&self, sensor_id: &str) -> Result<bool, StoreError> {
        if self.failure == FailureMode::Existence {
            return Err(Self::query_error());
        }
        Ok(self.sensors.contains_key(sensor_id))
    }

    async fn credential_matches(&self, sensor_id: &str, pass: &str) -> Result<bool, StoreError> {
        if self.failure == FailureMode::Credential {
            return Err(Self::query_error());
        }
        Ok(self.sensors.get(sensor_id).is_some_and(|stored| stored == pass))
    }

    async fn insert_state(&self, record: &NewStateRecord) -> Result<(), StoreError> {
        match self.failure {
            FailureMode::Acquire => Err(StoreError::Acquire(sqlx::Error::PoolTimedOut)),
            FailureMode::Insert => Err(Self::query_error()),
            _ => {
                self.records.lock().unwrap().push(record.clone());
                Ok(())
            }
        }
    }
}

/// `Write` sink that captures everything for later inspection
#[derive(Clone, Default)]
pub struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    /// Captured bytes as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
