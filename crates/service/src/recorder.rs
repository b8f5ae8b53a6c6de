//! State record writer
//!
//! Callable only after verification. Generates the record identifier, stamps
//! the current local date and time, and performs the durable insert. The
//! insert is the commitment point; nothing is retried.

use crate::record_id::{generate_record_id, RandomSourceError};
use chrono::Local;
use state_store::{NewStateRecord, StateStore, StoreError};
use thiserror::Error;

/// Internal write-path failures
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unable to generate an id for the new record")]
    RecordId(#[source] RandomSourceError),

    #[error("unable to get a store connection for this request")]
    Connection(#[source] StoreError),

    #[error("unable to record the state in the store")]
    Insert(#[source] StoreError),
}

/// Write one state observation for an already-verified sensor
pub async fn record(store: &dyn StateStore, state: i32, sensor: &str) -> Result<(), RecordError> {
    let record_id = generate_record_id().map_err(RecordError::RecordId)?;

    let now = Local::now();
    let record = NewStateRecord {
        state,
        record_id,
        date: now.format("%Y%m%d").to_string(),
        time: now.format("%H%M").to_string(),
        sensor_id: sensor.to_string(),
    };

    match store.insert_state(&record).await {
        Ok(()) => Ok(()),
        Err(err @ StoreError::Acquire(_)) => Err(RecordError::Connection(err)),
        Err(err) => Err(RecordError::Insert(err)),
    }
}
