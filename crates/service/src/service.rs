//! Public service entry point and readiness gate

use crate::log_book::LogBook;
use crate::recorder::record;
use crate::verify::{verify, Verification};
use state_store::{BootstrapError, ServiceConfig, StateStore};
use thiserror::Error;
use tracing::{info, warn};

const BOOTSTRAP_COMPONENT: &str = "state_service::StateService::bootstrap";
const SUBMIT_COMPONENT: &str = "state_service::StateService::submit";

/// Caller-observable outcomes of a submit call.
///
/// `SensorNotFound` and `IncorrectPassword` are sentinel outcomes for the
/// caller's benefit. Every internal failure surfaces as the opaque
/// `Internal`; its cause is journaled, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("sensor does not exist")]
    SensorNotFound,

    #[error("incorrect sensor password")]
    IncorrectPassword,

    #[error("an error occurred")]
    Internal,
}

enum ServiceStatus {
    Ready(Box<dyn StateStore>),
    /// Bootstrap failed; the cause was journaled once at startup
    Unavailable,
}

/// The state-recording service.
///
/// Holds the bootstrapped store and the diagnostics journal. Readiness is
/// decided once at construction and never changes; an unavailable service
/// refuses every call rather than attempt partial operation.
pub struct StateService {
    status: ServiceStatus,
    log_book: LogBook,
}

impl StateService {
    /// Bootstrap from the layered default configuration sources, journaling
    /// failures to standard error.
    pub async fn bootstrap() -> Self {
        let log_book = LogBook::stderr();

        let config = match ServiceConfig::load() {
            Ok(config) => config,
            Err(err) => {
                let err = BootstrapError::Config(err);
                log_book.record_failure(BOOTSTRAP_COMPONENT, &err);
                return Self {
                    status: ServiceStatus::Unavailable,
                    log_book,
                };
            }
        };

        Self::bootstrap_with(config, log_book).await
    }

    /// Bootstrap against an explicit configuration and journal
    pub async fn bootstrap_with(config: ServiceConfig, log_book: LogBook) -> Self {
        let status = match state_store::bootstrap(config).await {
            Ok(store) => {
                info!("State service ready");
                ServiceStatus::Ready(Box::new(store))
            }
            Err(err) => {
                log_book.record_failure(BOOTSTRAP_COMPONENT, &err);
                warn!("State service unavailable; refusing all calls");
                ServiceStatus::Unavailable
            }
        };

        Self { status, log_book }
    }

    /// Build a ready service over an already-constructed store
    pub fn new(store: impl StateStore + 'static, log_book: LogBook) -> Self {
        Self {
            status: ServiceStatus::Ready(Box::new(store)),
            log_book,
        }
    }

    /// Whether bootstrap succeeded and calls will be accepted
    pub fn is_ready(&self) -> bool {
        matches!(self.status, ServiceStatus::Ready(_))
    }

    /// Record one state observation for a sensor.
    ///
    /// Verifies the sensor's existence and credential, in that order, then
    /// writes the record. Internal failures are journaled exactly once, at
    /// this boundary, and collapsed to [`ServiceError::Internal`].
    pub async fn submit(&self, state: i32, sensor: &str, pass: &str) -> Result<(), ServiceError> {
        let store = match &self.status {
            ServiceStatus::Ready(store) => store.as_ref(),
            ServiceStatus::Unavailable => return Err(ServiceError::Internal),
        };

        match verify(store, sensor, pass).await {
            Ok(Verification::Verified) => {}
            Ok(Verification::SensorNotFound) => return Err(ServiceError::SensorNotFound),
            Ok(Verification::IncorrectPassword) => return Err(ServiceError::IncorrectPassword),
            Err(err) => {
                self.log_book.record_failure(SUBMIT_COMPONENT, &err);
                return Err(ServiceError::Internal);
            }
        }

        if let Err(err) = record(store, state, sensor).await {
            self.log_book.record_failure(SUBMIT_COMPONENT, &err);
            return Err(ServiceError::Internal);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CaptureSink, FailureMode, MemoryStore};
    use chrono::Local;

    fn service_over(store: MemoryStore) -> (StateService, CaptureSink) {
        let sink = CaptureSink::default();
        let service = StateService::new(store, LogBook::new(Box::new(sink.clone())));
        (service, sink)
    }

    #[tokio::test]
    async fn valid_submit_inserts_exactly_one_record() {
        let store = MemoryStore::new(&[("S1", "p1")]);
        let records = store.records_handle();
        let (service, sink) = service_over(store);

        service.submit(2, "S1", "p1").await.unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, 2);
        assert_eq!(records[0].sensor_id, "S1");
        assert_eq!(records[0].date, Local::now().format("%Y%m%d").to_string());
        assert_eq!(sink.contents(), "");
    }

    #[tokio::test]
    async fn unknown_sensor_is_a_sentinel_and_inserts_nothing() {
        let store = MemoryStore::new(&[("S1", "p1")]);
        let records = store.records_handle();
        let (service, sink) = service_over(store);

        let err = service.submit(2, "Sunknown", "p1").await.unwrap_err();

        assert_eq!(err, ServiceError::SensorNotFound);
        assert!(records.lock().unwrap().is_empty());
        // Sentinel outcomes are not failures and are never journaled
        assert_eq!(sink.contents(), "");
    }

    #[tokio::test]
    async fn wrong_password_is_a_sentinel_and_inserts_nothing() {
        let store = MemoryStore::new(&[("S1", "p1")]);
        let records = store.records_handle();
        let (service, sink) = service_over(store);

        let err = service.submit(2, "S1", "wrong").await.unwrap_err();

        assert_eq!(err, ServiceError::IncorrectPassword);
        assert!(records.lock().unwrap().is_empty());
        assert_eq!(sink.contents(), "");
    }

    #[tokio::test]
    async fn existence_lookup_failure_is_opaque_and_journaled_once() {
        let store = MemoryStore::failing(&[("S1", "p1")], FailureMode::Existence);
        let (service, sink) = service_over(store);

        let err = service.submit(2, "S1", "p1").await.unwrap_err();

        assert_eq!(err, ServiceError::Internal);

        let journal = sink.contents();
        assert!(journal.contains("confirm sensor's existence"));
        assert!(journal.contains(SUBMIT_COMPONENT));
        assert_eq!(journal.lines().count(), 1);
    }

    #[tokio::test]
    async fn insert_failure_is_opaque_and_journaled_once() {
        let store = MemoryStore::failing(&[("S1", "p1")], FailureMode::Insert);
        let (service, sink) = service_over(store);

        let err = service.submit(2, "S1", "p1").await.unwrap_err();

        assert_eq!(err, ServiceError::Internal);
        assert!(sink.contents().contains("record the state in the store"));
        assert_eq!(sink.contents().lines().count(), 1);
    }

    #[tokio::test]
    async fn bootstrap_against_a_bad_key_leaves_the_service_refusing_calls() {
        let path = std::env::temp_dir().join("statewatch-service-bad-key.pem");
        std::fs::write(
            &path,
            "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n",
        )
        .unwrap();

        let config = ServiceConfig {
            dbms_user: "svc1".to_string(),
            dbms_pass: "secret".to_string(),
            connect_timeout_s: 1,
            write_timeout_s: 1,
            read_timeout_s: 1,
            dbms_public_key: path.clone(),
        };

        let sink = CaptureSink::default();
        let service =
            StateService::bootstrap_with(config, LogBook::new(Box::new(sink.clone()))).await;
        std::fs::remove_file(&path).ok();

        assert!(!service.is_ready());
        assert!(sink.contents().contains("dbms public key"));
        assert!(sink.contents().contains(BOOTSTRAP_COMPONENT));

        // Even valid credentials are refused once bootstrap has failed
        let err = service.submit(2, "S1", "p1").await.unwrap_err();
        assert_eq!(err, ServiceError::Internal);
    }
}
