//! Sensor State Store
//!
//! MySQL persistence layer for the state service:
//! - One-time connection bootstrap (configuration, key validation, pool, ping)
//! - Named server public key registry for transport negotiation
//! - Existence/credential lookups and the state-record insert

pub mod config;
pub mod connect;
pub mod keys;
mod store;

pub use config::ServiceConfig;
pub use connect::{ConnectError, ConnectSpec};
pub use keys::{load_server_public_key, KeyError, KeyRegistry, SERVER_KEY_NAME};
pub use store::{bootstrap, MySqlStateStore, NewStateRecord, StateStore};

use thiserror::Error;

/// Store access errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A pooled connection could not be acquired
    #[error("unable to get a connection from the pool")]
    Acquire(#[source] sqlx::Error),
    /// A query or insert failed for any reason other than an empty result
    #[error("store query failed")]
    Query(#[source] sqlx::Error),
}

/// Bootstrap errors; any of these is fatal for the process's readiness
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("unable to fetch the service configuration")]
    Config(#[from] ::config::ConfigError),

    #[error("dbms public key validation failed")]
    Key(#[from] KeyError),

    #[error("unable to connect to the store")]
    Connection(#[from] ConnectError),
}
