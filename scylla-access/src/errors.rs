//! Errors returned by this crate.
//!
//! Errors coming from the driver are never altered. They are wrapped in [`Arc`]
//! so that an outcome can be read by several holders of the same
//! [`AsyncResult`](crate::execution::AsyncResult).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use scylla::errors::{
    ExecutionError as DriverExecutionError, NewSessionError, PrepareError,
};
use thiserror::Error;

/// Error that occurred while turning configuration into a [`Cluster`](crate::client::cluster::Cluster).
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ClusterConfigError {
    /// There needs to be at least one contact point to bootstrap from.
    #[error("Empty contact points list")]
    EmptyContactPoints,

    /// Port 0 cannot be used to reach a node.
    #[error("Invalid port: 0")]
    InvalidPort,

    /// Connection pool limits that the driver cannot honor.
    #[error("Invalid pooling options: {0}")]
    InvalidPooling(String),

    /// The driver speaks only the listed native protocol versions.
    #[error("Unsupported protocol version {requested}, supported: {supported:?}")]
    UnsupportedProtocolVersion {
        /// The version from the configuration.
        requested: u8,
        /// Versions the driver can negotiate.
        supported: &'static [u8],
    },

    /// Consistency name that does not correspond to any level.
    #[error("Unknown consistency level: {0}")]
    UnknownConsistency(String),

    /// Transport security material could not be loaded.
    #[error("Transport security setup failed: {0}")]
    Tls(#[from] TlsSetupError),

    /// A connection URI that cannot be decomposed into host, port and keyspace.
    #[error("Invalid connection URI {uri}: {reason}")]
    InvalidUri {
        /// The URI as given.
        uri: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Options file could not be opened.
    #[error("Error while opening cluster options yaml: {0}")]
    YamlOpen(Arc<io::Error>),

    /// Options file is not valid.
    #[error("Error while parsing cluster options yaml: {0}")]
    YamlParse(Arc<serde_yaml::Error>),
}

impl From<serde_yaml::Error> for ClusterConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ClusterConfigError::YamlParse(Arc::new(err))
    }
}

/// Error that occurred while deriving a TLS context from keystore material.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum TlsSetupError {
    /// Keystore file could not be read. The I/O error is kept as is.
    #[error("Cannot read keystore: {0}")]
    Io(Arc<io::Error>),

    /// OpenSSL rejected the keystore, its password or the cipher list.
    #[cfg(feature = "openssl-010")]
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    /// Keystore holds no private key or no certificate.
    #[error("Keystore contains no {0}")]
    MissingKeyMaterial(&'static str),
}

impl From<io::Error> for TlsSetupError {
    fn from(err: io::Error) -> Self {
        TlsSetupError::Io(Arc::new(err))
    }
}

/// Error that occurred while connecting a session.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ConnectError {
    /// Configuration was rejected before any connection attempt.
    #[error(transparent)]
    Config(#[from] ClusterConfigError),

    /// The cluster handle was already closed.
    #[error("Cluster has been closed")]
    ClusterClosed,

    /// The driver failed to establish the session.
    #[error(transparent)]
    NewSession(Arc<NewSessionError>),
}

impl From<NewSessionError> for ConnectError {
    fn from(err: NewSessionError) -> Self {
        ConnectError::NewSession(Arc::new(err))
    }
}

/// The structured query representation could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed query: {0}")]
pub struct QueryBuildError(pub String);

/// Error that occurred while normalizing a statement input.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum StatementError {
    /// Propagated from the query builder.
    #[error(transparent)]
    QueryBuild(#[from] QueryBuildError),
}

/// Values could not be bound to a prepared statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindError {
    /// Positional bind requires exactly one value per placeholder.
    #[error("Prepared statement expects {expected} values, got {provided}")]
    ValueCountMismatch {
        /// Number of placeholders in the statement.
        expected: usize,
        /// Number of values passed to bind.
        provided: usize,
    },
}

/// Result rows could not be converted by a [`ResultTranslator`](crate::response::ResultTranslator).
#[derive(Error, Debug, Clone)]
#[error("Result translation failed: {0}")]
pub struct TranslationError(pub Arc<dyn std::error::Error + Send + Sync>);

impl TranslationError {
    /// Wraps any error raised while translating rows.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        TranslationError(Arc::new(err))
    }
}

/// Error that occurred while preparing or executing a statement.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ExecutionError {
    /// The session (or its whole cluster) has been closed.
    #[error("Session is not connected")]
    NotConnected,

    /// Statement input could not be normalized.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// Values could not be bound.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The driver failed to prepare the statement.
    #[error(transparent)]
    Prepare(Arc<PrepareError>),

    /// The driver failed to execute the statement.
    #[error(transparent)]
    Request(Arc<DriverExecutionError>),

    /// Rows were returned but could not be translated.
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// Asynchronous execution was requested outside a tokio runtime.
    #[error("No tokio runtime to run the execution on: {0}")]
    NoRuntime(String),

    /// The task running an asynchronous execution ended without a result.
    #[error("Asynchronous execution task failed: {0}")]
    TaskFailed(String),
}

impl From<PrepareError> for ExecutionError {
    fn from(err: PrepareError) -> Self {
        ExecutionError::Prepare(Arc::new(err))
    }
}

impl From<DriverExecutionError> for ExecutionError {
    fn from(err: DriverExecutionError) -> Self {
        ExecutionError::Request(Arc::new(err))
    }
}

impl From<QueryBuildError> for ExecutionError {
    fn from(err: QueryBuildError) -> Self {
        ExecutionError::Statement(err.into())
    }
}

/// A bounded wait on an [`AsyncResult`](crate::execution::AsyncResult) elapsed
/// before the execution resolved. The execution itself may still complete.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Result not available after waiting {0:?}")]
pub struct WaitTimeout(pub Duration);
