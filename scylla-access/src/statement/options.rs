//! Per-call overrides applied to one statement instance before it is dispatched.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use scylla::policies::retry::RetryPolicy;
use scylla::statement::prepared::PreparedStatement;
use scylla::statement::unprepared::Statement;
use scylla::statement::{Consistency, SerialConsistency};

/// Options of a single execution. Every option left unset keeps what the
/// statement or the default execution profile says.
///
/// # Example
/// ```
/// # use scylla_access::statement::ExecutionOptions;
/// # use scylla::statement::Consistency;
/// # use std::num::NonZeroU32;
/// let options = ExecutionOptions::new()
///     .consistency(Consistency::LocalQuorum)
///     .fetch_size(NonZeroU32::new(500).unwrap())
///     .tracing(true);
/// ```
#[derive(Clone, Default)]
pub struct ExecutionOptions {
    /// Retry policy evaluated by the driver for this execution.
    pub retry_policy: Option<Arc<dyn RetryPolicy>>,
    /// Consistency level.
    pub consistency: Option<Consistency>,
    /// Serial consistency of conditional statements.
    pub serial_consistency: Option<SerialConsistency>,
    /// Page size. When set, all pages are fetched with this size.
    pub fetch_size: Option<NonZeroU32>,
    /// Whether the server traces the execution.
    pub tracing: Option<bool>,
    /// Default timestamp in microseconds since the epoch.
    pub timestamp: Option<i64>,
    /// Whether the statement may be retried or speculatively executed.
    pub idempotent: Option<bool>,
    /// Client-side timeout of the request.
    pub request_timeout: Option<Duration>,
}

impl ExecutionOptions {
    /// Options overriding nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets the consistency level.
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Sets the serial consistency level.
    pub fn serial_consistency(mut self, consistency: SerialConsistency) -> Self {
        self.serial_consistency = Some(consistency);
        self
    }

    /// Sets the page size.
    pub fn fetch_size(mut self, size: NonZeroU32) -> Self {
        self.fetch_size = Some(size);
        self
    }

    /// Enables or disables tracing.
    pub fn tracing(mut self, tracing: bool) -> Self {
        self.tracing = Some(tracing);
        self
    }

    /// Sets the default timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Marks the statement as idempotent or not.
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = Some(idempotent);
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub(crate) fn apply_to(&self, statement: &mut impl Configurable) {
        if let Some(policy) = &self.retry_policy {
            statement.set_retry_policy(Some(policy.clone()));
        }
        if let Some(consistency) = self.consistency {
            statement.set_consistency(consistency);
        }
        if let Some(consistency) = self.serial_consistency {
            statement.set_serial_consistency(Some(consistency));
        }
        if let Some(size) = self.fetch_size {
            statement.set_page_size(page_size(size));
        }
        if let Some(tracing) = self.tracing {
            statement.set_tracing(tracing);
        }
        if let Some(timestamp) = self.timestamp {
            statement.set_timestamp(Some(timestamp));
        }
        if let Some(idempotent) = self.idempotent {
            statement.set_is_idempotent(idempotent);
        }
        if let Some(timeout) = self.request_timeout {
            statement.set_request_timeout(Some(timeout));
        }
    }
}

/// The driver's page size for a fetch size; sizes beyond `i32::MAX` are clamped.
pub(crate) fn page_size(size: NonZeroU32) -> i32 {
    i32::try_from(size.get()).unwrap_or(i32::MAX)
}

impl fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("retry_policy", &self.retry_policy)
            .field("consistency", &self.consistency)
            .field("serial_consistency", &self.serial_consistency)
            .field("fetch_size", &self.fetch_size)
            .field("tracing", &self.tracing)
            .field("timestamp", &self.timestamp)
            .field("idempotent", &self.idempotent)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Setters shared by unprepared and prepared statements.
pub(crate) trait Configurable {
    fn set_retry_policy(&mut self, policy: Option<Arc<dyn RetryPolicy>>);
    fn set_consistency(&mut self, consistency: Consistency);
    fn set_serial_consistency(&mut self, consistency: Option<SerialConsistency>);
    fn set_page_size(&mut self, size: i32);
    fn set_tracing(&mut self, tracing: bool);
    fn set_timestamp(&mut self, timestamp: Option<i64>);
    fn set_is_idempotent(&mut self, idempotent: bool);
    fn set_request_timeout(&mut self, timeout: Option<Duration>);
}

macro_rules! impl_configurable {
    ($statement:ty) => {
        impl Configurable for $statement {
            fn set_retry_policy(&mut self, policy: Option<Arc<dyn RetryPolicy>>) {
                <$statement>::set_retry_policy(self, policy)
            }
            fn set_consistency(&mut self, consistency: Consistency) {
                <$statement>::set_consistency(self, consistency)
            }
            fn set_serial_consistency(&mut self, consistency: Option<SerialConsistency>) {
                <$statement>::set_serial_consistency(self, consistency)
            }
            fn set_page_size(&mut self, size: i32) {
                <$statement>::set_page_size(self, size)
            }
            fn set_tracing(&mut self, tracing: bool) {
                <$statement>::set_tracing(self, tracing)
            }
            fn set_timestamp(&mut self, timestamp: Option<i64>) {
                <$statement>::set_timestamp(self, timestamp)
            }
            fn set_is_idempotent(&mut self, idempotent: bool) {
                <$statement>::set_is_idempotent(self, idempotent)
            }
            fn set_request_timeout(&mut self, timeout: Option<Duration>) {
                <$statement>::set_request_timeout(self, timeout)
            }
        }
    };
}

impl_configurable!(Statement);
impl_configurable!(PreparedStatement);
