//! Pluggable policies applied by a cluster.
//!
//! Retry and load balancing decisions are taken by the driver for every request;
//! their traits are re-exported here so that configuration can be written against
//! this crate alone. Reconnection is paced by this crate when a session is established.

pub mod reconnection;

pub use reconnection::{
    ConstantReconnectionPolicy, ExponentialReconnectionPolicy, NoReconnectionPolicy,
    ReconnectionPolicy, ReconnectionSchedule,
};
pub use scylla::policies::load_balancing::{DefaultPolicy, LoadBalancingPolicy};
pub use scylla::policies::retry::{
    DefaultRetryPolicy, DowngradingConsistencyRetryPolicy, FallthroughRetryPolicy, RetryPolicy,
};
