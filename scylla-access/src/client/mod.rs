//! This module holds entities representing the cluster and its sessions.
//!
//! - [`Cluster`] is the unconnected handle built from a [`ClusterConfig`](config::ClusterConfig),
//! - [`ClusterSession`] is a session connected through it, which executes statements.
//!
//! The `connect*` functions build a cluster and connect a session in one step.

pub mod cluster;
pub mod config;
pub mod session;

pub use cluster::{shutdown_cluster, Cluster};
pub use config::{
    parse_consistency, ClusterConfig, ClusterOptions, ConnectionUri, Credentials, PoolingOptions,
    ProtocolVersion, DEFAULT_PORT,
};
pub use session::{
    connect, connect_config, connect_keyspace, connect_uri, connect_with_options, ClusterSession,
    HostInfo,
};
