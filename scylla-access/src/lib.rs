//! Session lifecycle and statement execution layer over the [Scylla](https://scylladb.com)
//! Rust driver. Works with ScyllaDB and [Apache Cassandra®](https://cassandra.apache.org/).
//!
//! # Overview
//! ### Connecting
//! A [`Cluster`](client::Cluster) is built from a [`ClusterConfig`](client::ClusterConfig)
//! without touching the network. Sessions are then connected through it:
//!
//! ```rust,no_run
//! use scylla_access::client::{Cluster, ClusterConfig};
//! use std::error::Error;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     let cluster = Cluster::build(ClusterConfig::new(["127.0.0.1", "127.0.0.2"]))?;
//!     let session = cluster.connect(Some("shop")).await?;
//!
//!     session.execute("SELECT * FROM orders").await?;
//!
//!     cluster.close();
//!     Ok(())
//! }
//! ```
//! If a session cannot be connected, the cluster is closed before the error is returned.
//!
//! The `connect*` functions in [`client`] do both steps at once, from a host list,
//! declarative [`ClusterOptions`](client::ClusterOptions) or a URI:
//!
//! ```rust,no_run
//! # use std::error::Error;
//! # async fn check_only_compiles() -> Result<(), Box<dyn Error>> {
//! let session = scylla_access::client::connect_uri("cql://127.0.0.1:9042/shop").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Executing statements
//! Plain text, structured queries, driver statements and bound statements are all
//! accepted as a [`StatementInput`](statement::StatementInput). The
//! [`ExecutionMode`](execution::ExecutionMode) of each call is explicit:
//!
//! ```rust,no_run
//! # use scylla_access::client::ClusterSession;
//! # use scylla_access::execution::ExecutionMode;
//! # use scylla_access::response::RowsTranslator;
//! # use scylla_access::statement::{bind, ExecutionOptions};
//! # use scylla::statement::Consistency;
//! # use scylla::value::CqlValue;
//! # use std::error::Error;
//! # async fn check_only_compiles(session: &ClusterSession) -> Result<(), Box<dyn Error>> {
//! let prepared = session.prepare("INSERT INTO ks.t (a, b) VALUES (?, ?)").await?;
//! let bound = bind(&prepared, vec![Some(CqlValue::Int(1)), Some(CqlValue::Text("x".into()))])?;
//!
//! let options = ExecutionOptions::new().consistency(Consistency::Quorum);
//! session.execute_with(bound, Some(&options), RowsTranslator).await?;
//!
//! let pending = session.execute_async("SELECT a, b FROM ks.t", None, RowsTranslator)?;
//! let rows = pending.wait().await?;
//! println!("{} rows", rows.len());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod authentication;
pub mod client;
pub mod errors;
pub mod execution;
pub mod network;
pub mod policies;
pub mod response;
pub mod statement;

pub use client::{Cluster, ClusterConfig, ClusterSession};
pub use execution::{AsyncResult, Execution, ExecutionMode};
pub use response::{RawResult, ResultTranslator, RowsTranslator};
pub use statement::{bind, ExecutionOptions, StatementInput};
