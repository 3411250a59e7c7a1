//! Connected sessions, the `connect_*` entry points and cluster introspection.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use scylla::client::session::Session;
use scylla::response::query_result::IntoRowsResultError;
use scylla::value::{CqlValue, Row};
use tracing::{debug, info};

use super::cluster::Cluster;
use super::config::{ClusterConfig, ClusterOptions, ConnectionUri};
use crate::errors::{ConnectError, ExecutionError, TranslationError};

/// Driver session of one [`ClusterSession`], emptied when it is closed.
pub(crate) struct SessionSlot {
    session: ArcSwapOption<Session>,
    keyspace: Option<String>,
}

impl SessionSlot {
    pub(crate) fn new(session: Session, keyspace: Option<String>) -> Self {
        SessionSlot {
            session: ArcSwapOption::from_pointee(session),
            keyspace,
        }
    }

    /// Drops the slot's reference to the driver session. Requests holding
    /// their own reference finish first.
    pub(crate) fn close(&self) {
        if self.session.swap(None).is_some() {
            debug!(
                "Closed session{}",
                self.keyspace
                    .as_deref()
                    .map(|ks| format!(" using keyspace {}", ks))
                    .unwrap_or_default()
            );
        }
    }
}

/// A session connected to a [`Cluster`], optionally bound to a keyspace.
///
/// Cloning is cheap; clones share the same driver session and are closed together.
#[derive(Clone)]
pub struct ClusterSession {
    cluster: Cluster,
    slot: Arc<SessionSlot>,
}

impl ClusterSession {
    pub(crate) fn new(cluster: Cluster, slot: Arc<SessionSlot>) -> Self {
        ClusterSession { cluster, slot }
    }

    /// The cluster this session was connected through.
    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Keyspace the session was bound to when connecting.
    pub fn keyspace(&self) -> Option<&str> {
        self.slot.keyspace.as_deref()
    }

    /// Whether neither this session nor its cluster has been closed.
    pub fn is_connected(&self) -> bool {
        self.slot.session.load().is_some()
    }

    /// The driver session, or [`ExecutionError::NotConnected`] once closed.
    pub(crate) fn driver(&self) -> Result<Arc<Session>, ExecutionError> {
        self.slot
            .session
            .load_full()
            .ok_or(ExecutionError::NotConnected)
    }

    /// Closes this session only. Sibling sessions of the same cluster stay connected.
    pub fn disconnect(&self) {
        self.slot.close();
    }

    /// Closes the owning cluster, and with it every session connected through it.
    pub fn disconnect_all(&self) {
        self.cluster.close();
    }

    /// Members of the cluster as currently known to the driver.
    pub fn get_hosts(&self) -> Result<Vec<HostInfo>, ExecutionError> {
        let session = self.driver()?;
        let state = session.get_cluster_state();
        Ok(state
            .get_nodes_info()
            .iter()
            .map(|node| HostInfo {
                datacenter: node.datacenter.clone(),
                address: SocketAddr::new(node.address.ip(), node.address.port()),
                rack: node.rack.clone(),
                is_up: node.is_connected(),
            })
            .collect())
    }

    /// Schema of the whole cluster as CQL text, as described by the server.
    pub async fn export_schema(&self) -> Result<String, ExecutionError> {
        let session = self.driver()?;
        let result = session.query_unpaged("DESCRIBE SCHEMA", &[]).await?;
        let rows = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(IntoRowsResultError::ResultNotRows(_)) => return Ok(String::new()),
            Err(err) => return Err(TranslationError::new(err).into()),
        };

        let mut statements = Vec::new();
        for row in rows.rows::<Row>().map_err(TranslationError::new)? {
            let row = row.map_err(TranslationError::new)?;
            // The create statement is the last column of every described element.
            if let Some(Some(CqlValue::Text(statement))) = row.columns.last() {
                statements.push(statement.clone());
            }
        }
        Ok(statements.join("\n\n"))
    }
}

impl fmt::Debug for ClusterSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterSession")
            .field("cluster", &self.cluster)
            .field("keyspace", &self.slot.keyspace)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// A cluster member as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Datacenter of the node, if known.
    pub datacenter: Option<String>,
    /// Address the driver connects to.
    pub address: SocketAddr,
    /// Rack of the node, if known.
    pub rack: Option<String>,
    /// Whether the driver holds open connections to the node.
    pub is_up: bool,
}

/// Builds a cluster from `config` and connects a session.
///
/// The cluster is closed if the session cannot be established.
pub async fn connect_config(
    config: ClusterConfig,
    keyspace: Option<&str>,
) -> Result<ClusterSession, ConnectError> {
    let cluster = Cluster::build(config)?;
    cluster.connect(keyspace).await
}

/// Connects to the given hosts on the default port.
pub async fn connect(
    hosts: impl IntoIterator<Item = impl Into<String>>,
) -> Result<ClusterSession, ConnectError> {
    connect_config(ClusterConfig::new(hosts), None).await
}

/// Connects to the given hosts with a session bound to `keyspace`.
pub async fn connect_keyspace(
    hosts: impl IntoIterator<Item = impl Into<String>>,
    keyspace: &str,
) -> Result<ClusterSession, ConnectError> {
    connect_config(ClusterConfig::new(hosts), Some(keyspace)).await
}

/// Connects using declarative options. Non-empty `hosts` replace the hosts of the options.
pub async fn connect_with_options(
    hosts: impl IntoIterator<Item = impl Into<String>>,
    mut options: ClusterOptions,
) -> Result<ClusterSession, ConnectError> {
    let hosts: Vec<String> = hosts.into_iter().map(Into::into).collect();
    if !hosts.is_empty() {
        options.hosts = hosts;
    }
    let keyspace = options.keyspace.take();
    connect_config(options.into_config()?, keyspace.as_deref()).await
}

/// Connects to the host of a URI like `cql://10.0.0.1:9042/keyspace`.
pub async fn connect_uri(uri: &str) -> Result<ClusterSession, ConnectError> {
    let uri = ConnectionUri::parse(uri)?;
    info!("Connecting to {}:{:?}", uri.host, uri.port);
    connect_config(uri.to_config(), uri.keyspace.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ClusterConfigError;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn configuration_errors_precede_connecting() {
        assert_matches!(
            connect(Vec::<String>::new()).await,
            Err(ConnectError::Config(ClusterConfigError::EmptyContactPoints))
        );
        assert_matches!(
            connect_uri("http://127.0.0.1/ks").await,
            Err(ConnectError::Config(ClusterConfigError::InvalidUri { .. }))
        );
        let options = ClusterOptions::from_yaml_str("consistency: sometimes").unwrap();
        assert_matches!(
            connect_with_options(["127.0.0.1"], options).await,
            Err(ConnectError::Config(ClusterConfigError::UnknownConsistency(_)))
        );
    }
}
