//! [`Cluster`] is the handle from which sessions are connected. Building it performs no
//! network I/O; all options are applied to a single driver [`SessionBuilder`] which every
//! later connect call clones.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session_builder::SessionBuilder;
use scylla::client::{Compression, PoolSize};
use tracing::{debug, info, warn};

use super::config::{contact_point, ClusterConfig, DEFAULT_PORT};
use super::session::{ClusterSession, SessionSlot};
use crate::authentication::{AuthMode, KerberosAuthenticator};
use crate::errors::{ClusterConfigError, ConnectError};
use crate::policies::{DefaultPolicy, ReconnectionPolicy};

/// Unconnected handle to a cluster, shared by every session connected through it.
///
/// Cloning is cheap and yields a handle to the same cluster. Once [closed](Cluster::close),
/// every session derived from it is closed too and no more sessions can be connected.
#[derive(Clone)]
pub struct Cluster {
    inner: Arc<ClusterInner>,
}

struct ClusterInner {
    builder: SessionBuilder,
    contact_points: Vec<String>,
    port: u16,
    reconnection_policy: Option<Arc<dyn ReconnectionPolicy>>,
    closed: AtomicBool,
    sessions: Mutex<Vec<Weak<SessionSlot>>>,
}

impl Cluster {
    /// Applies the configuration to a driver session builder.
    ///
    /// Every option is applied only when present. Fails on configuration the driver
    /// cannot honor; never touches the network.
    pub fn build(config: ClusterConfig) -> Result<Cluster, ClusterConfigError> {
        if config.contact_points.is_empty() {
            return Err(ClusterConfigError::EmptyContactPoints);
        }

        let port = match config.port {
            Some(0) => return Err(ClusterConfigError::InvalidPort),
            Some(port) => port,
            None => DEFAULT_PORT,
        };

        config.protocol_version.check()?;

        let mut builder = SessionBuilder::new();

        if let Some(credentials) = &config.credentials {
            debug!("Using plain text credentials of user {}", credentials.username);
            builder = builder.user(&credentials.username, &credentials.password);
        }

        if let Some(pooling) = config.pooling {
            if let Some(pool_size) = pooling.to_pool_size()? {
                debug!("Using pool size {:?} for local hosts", pool_size);
                builder = builder.pool_size(pool_size);
            }
        }

        let contact_points: Vec<String> = config
            .contact_points
            .iter()
            .map(|host| contact_point(host, port))
            .collect();
        builder = builder.known_nodes(&contact_points);

        if let Some(timeout) = config.connect_timeout {
            builder = builder.connection_timeout(timeout);
        }

        let profile_configured = config.retry_policy.is_some()
            || config.load_balancing_policy.is_some()
            || config.local_datacenter.is_some()
            || config.consistency.is_some()
            || config.request_timeout.is_some();
        if profile_configured {
            let mut profile = ExecutionProfile::builder();
            if let Some(policy) = config.retry_policy {
                profile = profile.retry_policy(policy);
            }
            if let Some(policy) = config.load_balancing_policy {
                profile = profile.load_balancing_policy(policy);
            } else if let Some(datacenter) = config.local_datacenter {
                debug!("Preferring datacenter {} for load balancing", datacenter);
                profile = profile
                    .load_balancing_policy(DefaultPolicy::builder().prefer_datacenter(datacenter).build());
            }
            if let Some(consistency) = config.consistency {
                profile = profile.consistency(consistency);
            }
            if let Some(timeout) = config.request_timeout {
                profile = profile.request_timeout(Some(timeout));
            }
            builder = builder.default_execution_profile_handle(profile.build().into_handle());
        }

        builder = builder.compression(config.compression.to_driver());

        #[cfg(feature = "openssl-010")]
        {
            let context = match (config.ssl_context, config.transport_security) {
                (Some(context), _) => Some(context),
                (None, Some(security)) => Some(security.resolve()?),
                (None, None) => None,
            };
            if let Some(context) = context {
                debug!("Enabling TLS for all connections");
                builder = builder.tls_context(Some(context));
            }
        }

        if let AuthMode::Kerberos(options) = config.auth_mode {
            debug!("Using Kerberos authentication for service {}", options.service_name());
            builder = builder.authenticator_provider(Arc::new(KerberosAuthenticator::new(options)));
        }

        debug!(
            "Built cluster handle for contact points {:?}",
            contact_points
        );
        Ok(Cluster {
            inner: Arc::new(ClusterInner {
                builder,
                contact_points,
                port,
                reconnection_policy: config.reconnection_policy,
                closed: AtomicBool::new(false),
                sessions: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Contact points as passed to the driver, in configuration order.
    pub fn contact_points(&self) -> &[String] {
        &self.inner.contact_points
    }

    /// Port used for contact points given without one.
    pub fn port(&self) -> u16 {
        self.inner.port
    }

    /// Connection pool size of each host.
    pub fn pool_size(&self) -> PoolSize {
        self.inner.builder.config.connection_pool_size
    }

    /// Compression negotiated with the nodes.
    pub fn compression(&self) -> Option<Compression> {
        self.inner.builder.config.compression
    }

    /// Whether connections are secured with TLS.
    pub fn uses_tls(&self) -> bool {
        self.inner.builder.config.tls_context.is_some()
    }

    /// The default execution profile carrying the configured policies and consistency.
    pub fn default_execution_profile(&self) -> ExecutionProfile {
        self.inner
            .builder
            .config
            .default_execution_profile_handle
            .to_profile()
    }

    /// Whether [`Cluster::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Connects a new session, optionally bound to a keyspace.
    ///
    /// If the driver fails to establish the session, the attempt is repeated as long as
    /// the reconnection policy allows. When it gives up, this cluster is closed and the
    /// last driver error is returned.
    pub async fn connect(&self, keyspace: Option<&str>) -> Result<ClusterSession, ConnectError> {
        if self.is_closed() {
            return Err(ConnectError::ClusterClosed);
        }

        let mut builder = self.inner.builder.clone();
        if let Some(keyspace) = keyspace {
            builder = builder.use_keyspace(keyspace, false);
        }

        let mut schedule = self
            .inner
            .reconnection_policy
            .as_ref()
            .map(|policy| policy.new_schedule());
        let mut attempt: usize = 1;

        let session = loop {
            match builder.build().await {
                Ok(session) => break session,
                Err(err) => {
                    let delay = schedule.as_mut().and_then(|s| s.next_delay());
                    match delay {
                        Some(delay) if !self.is_closed() => {
                            warn!(
                                "Connect attempt {} failed: {}, retrying in {:?}",
                                attempt, err, delay
                            );
                            attempt += 1;
                            tokio::time::sleep(delay).await;
                        }
                        _ => {
                            warn!(
                                "Connect attempt {} failed: {}, closing the cluster",
                                attempt, err
                            );
                            self.close();
                            return Err(err.into());
                        }
                    }
                }
            }
        };

        let slot = Arc::new(SessionSlot::new(session, keyspace.map(str::to_owned)));
        {
            let mut sessions = self
                .inner
                .sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if self.is_closed() {
                slot.close();
                return Err(ConnectError::ClusterClosed);
            }
            sessions.retain(|session| session.strong_count() > 0);
            sessions.push(Arc::downgrade(&slot));
        }

        info!(
            "Connected session to {:?}{}",
            self.inner.contact_points,
            keyspace.map(|ks| format!(" using keyspace {}", ks)).unwrap_or_default()
        );
        Ok(ClusterSession::new(self.clone(), slot))
    }

    /// Closes the cluster and every session connected through it.
    ///
    /// Idempotent: closing an already closed cluster does nothing.
    /// Requests already in flight run to completion.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let sessions = std::mem::take(
            &mut *self
                .inner
                .sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut closed = 0;
        for slot in sessions.iter().filter_map(Weak::upgrade) {
            slot.close();
            closed += 1;
        }
        info!(
            "Closed cluster {:?} ({} open sessions)",
            self.inner.contact_points, closed
        );
    }

    #[cfg(test)]
    pub(crate) fn reconnection_policy(&self) -> Option<&Arc<dyn ReconnectionPolicy>> {
        self.inner.reconnection_policy.as_ref()
    }
}

/// Closes a cluster handle directly. Same as [`Cluster::close`].
pub fn shutdown_cluster(cluster: &Cluster) {
    cluster.close();
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("contact_points", &self.inner.contact_points)
            .field("port", &self.inner.port)
            .field("reconnection_policy", &self.inner.reconnection_policy)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::{ClusterOptions, Credentials, PoolingOptions, ProtocolVersion};
    use crate::network::CompressionMode;
    use crate::policies::{ConstantReconnectionPolicy, FallthroughRetryPolicy};
    use assert_matches::assert_matches;
    use scylla::statement::Consistency;
    use std::time::Duration;

    #[test]
    fn build_keeps_contact_points_in_order() {
        let cluster = Cluster::build(ClusterConfig::new(["10.0.0.3", "10.0.0.1", "10.0.0.2"]))
            .unwrap();
        assert_eq!(
            cluster.contact_points(),
            ["10.0.0.3:9042", "10.0.0.1:9042", "10.0.0.2:9042"]
        );
        assert!(!cluster.is_closed());
    }

    #[test]
    fn single_host_with_port_uses_defaults() {
        let options = ClusterOptions::from_yaml_str("hosts: [127.0.0.1]\nport: 9042\n").unwrap();
        let cluster = Cluster::build(options.into_config().unwrap()).unwrap();

        assert_eq!(cluster.contact_points(), ["127.0.0.1:9042"]);
        assert_eq!(cluster.port(), 9042);
        assert_matches!(cluster.pool_size(), PoolSize::PerShard(n) if n.get() == 1);
        assert_eq!(cluster.compression(), None);
        assert!(!cluster.uses_tls());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert_matches!(
            Cluster::build(ClusterConfig::new(Vec::<String>::new())),
            Err(ClusterConfigError::EmptyContactPoints)
        );
        assert_matches!(
            Cluster::build(ClusterConfig::new(["h"]).port(0)),
            Err(ClusterConfigError::InvalidPort)
        );
        assert_matches!(
            Cluster::build(ClusterConfig::new(["h"]).protocol_version(ProtocolVersion(5))),
            Err(ClusterConfigError::UnsupportedProtocolVersion { requested: 5, .. })
        );
        assert_matches!(
            Cluster::build(ClusterConfig::new(["h"]).pooling(PoolingOptions::new(0))),
            Err(ClusterConfigError::InvalidPooling(_))
        );
    }

    #[test]
    fn options_reach_the_builder() {
        let cluster = Cluster::build(
            ClusterConfig::new(["db1", "db2"])
                .port(19042)
                .credentials(Credentials::new("app", "secret"))
                .pooling(PoolingOptions::new(3).max_connections_per_host(6))
                .compression(CompressionMode::Lz4)
                .consistency(Consistency::LocalQuorum)
                .request_timeout(Duration::from_secs(3))
                .retry_policy(Arc::new(FallthroughRetryPolicy::new()))
                .reconnection_policy(Arc::new(ConstantReconnectionPolicy::new(
                    Duration::from_millis(10),
                    2,
                ))),
        )
        .unwrap();

        assert_eq!(cluster.contact_points(), ["db1:19042", "db2:19042"]);
        assert_matches!(cluster.pool_size(), PoolSize::PerHost(n) if n.get() == 3);
        assert_eq!(cluster.compression(), Some(Compression::Lz4));
        assert!(cluster.reconnection_policy().is_some());

        let profile = cluster.default_execution_profile();
        assert_eq!(profile.get_consistency(), Consistency::LocalQuorum);
        assert_eq!(profile.get_request_timeout(), Some(Duration::from_secs(3)));
    }

    #[cfg(feature = "openssl-010")]
    #[test]
    fn transport_security_is_resolved_at_build() {
        use crate::network::tls::test_keystore::write_self_signed;
        use crate::network::{KeystoreSpec, TransportSecurity};

        let keystore = write_self_signed("pw");
        let cluster = Cluster::build(ClusterConfig::new(["h"]).transport_security(
            TransportSecurity::Keystore(KeystoreSpec::new(keystore.path(), "pw")),
        ))
        .unwrap();
        assert!(cluster.uses_tls());

        assert_matches!(
            Cluster::build(ClusterConfig::new(["h"]).transport_security(
                TransportSecurity::Keystore(KeystoreSpec::new("/nonexistent.p12", "pw")),
            )),
            Err(ClusterConfigError::Tls(_))
        );
    }

    #[cfg(feature = "openssl-010")]
    #[test]
    fn prebuilt_context_takes_precedence() {
        use crate::network::{KeystoreSpec, TransportSecurity};
        use openssl::ssl::{SslContextBuilder, SslMethod};

        let context = SslContextBuilder::new(SslMethod::tls_client())
            .unwrap()
            .build();
        // The keystore does not exist; it must not be read at all.
        let cluster = Cluster::build(
            ClusterConfig::new(["h"])
                .transport_security(TransportSecurity::Keystore(KeystoreSpec::new(
                    "/nonexistent.p12",
                    "pw",
                )))
                .ssl_context(context),
        )
        .unwrap();
        assert!(cluster.uses_tls());
    }

    #[test]
    fn close_is_idempotent() {
        let cluster = Cluster::build(ClusterConfig::new(["127.0.0.1"])).unwrap();
        let clone = cluster.clone();
        cluster.close();
        assert!(clone.is_closed());
        shutdown_cluster(&clone);
        assert!(cluster.is_closed());
    }

    #[tokio::test]
    async fn closed_cluster_refuses_to_connect() {
        let cluster = Cluster::build(ClusterConfig::new(["127.0.0.1"])).unwrap();
        cluster.close();
        assert_matches!(cluster.connect(None).await, Err(ConnectError::ClusterClosed));
    }
}
