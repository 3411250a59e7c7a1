use assert_matches::assert_matches;
use scylla::errors::NewSessionError;
use scylla_access::client::{connect_keyspace, Cluster, ClusterConfig};
use scylla_access::errors::ConnectError;
use scylla_access::policies::ConstantReconnectionPolicy;
use std::sync::Arc;
use std::time::Duration;

use crate::utils::setup_tracing;

#[tokio::test]
#[ntest::timeout(60000)]
async fn failed_connect_closes_the_cluster() {
    setup_tracing();
    let cluster =
        Cluster::build(ClusterConfig::new(["cassandrasuckssomuch.invalid"]).port(9042)).unwrap();

    let err = cluster.connect(Some("ks")).await.unwrap_err();
    assert_matches!(
        err,
        ConnectError::NewSession(ref inner)
            if matches!(**inner, NewSessionError::FailedToResolveAnyHostname(_))
    );
    assert!(cluster.is_closed());

    // Closing again is a no-op, the same as for any closed cluster.
    cluster.close();
    assert!(cluster.is_closed());
    assert_matches!(cluster.connect(None).await, Err(ConnectError::ClusterClosed));
}

#[tokio::test]
#[ntest::timeout(60000)]
async fn reconnection_policy_is_exhausted_before_closing() {
    setup_tracing();
    let cluster = Cluster::build(
        ClusterConfig::new(["scylladbisthefastestdb.invalid"]).reconnection_policy(Arc::new(
            ConstantReconnectionPolicy::new(Duration::from_millis(10), 2),
        )),
    )
    .unwrap();

    assert_matches!(
        cluster.connect(None).await,
        Err(ConnectError::NewSession(_))
    );
    assert!(cluster.is_closed());
}

#[tokio::test]
#[ntest::timeout(60000)]
async fn convenience_connect_reports_driver_error() {
    setup_tracing();
    assert_matches!(
        connect_keyspace(["bad-host.invalid"], "ks").await,
        Err(ConnectError::NewSession(_))
    );
}
