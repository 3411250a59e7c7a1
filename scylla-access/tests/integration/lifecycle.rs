use assert_matches::assert_matches;
use scylla_access::client::{connect_uri, shutdown_cluster};
use scylla_access::errors::{ConnectError, ExecutionError};

use crate::utils::{scylla_uri, session_with_table, setup_tracing, test_cluster};

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn disconnect_closes_only_this_session() {
    setup_tracing();
    let cluster = test_cluster();
    let first = cluster.connect(None).await.unwrap();
    let second = cluster.connect(None).await.unwrap();

    first.disconnect();
    assert!(!first.is_connected());
    assert_matches!(
        first.execute("SELECT host_id FROM system.local").await,
        Err(ExecutionError::NotConnected)
    );

    assert!(second.is_connected());
    assert!(!cluster.is_closed());
    second
        .execute("SELECT host_id FROM system.local")
        .await
        .unwrap();
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn disconnect_all_closes_sibling_sessions() {
    setup_tracing();
    let cluster = test_cluster();
    let first = cluster.connect(None).await.unwrap();
    let second = cluster.connect(Some("system")).await.unwrap();

    first.disconnect_all();

    assert!(cluster.is_closed());
    for session in [&first, &second] {
        assert!(!session.is_connected());
        assert_matches!(
            session.execute("SELECT host_id FROM system.local").await,
            Err(ExecutionError::NotConnected)
        );
        assert_matches!(session.get_hosts(), Err(ExecutionError::NotConnected));
    }
    assert_matches!(cluster.connect(None).await, Err(ConnectError::ClusterClosed));

    // Already closed: nothing happens.
    shutdown_cluster(&cluster);
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn single_node_hosts() {
    setup_tracing();
    let session = test_cluster().connect(None).await.unwrap();
    let hosts = session.get_hosts().unwrap();

    assert_eq!(hosts.len(), 1);
    assert!(hosts[0].is_up);
    assert!(hosts[0].datacenter.is_some());
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn schema_export_contains_created_table() {
    setup_tracing();
    let cluster = test_cluster();
    let (session, ks) = session_with_table(&cluster).await;

    let schema = session.export_schema().await.unwrap();
    assert!(schema.contains(&format!("CREATE KEYSPACE {}", ks)));
    assert!(schema.contains(&format!("CREATE TABLE {}.t", ks)));
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn connect_by_uri_binds_keyspace() {
    setup_tracing();
    let cluster = test_cluster();
    let (_, ks) = session_with_table(&cluster).await;

    let session = connect_uri(&format!("cql://{}/{}", scylla_uri(), ks))
        .await
        .unwrap();
    assert_eq!(session.keyspace(), Some(ks.as_str()));
    session.execute("SELECT * FROM t").await.unwrap();
    session.disconnect_all();
}
