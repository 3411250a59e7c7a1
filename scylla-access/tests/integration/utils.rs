use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use scylla_access::client::{Cluster, ClusterConfig, ClusterSession};

pub(crate) fn setup_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(tracing_subscriber::fmt::TestWriter::new())
        .try_init();
}

static UNIQUE_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn unique_keyspace_name() -> String {
    let cnt = UNIQUE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let name = format!(
        "test_access_{}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs(),
        cnt
    );
    println!("Unique name: {}", name);
    name
}

/// Address of the node under test, `host:port`. Tests needing it run when built
/// with `RUSTFLAGS="--cfg scylla_access_live_tests"`.
pub(crate) fn scylla_uri() -> String {
    env::var("SCYLLA_URI").unwrap_or_else(|_| "127.0.0.1:9042".to_string())
}

pub(crate) fn test_cluster() -> Cluster {
    Cluster::build(ClusterConfig::new([scylla_uri()])).unwrap()
}

/// Connects a session and creates a fresh keyspace with one table `t (a int PRIMARY KEY, b text)`.
/// Returns the session and the keyspace name.
pub(crate) async fn session_with_table(cluster: &Cluster) -> (ClusterSession, String) {
    let session = cluster.connect(None).await.unwrap();
    let ks = unique_keyspace_name();
    session
        .execute(format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
             {{'class' : 'NetworkTopologyStrategy', 'replication_factor' : 1}}",
            ks
        ))
        .await
        .unwrap();
    session
        .execute(format!(
            "CREATE TABLE IF NOT EXISTS {}.t (a int PRIMARY KEY, b text)",
            ks
        ))
        .await
        .unwrap();
    (session, ks)
}
