use anyhow::Result;
use scylla::statement::Consistency;
use scylla::value::CqlValue;
use scylla_access::client::{Cluster, ClusterConfig};
use scylla_access::execution::{DirectExecutor, ExecutionMode};
use scylla_access::network::CompressionMode;
use scylla_access::response::TypedRowsTranslator;
use scylla_access::statement::{bind, ExecutionOptions, RenderedQuery};
use std::env;
use std::num::NonZeroU32;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let uri = env::var("SCYLLA_URI").unwrap_or_else(|_| "127.0.0.1:9042".to_string());

    println!("Connecting to {} ...", uri);

    let cluster = Cluster::build(
        ClusterConfig::new([uri])
            .compression(CompressionMode::Lz4)
            .consistency(Consistency::LocalQuorum),
    )?;
    let session = cluster.connect(None).await?;

    session.execute("CREATE KEYSPACE IF NOT EXISTS examples_ks WITH REPLICATION = {'class' : 'NetworkTopologyStrategy', 'replication_factor' : 1}").await?;
    session
        .execute("CREATE TABLE IF NOT EXISTS examples_ks.basic (a int, b int, c text, primary key (a, b))")
        .await?;

    session
        .execute(RenderedQuery::with_values(
            "INSERT INTO examples_ks.basic (a, b, c) VALUES (?, ?, ?)",
            vec![
                Some(CqlValue::Int(3)),
                Some(CqlValue::Int(4)),
                Some(CqlValue::Text("def".to_owned())),
            ],
        ))
        .await?;

    let prepared = session
        .prepare("INSERT INTO examples_ks.basic (a, b, c) VALUES (?, 7, ?)")
        .await?;
    for (a, c) in [(42, "I'm prepared!"), (43, "I'm prepared 2!"), (44, "I'm prepared 3!")] {
        let bound = bind(
            &prepared,
            vec![Some(CqlValue::Int(a)), Some(CqlValue::Text(c.to_owned()))],
        )?;
        session.execute(bound).await?;
    }

    // Rows can be parsed as tuples
    let options = ExecutionOptions::new().fetch_size(NonZeroU32::new(2).unwrap());
    let rows = session
        .execute_with(
            "SELECT a, b, c FROM examples_ks.basic",
            Some(&options),
            TypedRowsTranslator::<(i32, i32, String)>::new(),
        )
        .await?;
    for (a, b, c) in rows {
        println!("a, b, c: {}, {}, {}", a, b, c);
    }

    // The same query, executed in the background
    let pending = session
        .run(
            "SELECT a, b, c FROM examples_ks.basic",
            ExecutionMode::Async,
            None,
            TypedRowsTranslator::<(i32, i32, String)>::new(),
        )
        .await?
        .into_pending()
        .ok_or_else(|| anyhow::anyhow!("async mode yields a pending result"))?;
    pending.add_listener(|| println!("Background query finished"), DirectExecutor);
    println!("Rows read in background: {}", pending.wait().await?.len());

    for host in session.get_hosts()? {
        println!(
            "Host {} in {:?}/{:?}, up: {}",
            host.address, host.datacenter, host.rack, host.is_up
        );
    }

    cluster.close();
    println!("Ok.");

    Ok(())
}
