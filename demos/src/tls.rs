use anyhow::Result;
use scylla_access::client::{connect_with_options, ClusterOptions};
use scylla_access::response::TypedRowsTranslator;
use std::env;

// How to run scylla instance with TLS:
//
// Edit your scylla.yaml file and add paths to certificates
// ex:
// client_encryption_options:
//     enabled: true
//     certificate: /etc/scylla/db.crt
//     keyfile: /etc/scylla/db.key
//
// Bundle the client key pair and the CA certificate into a PKCS#12 keystore:
//     openssl pkcs12 -export -inkey client.key -in client.crt -certfile ca.crt -out client.p12
//
// Then describe the cluster in a yaml file and pass its path in CLUSTER_OPTIONS:
//
// hosts: [127.0.0.1]
// port: 9142
// ssl:
//   keystore_path: ./client.p12
//   keystore_password: changeit
//   cipher_suites: [ECDHE-RSA-AES256-GCM-SHA384]

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let path = env::var("CLUSTER_OPTIONS").unwrap_or_else(|_| "./tls.yaml".to_string());
    let options = ClusterOptions::from_yaml_file(&path)?;

    // SCYLLA_URI, when given, replaces the hosts of the file
    let hosts: Vec<String> = env::var("SCYLLA_URI").into_iter().collect();

    println!("Connecting with options from {} ...", path);

    let session = connect_with_options(hosts, options).await?;

    session.execute("CREATE KEYSPACE IF NOT EXISTS ks WITH REPLICATION = {'class' : 'NetworkTopologyStrategy', 'replication_factor' : 1}").await?;
    session
        .execute("CREATE TABLE IF NOT EXISTS ks.t (a int, b int, c text, primary key (a, b))")
        .await?;
    session
        .execute("INSERT INTO ks.t (a, b, c) VALUES (1, 2, 'abc')")
        .await?;

    let rows = session
        .execute_with(
            "SELECT a, b, c FROM ks.t",
            None,
            TypedRowsTranslator::<(i32, i32, String)>::new(),
        )
        .await?;
    for (a, b, c) in rows {
        println!("a, b, c: {}, {}, {}", a, b, c);
    }

    session.disconnect_all();
    println!("Ok.");

    Ok(())
}
