use std::num::NonZeroU32;
use std::time::Duration;

use assert_matches::assert_matches;
use scylla::statement::unprepared::Statement;
use scylla::statement::Consistency;
use scylla::value::CqlValue;
use scylla_access::errors::{BindError, ExecutionError};
use scylla_access::execution::{DirectExecutor, Execution, ExecutionMode};
use scylla_access::response::{RawTranslator, RowsTranslator, TypedRowsTranslator};
use scylla_access::statement::{bind, ExecutionOptions, RenderedQuery, StatementInput};

use crate::utils::{session_with_table, setup_tracing, test_cluster};

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn sync_and_async_results_are_equal() {
    setup_tracing();
    let cluster = test_cluster();
    let (session, ks) = session_with_table(&cluster).await;

    for a in 0..10 {
        session
            .execute(RenderedQuery::with_values(
                format!("INSERT INTO {}.t (a, b) VALUES (?, ?)", ks),
                vec![Some(CqlValue::Int(a)), Some(CqlValue::Text(a.to_string()))],
            ))
            .await
            .unwrap();
    }

    let select = format!("SELECT a, b FROM {}.t", ks);
    let translator = TypedRowsTranslator::<(i32, String)>::new();

    let sync_rows = session
        .run(select.as_str(), ExecutionMode::Sync, None, translator.clone())
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    let pending = session
        .run(select.as_str(), ExecutionMode::Async, None, translator)
        .await
        .unwrap()
        .into_pending()
        .unwrap();
    let async_rows = tokio::task::spawn_blocking(move || pending.get())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sync_rows.len(), 10);
    assert_eq!(sync_rows, *async_rows);
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn prepare_bind_and_execute() {
    setup_tracing();
    let cluster = test_cluster();
    let (session, ks) = session_with_table(&cluster).await;

    let prepared = session
        .run(
            format!("INSERT INTO {}.t (a, b) VALUES (?, ?)", ks),
            ExecutionMode::Prepare,
            None,
            RowsTranslator,
        )
        .await
        .unwrap()
        .into_prepared()
        .unwrap();

    assert_eq!(
        bind(&prepared, vec![Some(CqlValue::Int(1))]).unwrap_err(),
        BindError::ValueCountMismatch {
            expected: 2,
            provided: 1
        }
    );

    let bound = bind(
        &prepared,
        vec![Some(CqlValue::Int(1)), Some(CqlValue::Text("one".to_owned()))],
    )
    .unwrap();
    session.execute(bound).await.unwrap();

    let bound_null = bind(&prepared, vec![Some(CqlValue::Int(2)), None]).unwrap();
    let options = ExecutionOptions::new()
        .consistency(Consistency::One)
        .idempotent(true);
    session
        .execute_with(bound_null, Some(&options), RowsTranslator)
        .await
        .unwrap();

    let rows = session
        .execute_with(
            format!("SELECT a, b FROM {}.t WHERE a IN (1, 2)", ks),
            None,
            TypedRowsTranslator::<(i32, Option<String>)>::new(),
        )
        .await
        .unwrap();
    let mut rows = rows;
    rows.sort();
    assert_eq!(rows, vec![(1, Some("one".to_owned())), (2, None)]);
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn fetch_size_pages_through_all_rows() {
    setup_tracing();
    let cluster = test_cluster();
    let (session, ks) = session_with_table(&cluster).await;

    let prepared = session
        .prepare(format!("INSERT INTO {}.t (a, b) VALUES (?, ?)", ks))
        .await
        .unwrap();
    for a in 0..25 {
        session
            .execute(bind(&prepared, vec![Some(CqlValue::Int(a)), None]).unwrap())
            .await
            .unwrap();
    }

    let options = ExecutionOptions::new().fetch_size(NonZeroU32::new(10).unwrap());
    let result = session
        .execute_with(format!("SELECT a FROM {}.t", ks), Some(&options), RawTranslator)
        .await
        .unwrap();
    assert!(result.pages().len() >= 3);
    assert_eq!(result.into_rows::<(i32,)>().unwrap().len(), 25);

    let unpaged = session
        .execute_with(format!("SELECT a FROM {}.t", ks), None, RawTranslator)
        .await
        .unwrap();
    assert_eq!(unpaged.pages().len(), 1);
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn driver_errors_propagate_unchanged() {
    setup_tracing();
    let session = test_cluster().connect(None).await.unwrap();

    assert_matches!(
        session.execute("SELECT * FROM no_such_keyspace.no_such_table").await,
        Err(ExecutionError::Request(_))
    );
    assert_matches!(
        session.prepare("SELEC nonsense").await,
        Err(ExecutionError::Prepare(_))
    );

    let pending = session
        .execute_async("SELECT * FROM no_such_keyspace.t", None, RowsTranslator)
        .unwrap();
    assert_matches!(pending.wait().await, Err(ExecutionError::Request(_)));
}

#[tokio::test]
#[cfg_attr(not(scylla_access_live_tests), ignore = "requires a running cluster at SCYLLA_URI")]
async fn prebuilt_statement_and_listeners() {
    setup_tracing();
    let session = test_cluster().connect(None).await.unwrap();

    let mut statement = Statement::new("SELECT host_id FROM system.local");
    statement.set_request_timeout(Some(Duration::from_secs(5)));

    let execution = session
        .run(
            StatementInput::Unprepared(statement),
            ExecutionMode::Async,
            Some(&ExecutionOptions::new().tracing(false)),
            RowsTranslator,
        )
        .await
        .unwrap();
    let pending = match execution {
        Execution::Pending(pending) => pending,
        other => panic!("unexpected execution {:?}", other),
    };

    let (tx, rx) = tokio::sync::oneshot::channel();
    let reader = pending.clone();
    pending.add_listener(
        move || {
            let _ = tx.send(reader.is_done());
        },
        DirectExecutor,
    );
    assert!(rx.await.unwrap());
    assert_eq!(pending.wait().await.unwrap().len(), 1);
}
