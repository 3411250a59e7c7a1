//! Preparing and executing statements on a [`ClusterSession`].
//!
//! The mode of every call is explicit: [`ExecutionMode::Prepare`] only prepares,
//! [`ExecutionMode::Sync`] resolves the execution before returning and
//! [`ExecutionMode::Async`] returns an [`AsyncResult`] while the execution runs
//! on a spawned task.

use std::fmt;
use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use scylla::client::session::Session;
use scylla::response::PagingState;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::Row;
use tokio::runtime::Handle;
use tracing::{debug, Instrument};

use crate::client::ClusterSession;
use crate::errors::ExecutionError;
use crate::response::{RawResult, ResultTranslator, RowsTranslator};
use crate::statement::{self, CqlStatement, ExecutionOptions, StatementInput};

pub mod deferred;

pub use deferred::{AsyncResult, DirectExecutor, ListenerExecutor, Task};

/// How a statement is handled by [`ClusterSession::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Prepare the statement without executing it.
    Prepare,
    /// Execute and translate the result before returning.
    #[default]
    Sync,
    /// Execute on a spawned task and return a deferred result.
    Async,
}

/// What [`ClusterSession::run`] produced, depending on the mode.
pub enum Execution<T> {
    /// [`ExecutionMode::Prepare`]: the prepared statement.
    Prepared(PreparedStatement),
    /// [`ExecutionMode::Sync`]: the translated result.
    Completed(T),
    /// [`ExecutionMode::Async`]: the result, once the execution completes.
    Pending(AsyncResult<T>),
}

impl<T> Execution<T> {
    /// The prepared statement, if this is the outcome of a prepare call.
    pub fn into_prepared(self) -> Option<PreparedStatement> {
        match self {
            Execution::Prepared(prepared) => Some(prepared),
            _ => None,
        }
    }

    /// The translated result, if the execution was synchronous.
    pub fn into_completed(self) -> Option<T> {
        match self {
            Execution::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// The deferred result, if the execution was asynchronous.
    pub fn into_pending(self) -> Option<AsyncResult<T>> {
        match self {
            Execution::Pending(result) => Some(result),
            _ => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Execution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Execution::Prepared(prepared) => f
                .debug_tuple("Prepared")
                .field(&prepared.get_statement())
                .finish(),
            Execution::Completed(value) => f.debug_tuple("Completed").field(value).finish(),
            Execution::Pending(result) => f.debug_tuple("Pending").field(result).finish(),
        }
    }
}

impl ClusterSession {
    /// Prepares or executes `input` according to `mode`.
    ///
    /// `options` apply to this call only. They are ignored in prepare mode, so that
    /// they never stick to the returned prepared statement. Driver errors are
    /// returned unchanged; retrying is left to the retry policy.
    pub async fn run<Tr>(
        &self,
        input: impl Into<StatementInput>,
        mode: ExecutionMode,
        options: Option<&ExecutionOptions>,
        translator: Tr,
    ) -> Result<Execution<Tr::Output>, ExecutionError>
    where
        Tr: ResultTranslator + 'static,
        Tr::Output: Send + Sync + 'static,
    {
        match mode {
            ExecutionMode::Prepare => self.prepare(input).await.map(Execution::Prepared),
            ExecutionMode::Sync => self
                .execute_with(input, options, translator)
                .await
                .map(Execution::Completed),
            ExecutionMode::Async => self
                .execute_async(input, options, translator)
                .map(Execution::Pending),
        }
    }

    /// Executes `input` and returns its rows.
    pub async fn execute(&self, input: impl Into<StatementInput>) -> Result<Vec<Row>, ExecutionError> {
        self.execute_with(input, None, RowsTranslator).await
    }

    /// Executes `input` with per-call options and translates the result.
    pub async fn execute_with<Tr: ResultTranslator>(
        &self,
        input: impl Into<StatementInput>,
        options: Option<&ExecutionOptions>,
        translator: Tr,
    ) -> Result<Tr::Output, ExecutionError> {
        let session = self.driver()?;
        let (statement, fetch_size) = prepare_dispatch(input.into(), options)?;
        let result = dispatch(&session, statement, fetch_size).await?;
        Ok(translator.translate(result)?)
    }

    /// Starts executing `input` on a spawned task.
    ///
    /// The statement is built and the options applied before this returns, so
    /// input errors are reported here rather than through the [`AsyncResult`].
    /// Outside a tokio runtime this fails with [`ExecutionError::NoRuntime`].
    pub fn execute_async<Tr>(
        &self,
        input: impl Into<StatementInput>,
        options: Option<&ExecutionOptions>,
        translator: Tr,
    ) -> Result<AsyncResult<Tr::Output>, ExecutionError>
    where
        Tr: ResultTranslator + 'static,
        Tr::Output: Send + Sync + 'static,
    {
        let runtime = current_runtime()?;
        let session = self.driver()?;
        let (statement, fetch_size) = prepare_dispatch(input.into(), options)?;
        let (completer, result) = deferred::channel();

        runtime.spawn(
            async move {
                let execution = async {
                    let result = dispatch(&session, statement, fetch_size).await?;
                    Ok::<_, ExecutionError>(translator.translate(result)?)
                };
                let outcome = match AssertUnwindSafe(execution).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(ExecutionError::TaskFailed(panic_message(&*panic))),
                };
                completer.complete(outcome);
            }
            .in_current_span(),
        );
        Ok(result)
    }

    /// Prepares the CQL text of `input` on the server.
    ///
    /// Values of structured queries are dropped. An unprepared driver statement keeps
    /// its settings; a bound statement yields the statement it was bound to.
    pub async fn prepare(
        &self,
        input: impl Into<StatementInput>,
    ) -> Result<PreparedStatement, ExecutionError> {
        let session = self.driver()?;
        match statement::build(input.into())? {
            CqlStatement::Unprepared { statement, .. } => {
                debug!("Preparing {}", statement.contents);
                Ok(session.prepare(statement).await?)
            }
            CqlStatement::Prepared { statement, .. } => Ok(statement),
        }
    }
}

fn current_runtime() -> Result<Handle, ExecutionError> {
    Handle::try_current().map_err(|err| ExecutionError::NoRuntime(err.to_string()))
}

fn prepare_dispatch(
    input: StatementInput,
    options: Option<&ExecutionOptions>,
) -> Result<(CqlStatement, Option<NonZeroU32>), ExecutionError> {
    let mut statement = statement::build(input)?;
    let fetch_size = match options {
        Some(options) => {
            statement.apply_options(options);
            options.fetch_size
        }
        None => None,
    };
    Ok((statement, fetch_size))
}

async fn dispatch(
    session: &Session,
    statement: CqlStatement,
    fetch_size: Option<NonZeroU32>,
) -> Result<RawResult, ExecutionError> {
    debug!(
        "Executing {} ({} values, {})",
        statement.text(),
        statement.values().len(),
        match fetch_size {
            Some(size) => format!("fetch size {}", size),
            None => "unpaged".to_owned(),
        }
    );

    let pages = match (statement, fetch_size) {
        (CqlStatement::Unprepared { statement, values }, None) => {
            vec![session.query_unpaged(statement, &values).await?]
        }
        (CqlStatement::Prepared { statement, values }, None) => {
            vec![session.execute_unpaged(&statement, &values).await?]
        }
        (CqlStatement::Unprepared { statement, values }, Some(_)) => {
            let mut pages = Vec::new();
            let mut paging_state = PagingState::start();
            loop {
                let (page, response) = session
                    .query_single_page(statement.clone(), &values, paging_state)
                    .await?;
                pages.push(page);
                match response.into_paging_control_flow() {
                    ControlFlow::Break(()) => break pages,
                    ControlFlow::Continue(next) => paging_state = next,
                }
            }
        }
        (CqlStatement::Prepared { statement, values }, Some(_)) => {
            let mut pages = Vec::new();
            let mut paging_state = PagingState::start();
            loop {
                let (page, response) = session
                    .execute_single_page(&statement, &values, paging_state)
                    .await?;
                pages.push(page);
                match response.into_paging_control_flow() {
                    ControlFlow::Break(()) => break pages,
                    ControlFlow::Continue(next) => paging_state = next,
                }
            }
        }
    };
    Ok(RawResult::new(pages))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("translator panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("translator panicked: {}", message)
    } else {
        "translator panicked".to_owned()
    }
}
