//! [`AsyncResult`] is a single-assignment handle to the outcome of an execution
//! running in the background. It can be read by blocking threads ([`AsyncResult::get`]),
//! by async tasks ([`AsyncResult::wait`]) and by completion listeners.
//!
//! ```text
//!  Completer ──complete(outcome)──→ Shared { outcome, listeners }
//!                                       │
//!           ┌───────────────────────────┼──────────────────────────┐
//!           ↓                           ↓                          ↓
//!   get / get_timeout            wait().await          listener on its executor
//!   (Condvar)                    (Notify)
//! ```

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::trace;

use crate::errors::{ExecutionError, WaitTimeout};

type Outcome<T> = Result<Arc<T>, ExecutionError>;

/// A listener callback, as handed to a [`ListenerExecutor`].
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs listener callbacks.
pub trait ListenerExecutor: Send + Sync {
    /// Schedules `task` to run once.
    fn execute(&self, task: Task);
}

/// Spawns each callback as a task on the runtime.
impl ListenerExecutor for tokio::runtime::Handle {
    fn execute(&self, task: Task) {
        self.spawn(async move { task() });
    }
}

/// Runs callbacks right away: on the thread resolving the result, or on the
/// registering thread if the result is already resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExecutor;

impl ListenerExecutor for DirectExecutor {
    fn execute(&self, task: Task) {
        task()
    }
}

struct Listener {
    callback: Task,
    executor: Box<dyn ListenerExecutor>,
}

struct State<T> {
    outcome: Option<Outcome<T>>,
    listeners: Vec<Listener>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    resolved: Condvar,
    notify: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, outcome: Result<T, ExecutionError>) {
        let listeners = {
            let mut state = self.lock();
            if state.outcome.is_some() {
                return;
            }
            state.outcome = Some(outcome.map(Arc::new));
            std::mem::take(&mut state.listeners)
        };
        self.resolved.notify_all();
        self.notify.notify_waiters();
        trace!("Resolved async result, running {} listeners", listeners.len());
        for listener in listeners {
            listener.executor.execute(listener.callback);
        }
    }
}

/// Deferred outcome of an execution.
///
/// Resolves exactly once; every read after that returns the same outcome. The
/// value is shared between readers through an [`Arc`], so it need not be `Clone`.
/// Cloning yields another handle to the same outcome.
pub struct AsyncResult<T> {
    shared: Arc<Shared<T>>,
}

/// Write side of an [`AsyncResult`]. Dropping it unresolved resolves the
/// result with [`ExecutionError::TaskFailed`].
pub(crate) struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

/// Creates an unresolved result and the completer resolving it.
pub(crate) fn channel<T>() -> (Completer<T>, AsyncResult<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            outcome: None,
            listeners: Vec::new(),
        }),
        resolved: Condvar::new(),
        notify: Notify::new(),
    });
    (
        Completer {
            shared: Some(shared.clone()),
        },
        AsyncResult { shared },
    )
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, outcome: Result<T, ExecutionError>) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(outcome);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(Err(ExecutionError::TaskFailed(
                "execution task ended before producing a result".to_owned(),
            )));
        }
    }
}

impl<T> AsyncResult<T> {
    /// An already resolved result.
    pub fn ready(outcome: Result<T, ExecutionError>) -> Self {
        let (completer, result) = channel();
        completer.complete(outcome);
        result
    }

    /// Whether the result has been resolved.
    pub fn is_done(&self) -> bool {
        self.shared.lock().outcome.is_some()
    }

    fn outcome(&self) -> Option<Outcome<T>> {
        self.shared.lock().outcome.clone()
    }

    /// Registers `callback` to run on `executor` once the result is resolved.
    ///
    /// Every registered callback runs exactly once. Registering on a resolved
    /// result schedules the callback immediately.
    pub fn add_listener(
        &self,
        callback: impl FnOnce() + Send + 'static,
        executor: impl ListenerExecutor + 'static,
    ) {
        let callback: Task = Box::new(callback);
        {
            let mut state = self.shared.lock();
            if state.outcome.is_none() {
                state.listeners.push(Listener {
                    callback,
                    executor: Box::new(executor),
                });
                return;
            }
        }
        executor.execute(callback);
    }

    /// Blocks the current thread until the result is resolved.
    ///
    /// Must not be called from within an async context; a runtime worker blocked
    /// here may be the one that should drive the execution. Use [`Self::wait`] there.
    pub fn get(&self) -> Result<Arc<T>, ExecutionError> {
        let state = self.shared.lock();
        let state = self
            .shared
            .resolved
            .wait_while(state, |state| state.outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match &state.outcome {
            Some(outcome) => outcome.clone(),
            None => Err(ExecutionError::TaskFailed(
                "async result woken up unresolved".to_owned(),
            )),
        }
    }

    /// Like [`Self::get`], but gives up after `timeout`.
    ///
    /// Giving up is reported as [`WaitTimeout`], never as an execution error; the
    /// execution itself keeps running.
    pub fn get_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Result<Arc<T>, ExecutionError>, WaitTimeout> {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .resolved
            .wait_timeout_while(state, timeout, |state| state.outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match &state.outcome {
            Some(outcome) => Ok(outcome.clone()),
            None => Err(WaitTimeout(timeout)),
        }
    }

    /// Waits for the result without blocking the thread.
    pub async fn wait(&self) -> Result<Arc<T>, ExecutionError> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            // Registered before checking, so a resolution in between is not missed.
            notified.as_mut().enable();
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            notified.await;
        }
    }
}

impl<T> Clone for AsyncResult<T> {
    fn clone(&self) -> Self {
        AsyncResult {
            shared: self.shared.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for AsyncResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome() {
            Some(outcome) => f.debug_tuple("AsyncResult").field(&outcome).finish(),
            None => f.write_str("AsyncResult(<pending>)"),
        }
    }
}
