//! Reconnection configurations\
//! To decide whether and when to attempt establishing a session again after a failed
//! attempt, a [`Cluster`](crate::client::cluster::Cluster) uses any object which implements
//! the `ReconnectionPolicy` trait.

use std::fmt::Debug;
use std::time::Duration;

/// Specifies a policy used to decide when to attempt connecting again.
pub trait ReconnectionPolicy: Debug + Send + Sync {
    /// Called for each connect call, starts a schedule of attempts.
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule>;
}

/// Used throughout a single connect call to pace its attempts.
pub trait ReconnectionSchedule: Send + Sync {
    /// Called after an attempt failed - `None` means give up and report the last error.
    fn next_delay(&mut self) -> Option<Duration>;
}

/// Never attempts again; the first failure is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnectionPolicy;

impl ReconnectionPolicy for NoReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule> {
        Box::new(NoReconnectionSchedule)
    }
}

struct NoReconnectionSchedule;

impl ReconnectionSchedule for NoReconnectionSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        None
    }
}

/// Waits the same delay before each of at most `max_attempts` further attempts.
#[derive(Debug, Clone, Copy)]
pub struct ConstantReconnectionPolicy {
    delay: Duration,
    max_attempts: usize,
}

impl ConstantReconnectionPolicy {
    /// Creates a policy with a fixed delay.
    pub fn new(delay: Duration, max_attempts: usize) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

impl ReconnectionPolicy for ConstantReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule> {
        Box::new(ConstantSchedule {
            delay: self.delay,
            remaining: self.max_attempts,
        })
    }
}

struct ConstantSchedule {
    delay: Duration,
    remaining: usize,
}

impl ReconnectionSchedule for ConstantSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.delay)
    }
}

/// Doubles the delay after every attempt, starting at `base_delay` and
/// capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialReconnectionPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: usize,
}

impl ExponentialReconnectionPolicy {
    /// Creates an exponential policy. `max_delay` lower than `base_delay` is raised to it.
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: usize) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            max_attempts,
        }
    }
}

impl ReconnectionPolicy for ExponentialReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule> {
        Box::new(ExponentialSchedule {
            next: self.base_delay,
            max_delay: self.max_delay,
            remaining: self.max_attempts,
        })
    }
}

struct ExponentialSchedule {
    next: Duration,
    max_delay: Duration,
    remaining: usize,
}

impl ReconnectionSchedule for ExponentialSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max_delay);
        Some(delay)
    }
}
