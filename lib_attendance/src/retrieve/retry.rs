//! # Result-Driven Retry
//!
//! A fixed-delay retry loop for operations whose "failure" is an ordinary
//! value (an empty page, a not-ready status) rather than an error.
//!
//! Rules:
//! - An attempt is repeated only while `retry_if(&value)` holds for an `Ok`.
//! - An `Err` is returned immediately; errors are never retried here.
//! - The loop stops at `max_attempts` or once `max_elapsed` has passed,
//!   whichever comes first, and hands back the last outcome as-is.
//! - The `after` hook sees every attempt before the policy decides anything.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Default pause between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);
/// Default upper bound on attempts, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// What the `after` hook learns about a finished attempt.
#[derive(Debug)]
pub struct Attempt<'a, T, E> {
    /// 1-based attempt number.
    pub number: u32,
    /// Time since the first attempt started.
    pub elapsed: Duration,
    /// The attempt's outcome.
    pub outcome: &'a Result<T, E>,
    /// Whether the predicate asked for another attempt. The bounds may still refuse.
    pub wants_retry: bool,
}

/// Fixed-delay, bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
    max_attempts: u32,
    max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    /// 5 seconds between attempts, at most 6 attempts, no time ceiling.
    fn default() -> Self {
        Self::new(DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Creates a policy. A `max_attempts` of 0 behaves like 1.
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: max_attempts.max(1),
            max_elapsed: None,
        }
    }

    /// Adds a wall-clock ceiling measured from the start of the first attempt.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Pause between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Optional elapsed-time ceiling.
    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed
    }

    fn is_exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        attempts >= self.max_attempts || self.max_elapsed.is_some_and(|max| elapsed >= max)
    }

    /// Runs `op` until its result no longer satisfies `retry_if`, an error
    /// occurs, or a bound is hit.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, Op, Fut, P, H>(&self, mut op: Op, mut retry_if: P, mut after: H) -> Result<T, E>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&T) -> bool,
        H: FnMut(&Attempt<'_, T, E>),
    {
        let started = Instant::now();
        let mut number = 0;

        loop {
            number += 1;
            let outcome = op(number).await;
            let wants_retry = outcome.as_ref().is_ok_and(|value| retry_if(value));
            let elapsed = started.elapsed();

            after(&Attempt {
                number,
                elapsed,
                outcome: &outcome,
                wants_retry,
            });

            if !wants_retry || self.is_exhausted(number, elapsed) {
                return outcome;
            }

            sleep(self.delay).await;
        }
    }
}
