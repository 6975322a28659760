//! Bounded retries for network-bound tool operations.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Pending(0) --ok--> Succeeded
//! Pending(n) --err, n+1 < max--> Pending(n+1)
//! Pending(n) --err, n+1 = max--> Exhausted
//! ```
//!
//! Every failed attempt is logged as a warning naming the attempt and the
//! ceiling. Errors that are not [retryable](ToolError::is_retryable) stop the
//! loop immediately and are returned unchanged.

use std::thread;
use std::time::Duration;

use tracing::{error, warn};

use crate::types::ToolError;

/// Default attempt ceiling for upload and submit operations.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry ceiling and optional delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Rejects a zero ceiling, which would mean never attempting at all.
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.max_attempts == 0 {
            return Err(ToolError::Config(
                "max_attempts must be at least 1. Set [component] max_attempts in xamkit.toml"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Position of a retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempts made so far, all failed.
    Pending(u32),
    Succeeded,
    Exhausted,
}

impl RetryState {
    /// Next state after an attempt from `Pending(attempts_so_far)`.
    pub fn advance(self, attempt_succeeded: bool, max_attempts: u32) -> RetryState {
        match self {
            RetryState::Pending(_) if attempt_succeeded => RetryState::Succeeded,
            RetryState::Pending(n) if n + 1 < max_attempts => RetryState::Pending(n + 1),
            RetryState::Pending(_) => RetryState::Exhausted,
            terminal => terminal,
        }
    }
}

/// Runs `op` until it succeeds or `policy.max_attempts` is reached.
///
/// `op` receives the 1-based attempt number.
///
/// # Errors
/// - [`ToolError::Config`] if the policy has a zero ceiling; `op` is never called
/// - the error itself if it is not retryable
/// - [`ToolError::RetriesExhausted`] carrying the last error otherwise
pub fn with_retry<T, F>(operation: &str, policy: &RetryPolicy, mut op: F) -> Result<T, ToolError>
where
    F: FnMut(u32) -> Result<T, ToolError>,
{
    policy.validate()?;

    let mut state = RetryState::Pending(0);
    loop {
        let RetryState::Pending(so_far) = state else {
            unreachable!("terminal states return from the loop");
        };
        let attempt = so_far + 1;

        let err = match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        warn!(
            operation,
            "attempt {} of {} failed: {}",
            attempt,
            policy.max_attempts,
            err
        );

        state = state.advance(false, policy.max_attempts);
        if state == RetryState::Exhausted {
            error!(
                operation,
                attempts = attempt,
                "giving up after {} attempt(s): {}",
                attempt,
                err
            );
            return Err(ToolError::RetriesExhausted {
                operation: operation.to_string(),
                attempts: attempt,
                last_error: Box::new(err),
            });
        }
        if !policy.delay.is_zero() {
            thread::sleep(policy.delay);
        }
    }
}
