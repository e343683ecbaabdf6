//! # Retry Policy
//!
//! Finite retry counter for catalog refreshes.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   attempts = 0 ──► call fails ──► record_failure()                     │
//! │        ▲                              │                                 │
//! │        │                   attempts < max_attempts?                     │
//! │        │                     │                 │                        │
//! │        │                    yes                no                       │
//! │        │                     ▼                 ▼                        │
//! │        │              RetryAfter(delay)      GiveUp                     │
//! │        │                                                                │
//! │        └────────── reset() (on success)                                 │
//! │                                                                         │
//! │  DEFAULT: 3 attempts in total, constant 2s between them, no jitter     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use backoff::backoff::{Backoff, Constant};
use std::fmt;
use std::time::Duration;

/// Default number of attempts (the first call included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included. At least 1.
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A fresh counter for one operation.
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempts: 0,
            backoff: Constant::new(self.delay),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again.
    RetryAfter(Duration),
    /// The attempt budget is spent.
    GiveUp,
}

/// Failure counter driven by a [`RetryPolicy`].
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
    backoff: Constant,
}

impl fmt::Debug for RetryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryState")
            .field("policy", &self.policy)
            .field("attempts", &self.attempts)
            .finish()
    }
}

impl RetryState {
    /// Records a failed attempt and decides what comes next.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.attempts += 1;
        if self.attempts >= self.policy.max_attempts {
            return RetryDecision::GiveUp;
        }

        match self.backoff.next_backoff() {
            Some(delay) => RetryDecision::RetryAfter(delay),
            None => RetryDecision::GiveUp,
        }
    }

    /// Clears the counter (after a success).
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.backoff.reset();
    }

    /// Failed attempts recorded since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}
