// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry decisions and exponential backoff with jitter.
//!
//! `delay(n) = min(base * 2^n, max) + random(0, jitter * that)`
//!
//! With the defaults (1s base, 30s cap, 0.3 jitter, 3 retries) an operation
//! makes at most four attempts. Jitter keeps many clients failing against the
//! same backend from retrying in lockstep.

use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

use haven_core::Outcome;

/// Backoff parameters and default retry budget.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on the exponential term (jitter is added on top).
    pub max_delay: Duration,
    /// Jitter as a fraction of the capped delay, in `[0, 1]`.
    pub jitter: f64,
    /// Default number of retries after the first attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: 0.3,
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Returns true if `outcome` is retryable and `attempt` retries have not used up the budget.
    ///
    /// `attempt` counts retries already made, starting at 0.
    pub fn should_retry(&self, attempt: u32, max_retries: u32, outcome: &Outcome) -> bool {
        outcome.is_retryable() && attempt < max_retries
    }

    /// Exponential term without jitter: `min(base * 2^attempt, max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Delay before retry number `attempt`, with random jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let unit: f64 = rand::thread_rng().gen();
        self.delay_with_jitter(attempt, unit)
    }

    /// Delay with a caller-supplied jitter sample in `[0, 1]`.
    pub fn delay_with_jitter(&self, attempt: u32, unit: f64) -> Duration {
        let backoff = self.backoff(attempt);
        let fraction = self.jitter.clamp(0.0, 1.0) * unit.clamp(0.0, 1.0);
        backoff + backoff.mul_f64(fraction)
    }
}

/// One physical transmission of an operation.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Zero-based ordinal within the operation.
    pub index: u32,
    pub started_at: Instant,
    pub outcome: String,
}

/// Attempt history kept while an operation is unresolved.
#[derive(Debug, Default)]
pub struct AttemptLog {
    attempts: Vec<Attempt>,
}

impl AttemptLog {
    /// Records the start of a new attempt and returns its index.
    pub fn begin(&mut self) -> u32 {
        let index = self.attempts.len() as u32;
        self.attempts.push(Attempt {
            index,
            started_at: Instant::now(),
            outcome: String::new(),
        });
        index
    }

    /// Records the outcome of the latest attempt.
    pub fn finish(&mut self, outcome: &Outcome) {
        if let Some(last) = self.attempts.last_mut() {
            last.outcome = outcome.label();
        }
    }

    /// Number of attempts started.
    pub fn count(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// Time since the first attempt started.
    pub fn elapsed(&self) -> Duration {
        self.attempts
            .first()
            .map(|a| a.started_at.elapsed())
            .unwrap_or_default()
    }

    /// Outcome labels in attempt order, e.g. `status 503, success (200)`.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| a.outcome.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
