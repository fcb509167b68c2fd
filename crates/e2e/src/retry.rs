//! Retry policy: decides whether a failed attempt is re-run

use dashmap::DashMap;
use insights_common::{SuiteConfig, TestIdentity};
use tracing::debug;

use crate::error::AttemptFailure;

/// Retry budget of one test identity for the lifetime of a suite run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    pub attempts_used: u32,
    pub max_attempts: u32,
    /// Last attempt number decided and the decision made for it
    decided: Option<(u32, bool)>,
}

impl RetryAttempt {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempts_used: 0,
            max_attempts,
            decided: None,
        }
    }

    fn decide(&mut self, attempt: u32) -> bool {
        if let Some((decided_attempt, decision)) = self.decided {
            if decided_attempt == attempt {
                return decision;
            }
        }

        let decision = if self.attempts_used < self.max_attempts {
            self.attempts_used += 1;
            true
        } else {
            false
        };
        self.decided = Some((attempt, decision));
        decision
    }

    pub fn exhausted(&self) -> bool {
        self.attempts_used >= self.max_attempts
    }
}

/// Suite-scoped retry policy.
///
/// State is created lazily on the first failure of an identity and is never
/// reset during the run. Each identity's counter sits behind its own map
/// shard entry, so concurrent deciders for different identities do not share
/// a counter.
#[derive(Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    ledger: DashMap<TestIdentity, RetryAttempt>,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ledger: DashMap::new(),
        }
    }

    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(config.retry_count)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide whether `attempt` of `identity` is re-run after `failure`.
    ///
    /// Asking again for the same attempt returns the earlier decision without
    /// spending another retry. Failures that are not retry-eligible are never
    /// retried and leave no state behind.
    pub fn should_retry(
        &self,
        identity: &TestIdentity,
        attempt: u32,
        failure: &AttemptFailure,
    ) -> bool {
        if !failure.is_retryable() {
            return false;
        }

        let mut state = self
            .ledger
            .entry(identity.clone())
            .or_insert_with(|| RetryAttempt::new(self.max_attempts));
        let decision = state.decide(attempt);

        debug!(
            test = %identity,
            attempt,
            used = state.attempts_used,
            max = state.max_attempts,
            retry = decision,
            "retry decision"
        );
        decision
    }

    /// Current budget of `identity`, if it has failed at least once
    pub fn state(&self, identity: &TestIdentity) -> Option<RetryAttempt> {
        self.ledger.get(identity).map(|s| *s)
    }

    /// Identities with retry state
    pub fn tracked(&self) -> usize {
        self.ledger.len()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}
