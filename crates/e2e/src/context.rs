//! Per-attempt execution context handed to test bodies

use insights_common::{EntryHandle, TestIdentity, TestOutcome};
use std::time::Duration;

use crate::browser::BrowserSession;
use crate::page::BoundedPage;

/// State of one attempt. Created after setup, dropped once the attempt has
/// been concluded; the retry state and report entry it refers to outlive it.
pub struct TestExecutionContext<'s> {
    identity: TestIdentity,
    attempt: u32,
    entry: EntryHandle,
    session: &'s mut (dyn BrowserSession + 'static),
    explicit_wait: Duration,
    outcome: Option<TestOutcome>,
}

impl<'s> TestExecutionContext<'s> {
    pub fn new(
        identity: TestIdentity,
        attempt: u32,
        entry: EntryHandle,
        session: &'s mut (dyn BrowserSession + 'static),
        explicit_wait: Duration,
    ) -> Self {
        Self {
            identity,
            attempt,
            entry,
            session,
            explicit_wait,
            outcome: None,
        }
    }

    pub fn identity(&self) -> &TestIdentity {
        &self.identity
    }

    /// 1-based attempt number
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn entry(&self) -> &EntryHandle {
        &self.entry
    }

    /// Dashboard page object with every call bounded by the explicit wait
    pub fn page(&mut self) -> BoundedPage<'_> {
        BoundedPage::new(self.session.page(), self.explicit_wait)
    }

    /// Log a numbered step heading
    pub fn step(&self, number: u32, description: &str) {
        self.entry.info(format!("Step {number}: {description}"));
    }

    /// Log a satisfied expectation
    pub fn checkpoint(&self, message: impl AsRef<str>) {
        self.entry.info(format!("✓ {}", message.as_ref()));
    }

    /// Log a free-form note
    pub fn note(&self, message: impl Into<String>) {
        self.entry.info(message);
    }

    pub fn outcome(&self) -> Option<TestOutcome> {
        self.outcome
    }

    pub(crate) fn session(&mut self) -> &mut (dyn BrowserSession + 'static) {
        &mut *self.session
    }

    pub(crate) fn record_outcome(&mut self, outcome: TestOutcome) {
        self.outcome = Some(outcome);
    }
}
