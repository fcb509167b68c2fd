//! Suite runner: drives every registered test through the attempt lifecycle,
//! retrying flaky failures and flushing the report once at the end.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use insights_common::{
    EntryHandle, ReportBook, ReportSink, SuiteConfig, SuiteReport, SuiteSummary, TestIdentity,
    TestOutcome,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::browser::{BrowserDriver, BrowserSession, LaunchOptions, SessionGuard};
use crate::context::TestExecutionContext;
use crate::error::{AttemptFailure, E2eResult};
use crate::lifecycle::{conclude, AttemptPhase, AttemptResult, Conclusion, Effect};
use crate::registry::{RegisteredTest, TestRegistry};
use crate::retry::RetryPolicy;
use crate::status::StatusLedger;

/// Final result of one test identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub identity: TestIdentity,
    pub name: String,
    pub outcome: TestOutcome,
    pub attempts: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of a suite run. Counts derive from terminal outcomes only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    pub run_id: Uuid,
    pub suite_name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub attempts: usize,
    pub retries: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl SuiteResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn result(&self, identity: &TestIdentity) -> Option<&TestResult> {
        self.results.iter().find(|r| &r.identity == identity)
    }

    pub fn summary(&self) -> SuiteSummary {
        SuiteSummary {
            total: self.total,
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            attempts: self.attempts,
            retries: self.retries,
        }
    }
}

/// State that lives exactly as long as one suite run
struct SuiteState {
    retry: RetryPolicy,
    book: ReportBook,
}

impl SuiteState {
    fn new(config: &SuiteConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            book: ReportBook::new(),
        }
    }
}

/// Suite results collected so far, flushed exactly once: by `finish` on
/// the normal path, or on drop when the suite future is cancelled.
struct PendingFlush<'a> {
    sink: &'a dyn ReportSink,
    book: &'a ReportBook,
    run_id: Uuid,
    suite_name: &'a str,
    started_at: DateTime<Utc>,
    results: Vec<TestResult>,
    flushed: bool,
}

impl<'a> PendingFlush<'a> {
    fn new(sink: &'a dyn ReportSink, book: &'a ReportBook, suite_name: &'a str) -> Self {
        Self {
            sink,
            book,
            run_id: Uuid::new_v4(),
            suite_name,
            started_at: Utc::now(),
            results: Vec::new(),
            flushed: false,
        }
    }

    fn suite(&self, elapsed: Duration) -> SuiteResult {
        let count = |outcome: TestOutcome| {
            self.results
                .iter()
                .filter(|r| r.outcome == outcome)
                .count()
        };
        let attempts: usize = self.results.iter().map(|r| r.attempts as usize).sum();
        SuiteResult {
            run_id: self.run_id,
            suite_name: self.suite_name.to_string(),
            total: self.results.len(),
            passed: count(TestOutcome::Passed),
            failed: count(TestOutcome::FailedTerminal),
            skipped: count(TestOutcome::Skipped),
            attempts,
            retries: attempts - self.results.len(),
            duration_ms: elapsed.as_millis() as u64,
            results: self.results.clone(),
        }
    }

    fn flush(&mut self, summary: SuiteSummary) -> insights_common::Result<()> {
        self.flushed = true;
        let report = SuiteReport {
            run_id: self.run_id,
            suite_name: self.suite_name.to_string(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            summary,
            entries: self.book.entries(),
        };
        self.sink.flush(&report)
    }

    fn finish(mut self, elapsed: Duration) -> E2eResult<SuiteResult> {
        let suite = self.suite(elapsed);
        self.flush(suite.summary())?;
        Ok(suite)
    }
}

impl Drop for PendingFlush<'_> {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }

        let elapsed = (Utc::now() - self.started_at).to_std().unwrap_or_default();
        let summary = self.suite(elapsed).summary();
        warn!(
            "Suite '{}' aborted after {} finished test(s), flushing partial report",
            self.suite_name, summary.total
        );
        if let Err(e) = self.flush(summary) {
            error!("Failed to flush partial report: {}", e);
        }
    }
}

fn update_status(path: &Path, suite: &SuiteResult) -> E2eResult<usize> {
    let mut ledger = StatusLedger::load(path)?;
    let updated = ledger.record_results(suite);
    ledger.save(path)?;
    Ok(updated)
}

struct AttemptReport {
    outcome: TestOutcome,
    failure: Option<AttemptFailure>,
}

/// Lifecycle orchestrator
pub struct SuiteRunner {
    config: SuiteConfig,
    driver: Arc<dyn BrowserDriver>,
    sink: Arc<dyn ReportSink>,
}

impl SuiteRunner {
    pub fn new(
        config: SuiteConfig,
        driver: Arc<dyn BrowserDriver>,
        sink: Arc<dyn ReportSink>,
    ) -> E2eResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            driver,
            sink,
        })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run every registered test sequentially, one browser session at a time.
    ///
    /// If the returned future is dropped before the suite finishes, the
    /// entries recorded so far are flushed as a partial report.
    pub async fn run(&self, registry: &TestRegistry) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        let state = SuiteState::new(&self.config);
        let mut pending =
            PendingFlush::new(self.sink.as_ref(), &state.book, &self.config.suite_name);

        info!(
            "Running {} test(s) in '{}' (retries: {})",
            registry.len(),
            self.config.suite_name,
            state.retry.max_attempts()
        );

        for test in registry.iter() {
            let result = self.run_test(&state, test).await;
            match result.outcome {
                TestOutcome::Passed => info!(
                    "✓ {} ({} ms, {} attempt(s))",
                    result.name, result.duration_ms, result.attempts
                ),
                TestOutcome::Skipped => info!("- {} (skipped)", result.name),
                _ => error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            }
            pending.results.push(result);
        }

        let suite = pending.finish(start.elapsed())?;

        if let Some(path) = &self.config.status_path {
            match update_status(path, &suite) {
                Ok(updated) => debug!("Automation status updated for {} case(s)", updated),
                Err(e) => warn!(
                    "Failed to update automation status at {}: {}",
                    path.display(),
                    e
                ),
            }
        }

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} attempts, {} ms)",
            suite.passed, suite.failed, suite.skipped, suite.attempts, suite.duration_ms
        );

        Ok(suite)
    }

    /// Run attempts of one identity until an outcome is terminal
    async fn run_test(&self, state: &SuiteState, test: &RegisteredTest) -> TestResult {
        let start = Instant::now();
        let mut attempt = 1;

        loop {
            let span = info_span!("attempt", test = %test.identity, attempt);
            let report = self.run_attempt(state, test, attempt).instrument(span).await;

            if report.outcome.is_terminal() {
                return TestResult {
                    identity: test.identity.clone(),
                    name: test.identity.display_name(),
                    outcome: report.outcome,
                    attempts: attempt,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: report.failure.map(|f| f.to_string()),
                };
            }

            warn!("{} failed on attempt {}, retrying", test.identity, attempt);
            attempt += 1;
        }
    }

    async fn run_attempt(
        &self,
        state: &SuiteState,
        test: &RegisteredTest,
        attempt: u32,
    ) -> AttemptReport {
        debug!(phase = ?AttemptPhase::Setup);
        let entry = state
            .book
            .resolve(&test.identity, &test.description, &test.category, attempt);
        if attempt > 1 {
            entry.info(format!("--- Retry started (attempt {attempt}) ---"));
        }

        let options = LaunchOptions::from_config(&self.config);
        let launched =
            tokio::time::timeout(self.config.attempt_timeout(), self.driver.launch(&options)).await;
        let session = match launched {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return self.launch_failed(&entry, &test.identity, e.to_string()).await,
            Err(_) => {
                let reason = format!(
                    "browser launch timed out after {}s",
                    self.config.attempt_timeout_seconds
                );
                return self.launch_failed(&entry, &test.identity, reason).await;
            }
        };

        let guard = SessionGuard::new(session, test.identity.to_string());
        let mut session = guard.session().await;
        let conclusion = self
            .setup_and_run(state, test, attempt, &entry, &mut **session)
            .await;
        drop(session);

        debug!(phase = ?AttemptPhase::Teardown);
        if let Err(e) = guard.release().await {
            warn!("Failed to release browser session for {}: {}", test.identity, e);
            entry.warn(format!("Failed to release browser session: {e}"));
        }

        debug!(outcome = %conclusion.outcome, trail = ?conclusion.trail, "attempt finished");
        AttemptReport {
            outcome: conclusion.outcome,
            failure: conclusion.failure,
        }
    }

    async fn setup_and_run(
        &self,
        state: &SuiteState,
        test: &RegisteredTest,
        attempt: u32,
        entry: &EntryHandle,
        session: &mut (dyn BrowserSession + 'static),
    ) -> Conclusion {
        let navigated = tokio::time::timeout(
            self.config.attempt_timeout(),
            session.navigate(&self.config.app_url),
        )
        .await;
        let setup_error = match navigated {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!(
                "navigation to {} timed out after {}s",
                self.config.app_url, self.config.attempt_timeout_seconds
            )),
        };
        if let Some(reason) = setup_error {
            let c = conclude(
                AttemptResult::setup_failure(reason),
                false,
                self.config.screenshot_on_failure,
            );
            self.apply_effects(entry, Some(session), &test.identity, &c.effects).await;
            return c;
        }

        debug!(phase = ?AttemptPhase::Running);
        let mut ctx = TestExecutionContext::new(
            test.identity.clone(),
            attempt,
            entry.clone(),
            session,
            self.config.explicit_wait(),
        );
        let result = self.execute_body(test, &mut ctx).await;

        let retry_granted = match &result {
            AttemptResult::RetryableFailure(failure) => {
                debug!(phase = ?AttemptPhase::RetryDecision);
                state.retry.should_retry(&test.identity, attempt, failure)
            }
            _ => false,
        };

        let c = conclude(result, retry_granted, self.config.screenshot_on_failure);
        self.apply_effects(entry, Some(ctx.session()), &test.identity, &c.effects)
            .await;
        ctx.record_outcome(c.outcome);
        c
    }

    async fn execute_body(
        &self,
        test: &RegisteredTest,
        ctx: &mut TestExecutionContext<'_>,
    ) -> AttemptResult {
        let body = AssertUnwindSafe(test.body.run(ctx)).catch_unwind();
        match tokio::time::timeout(self.config.attempt_timeout(), body).await {
            Ok(Ok(result)) => AttemptResult::from_body(result),
            Ok(Err(panic)) => AttemptResult::RetryableFailure(AttemptFailure::Unexpected(
                panic_message(panic.as_ref()),
            )),
            Err(_) => AttemptResult::RetryableFailure(AttemptFailure::Timeout {
                seconds: self.config.attempt_timeout_seconds,
            }),
        }
    }

    /// The browser never came up, so there is no session to capture or release
    async fn launch_failed(
        &self,
        entry: &EntryHandle,
        identity: &TestIdentity,
        reason: String,
    ) -> AttemptReport {
        error!("Setup failed for {}: {}", identity, reason);
        let c = conclude(
            AttemptResult::setup_failure(reason),
            false,
            self.config.screenshot_on_failure,
        );
        self.apply_effects(entry, None, identity, &c.effects).await;
        AttemptReport {
            outcome: c.outcome,
            failure: c.failure,
        }
    }

    /// Apply report effects in order. Reporting problems are logged as
    /// warnings on the entry and never change the outcome.
    async fn apply_effects(
        &self,
        entry: &EntryHandle,
        mut session: Option<&mut (dyn BrowserSession + 'static)>,
        identity: &TestIdentity,
        effects: &[Effect],
    ) {
        for effect in effects {
            match effect {
                Effect::Log(severity, message) => entry.log(*severity, message.clone()),
                Effect::CaptureScreenshot => {
                    let Some(session) = session.as_deref_mut() else {
                        debug!("No browser session to capture a screenshot from");
                        continue;
                    };
                    let wait = self.config.explicit_wait();
                    let captured = tokio::time::timeout(wait, session.screenshot()).await;
                    match captured {
                        Ok(Ok(png)) => {
                            let caption = format!("Failure Screenshot - {}", identity.method());
                            entry.attach(png, caption);
                            entry.info("Screenshot captured for failed test");
                        }
                        Ok(Err(e)) => {
                            warn!("Failed to capture screenshot for {}: {}", identity, e);
                            entry.warn(format!("Failed to capture screenshot: {e}"));
                        }
                        Err(_) => {
                            warn!("Screenshot for {} timed out", identity);
                            entry.warn(format!(
                                "Failed to capture screenshot: timed out after {}s",
                                self.config.explicit_wait_seconds
                            ));
                        }
                    }
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("test body panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("test body panicked: {s}")
    } else {
        "test body panicked".to_string()
    }
}
