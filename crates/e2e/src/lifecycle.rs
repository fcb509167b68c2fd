//! Attempt state machine.
//!
//! An attempt moves `Setup -> Running -> {Passed, Failed}`; a failure goes
//! through `RetryDecision` to `RetryPending` or `TerminalFailure`; every path
//! ends in `Teardown -> Done`. [`conclude`] maps the raw attempt result and
//! the retry verdict to the outcome and the report side effects, without
//! touching a browser or the report itself.

use insights_common::{Severity, TestOutcome};

use crate::error::AttemptFailure;

/// What the body (or setup) produced for one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult {
    Pass,
    Skip(String),
    RetryableFailure(AttemptFailure),
    FatalFailure(AttemptFailure),
}

/// Normal completion of a test body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyVerdict {
    Passed,
    Skipped(String),
}

/// What a test body returns
pub type BodyResult = Result<BodyVerdict, AttemptFailure>;

impl AttemptResult {
    pub fn from_body(result: BodyResult) -> Self {
        match result {
            Ok(BodyVerdict::Passed) => AttemptResult::Pass,
            Ok(BodyVerdict::Skipped(reason)) => AttemptResult::Skip(reason),
            Err(failure) if failure.is_retryable() => AttemptResult::RetryableFailure(failure),
            Err(failure) => AttemptResult::FatalFailure(failure),
        }
    }

    /// Setup failures are infrastructure failures and never retried
    pub fn setup_failure(reason: impl Into<String>) -> Self {
        AttemptResult::FatalFailure(AttemptFailure::Infrastructure(reason.into()))
    }

    /// Whether the retry policy has to be consulted
    pub fn needs_retry_decision(&self) -> bool {
        matches!(self, AttemptResult::RetryableFailure(_))
    }

    pub fn failure(&self) -> Option<&AttemptFailure> {
        match self {
            AttemptResult::RetryableFailure(f) | AttemptResult::FatalFailure(f) => Some(f),
            _ => None,
        }
    }
}

/// States an attempt passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Setup,
    Running,
    Passed,
    Failed,
    Skipped,
    RetryDecision,
    RetryPending,
    TerminalFailure,
    Teardown,
    Done,
}

/// Report side effect requested by a transition, applied in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Log(Severity, String),
    CaptureScreenshot,
}

/// Result of concluding one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Conclusion {
    pub outcome: TestOutcome,
    /// States traversed after the raw result was known
    pub trail: Vec<AttemptPhase>,
    pub effects: Vec<Effect>,
    pub failure: Option<AttemptFailure>,
}

impl Conclusion {
    pub fn captures_screenshot(&self) -> bool {
        self.effects.contains(&Effect::CaptureScreenshot)
    }
}

/// Conclude an attempt.
///
/// `retry_granted` is only looked at for retry-eligible failures; the caller
/// obtains it from the retry policy exactly once per such failure. A
/// screenshot is requested only on the terminal-failure transition.
pub fn conclude(
    result: AttemptResult,
    retry_granted: bool,
    screenshot_on_failure: bool,
) -> Conclusion {
    use AttemptPhase::*;

    match result {
        AttemptResult::Pass => Conclusion {
            outcome: TestOutcome::Passed,
            trail: vec![Passed, Teardown, Done],
            effects: vec![Effect::Log(Severity::Pass, "Test Passed".to_string())],
            failure: None,
        },
        AttemptResult::Skip(reason) => Conclusion {
            outcome: TestOutcome::Skipped,
            trail: vec![Skipped, Teardown, Done],
            effects: vec![Effect::Log(Severity::Skip, format!("Test Skipped: {reason}"))],
            failure: None,
        },
        AttemptResult::RetryableFailure(failure) if retry_granted => Conclusion {
            outcome: TestOutcome::FailedRetrying,
            trail: vec![Failed, RetryDecision, RetryPending, Teardown, Done],
            effects: vec![Effect::Log(
                Severity::Warning,
                format!("Test Failed, Retrying... Error: {failure}"),
            )],
            failure: Some(failure),
        },
        AttemptResult::RetryableFailure(failure) => {
            terminal(
                failure,
                vec![Failed, RetryDecision, TerminalFailure, Teardown, Done],
                screenshot_on_failure,
            )
        }
        AttemptResult::FatalFailure(failure) => {
            terminal(failure, vec![Failed, TerminalFailure, Teardown, Done], screenshot_on_failure)
        }
    }
}

fn terminal(
    failure: AttemptFailure,
    trail: Vec<AttemptPhase>,
    screenshot_on_failure: bool,
) -> Conclusion {
    let mut effects = Vec::with_capacity(2);
    if screenshot_on_failure {
        effects.push(Effect::CaptureScreenshot);
    }
    effects.push(Effect::Log(Severity::Fail, format!("Test Failed: {failure}")));

    Conclusion {
        outcome: TestOutcome::FailedTerminal,
        trail,
        effects,
        failure: Some(failure),
    }
}
