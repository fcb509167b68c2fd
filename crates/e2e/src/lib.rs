//! Transaction Insights dashboard UI suite
//!
//! This crate runs browser-driven tests against the dashboard and:
//! - Gives every attempt a fresh browser session and always releases it
//! - Retries flaky failures up to a per-test limit
//! - Merges all attempts of a test into one report entry
//! - Captures a single screenshot when a test finally fails
//! - Flushes the report once, after the last test
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SuiteRunner (lifecycle)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  per test identity, per attempt:                            │
//! │    ├── ReportBook::resolve() -> EntryHandle                 │
//! │    ├── BrowserDriver::launch() -> SessionGuard              │
//! │    ├── navigate(app_url)                                    │
//! │    ├── TestBody::run(&mut TestExecutionContext)             │
//! │    ├── RetryPolicy::should_retry()                          │
//! │    ├── conclude() -> Conclusion { outcome, effects }        │
//! │    └── SessionGuard::release()                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRegistry                                               │
//! │    ├── scenarios: TC_001 .. TC_013                          │
//! │    └── cases: YAML catalogue -> execute_test_case[..]       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  after the suite: ReportSink::flush(), StatusLedger::save() │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod cases;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod page;
pub mod registry;
pub mod retry;
pub mod runner;
pub mod scenarios;
pub mod status;

pub use browser::{BrowserDriver, BrowserSession, LaunchOptions, SessionGuard};
pub use cases::{configured_suite, CaseCatalogue, TestCase, CASE_METHOD};
pub use context::TestExecutionContext;
pub use error::{ensure, AttemptFailure, DriverError, E2eError, E2eResult};
pub use lifecycle::{conclude, AttemptResult, BodyResult, BodyVerdict, Conclusion, Effect};
pub use page::{BoundedPage, DashboardPage};
pub use registry::{RegisteredTest, TestBody, TestRegistry};
pub use retry::RetryPolicy;
pub use runner::{SuiteResult, SuiteRunner, TestResult};
pub use scenarios::{standard_suite, Scenario};
pub use status::StatusLedger;
