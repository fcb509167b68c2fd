//! Transaction Insights common library
//!
//! Shared data model for the dashboard UI suite: test identities, outcome
//! and severity enums, the suite-scoped report book, report sinks and the
//! suite configuration.

pub mod config;
pub mod error;
pub mod report;
pub mod types;

pub use config::SuiteConfig;
pub use error::{Error, Result};
pub use report::{
    Attachment, EntryHandle, JsonReportSink, MemoryReportSink, ReportBook, ReportEntry,
    ReportEvent, ReportSink, SuiteReport, SuiteSummary,
};
pub use types::*;

/// Suite library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
