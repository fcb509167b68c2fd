//! Report model: per-identity entries that accumulate events across retries,
//! and the sinks that materialize them at suite end.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Severity, TestIdentity};

/// Category assigned to entries unless the registration says otherwise
pub const DEFAULT_CATEGORY: &str = "Dashboard Testing";

/// One log line in a report entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvent {
    /// 1-based attempt that emitted the event
    pub attempt: u32,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Binary artifact attached to an entry (failure screenshots)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub attempt: u32,
    pub caption: String,
    pub media_type: String,
    pub sha256: String,
    pub size_bytes: usize,

    /// Path relative to the report file once materialized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn png(attempt: u32, caption: impl Into<String>, data: Vec<u8>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Self {
            attempt,
            caption: caption.into(),
            media_type: "image/png".to_string(),
            sha256: hex::encode(hasher.finalize()),
            size_bytes: data.len(),
            file: None,
            data,
        }
    }

    fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            _ => "bin",
        }
    }
}

/// Accumulated record of every attempt of one test identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub identity: TestIdentity,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub events: Vec<ReportEvent>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl ReportEntry {
    fn new(identity: TestIdentity, description: &str, category: &str) -> Self {
        Self {
            name: identity.display_name(),
            identity,
            description: description.to_string(),
            category: category.to_string(),
            created_at: Utc::now(),
            events: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Number of events with the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.events.iter().filter(|e| e.severity == severity).count()
    }

    /// Severities in emission order
    pub fn severities(&self) -> Vec<Severity> {
        self.events.iter().map(|e| e.severity).collect()
    }

    /// Events emitted by one attempt
    pub fn events_for_attempt(&self, attempt: u32) -> impl Iterator<Item = &ReportEvent> {
        self.events.iter().filter(move |e| e.attempt == attempt)
    }
}

/// Write handle on a report entry, bound to one attempt
#[derive(Debug, Clone)]
pub struct EntryHandle {
    entry: Arc<Mutex<ReportEntry>>,
    attempt: u32,
}

impl EntryHandle {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        let mut entry = self.entry.lock();
        debug!(test = %entry.identity, attempt = self.attempt, %severity, "{}", message);
        entry.events.push(ReportEvent {
            attempt: self.attempt,
            severity,
            message,
            timestamp: Utc::now(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn pass(&self, message: impl Into<String>) {
        self.log(Severity::Pass, message);
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.log(Severity::Fail, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Severity::Warning, message);
    }

    pub fn skip(&self, message: impl Into<String>) {
        self.log(Severity::Skip, message);
    }

    /// Attach a PNG artifact to the entry
    pub fn attach(&self, data: Vec<u8>, caption: impl Into<String>) {
        let attachment = Attachment::png(self.attempt, caption, data);
        self.entry.lock().attachments.push(attachment);
    }

    /// Copy of the entry as it stands now
    pub fn snapshot(&self) -> ReportEntry {
        self.entry.lock().clone()
    }
}

#[derive(Debug, Default)]
struct BookIndex {
    by_identity: HashMap<TestIdentity, usize>,
    entries: Vec<Arc<Mutex<ReportEntry>>>,
}

/// Suite-scoped store of report entries, one per test identity.
///
/// The index lock is only held for lookup; each entry carries its own lock so
/// writers for different identities never contend.
#[derive(Debug, Default)]
pub struct ReportBook {
    index: Mutex<BookIndex>,
}

impl ReportBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the entry for `identity`, creating it on first use, and return
    /// a handle that stamps events with `attempt`.
    pub fn resolve(
        &self,
        identity: &TestIdentity,
        description: &str,
        category: &str,
        attempt: u32,
    ) -> EntryHandle {
        let mut index = self.index.lock();
        let entry = match index.by_identity.get(identity) {
            Some(&pos) => Arc::clone(&index.entries[pos]),
            None => {
                let entry = Arc::new(Mutex::new(ReportEntry::new(
                    identity.clone(),
                    description,
                    category,
                )));
                let pos = index.entries.len();
                index.entries.push(Arc::clone(&entry));
                index.by_identity.insert(identity.clone(), pos);
                entry
            }
        };
        EntryHandle { entry, attempt }
    }

    pub fn get(&self, identity: &TestIdentity) -> Option<ReportEntry> {
        let index = self.index.lock();
        index
            .by_identity
            .get(identity)
            .map(|&pos| index.entries[pos].lock().clone())
    }

    /// All entries in creation order
    pub fn entries(&self) -> Vec<ReportEntry> {
        let index = self.index.lock();
        index.entries.iter().map(|e| e.lock().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.index.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Suite-level counts derived from terminal outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Attempts executed, retries included
    pub attempts: usize,
    /// Attempts that ended in a retry
    pub retries: usize,
}

/// Everything a sink receives when the suite finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub suite_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: SuiteSummary,
    pub entries: Vec<ReportEntry>,
}

/// Consumer of the finished report. Flushed exactly once per suite run.
pub trait ReportSink: Send + Sync {
    fn flush(&self, report: &SuiteReport) -> Result<()>;
}

/// Writes the report as JSON and failure screenshots beside it
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn report_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn write_artifacts(&self, report: &SuiteReport) -> Result<SuiteReport> {
        let screenshots = self.report_dir().join("screenshots");
        let mut materialized = report.clone();

        for entry in &mut materialized.entries {
            for attachment in &mut entry.attachments {
                if attachment.data.is_empty() {
                    continue;
                }
                std::fs::create_dir_all(&screenshots)?;
                let file_name = format!("{}.{}", attachment.sha256, attachment.extension());
                std::fs::write(screenshots.join(&file_name), &attachment.data)?;
                attachment.file = Some(format!("screenshots/{file_name}"));
            }
        }

        Ok(materialized)
    }
}

impl ReportSink for JsonReportSink {
    fn flush(&self, report: &SuiteReport) -> Result<()> {
        let dir = self.report_dir();
        std::fs::create_dir_all(&dir)?;

        let materialized = self.write_artifacts(report)?;
        let json = serde_json::to_string_pretty(&materialized)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path)?;

        info!("Report written to: {}", self.path.display());
        Ok(())
    }
}

/// Keeps flushed reports in memory
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    flushed: Mutex<Vec<SuiteReport>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flush_count(&self) -> usize {
        self.flushed.lock().len()
    }

    /// Most recently flushed report
    pub fn last(&self) -> Option<SuiteReport> {
        self.flushed.lock().last().cloned()
    }
}

impl ReportSink for MemoryReportSink {
    fn flush(&self, report: &SuiteReport) -> Result<()> {
        self.flushed.lock().push(report.clone());
        Ok(())
    }
}

impl SuiteReport {
    /// Load a report previously written by [`JsonReportSink`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Report(format!("{}: {e}", path.display())))
    }

    pub fn entry(&self, identity: &TestIdentity) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| &e.identity == identity)
    }
}
