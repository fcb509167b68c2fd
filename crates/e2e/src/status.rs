//! Automation-status ledger for data-driven cases.
//!
//! Kept in its own JSON file next to the case catalogues; catalogues are
//! read-only to the suite.

use insights_common::TestOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cases::CASE_METHOD;
use crate::error::E2eResult;
use crate::runner::SuiteResult;

/// Value written for a case that passed under automation
pub const AUTOMATED: &str = "Yes";

/// Case id → automation status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusLedger {
    statuses: BTreeMap<String, String>,
}

impl StatusLedger {
    /// Load the ledger, or start empty if the file does not exist yet
    pub fn load(path: &Path) -> E2eResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the file through a temp file in the same directory
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        tmp.persist(path)?;
        Ok(())
    }

    /// Mark a case as automated. The latest pass wins.
    pub fn record_pass(&mut self, case_id: &str) {
        self.statuses.insert(case_id.to_string(), AUTOMATED.to_string());
    }

    /// Record every data-driven case whose final outcome was a pass.
    /// Returns how many cases were recorded.
    pub fn record_results(&mut self, suite: &SuiteResult) -> usize {
        let mut recorded = 0;
        for result in &suite.results {
            if result.outcome != TestOutcome::Passed || result.identity.method() != CASE_METHOD {
                continue;
            }
            if let Some(case_id) = result.identity.args().first() {
                self.record_pass(case_id);
                recorded += 1;
            }
        }
        recorded
    }

    pub fn status(&self, case_id: &str) -> Option<&str> {
        self.statuses.get(case_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
