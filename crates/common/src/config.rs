//! Suite configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration read once at suite start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Suite title used as the report heading
    pub suite_name: String,

    /// Dashboard URL every attempt navigates to during setup
    pub app_url: String,

    /// Deadline for each page interaction
    pub explicit_wait_seconds: u64,

    /// Implicit element wait handed to the browser driver
    pub implicit_wait_seconds: u64,

    /// Deadline for the whole body of one attempt
    pub attempt_timeout_seconds: u64,

    /// How many times a failing test is re-run before it is a terminal failure
    pub retry_count: u32,

    /// Capture a screenshot on terminal failure
    pub screenshot_on_failure: bool,

    /// Launch the browser without a window
    pub headless: bool,

    /// Where the materialized report is written
    pub report_path: PathBuf,

    /// Automation-status ledger for data-driven cases
    pub status_path: Option<PathBuf>,

    /// Directory of YAML case catalogues
    pub cases_dir: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            suite_name: "Transaction Insights Automation Suite".to_string(),
            app_url: "http://localhost:3000/".to_string(),
            explicit_wait_seconds: 10,
            implicit_wait_seconds: 10,
            attempt_timeout_seconds: 300,
            retry_count: 2,
            screenshot_on_failure: true,
            headless: true,
            report_path: PathBuf::from("test-output/insights-report.json"),
            status_path: None,
            cases_dir: None,
        }
    }
}

impl SuiteConfig {
    /// Load configuration from file, falling back to defaults when absent.
    /// `.yaml`/`.yml` files are read as YAML, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `INSIGHTS_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("INSIGHTS_APP_URL") {
            self.app_url = url;
        }
        if let Some(v) = lookup("INSIGHTS_EXPLICIT_WAIT") {
            self.explicit_wait_seconds = parse_value("INSIGHTS_EXPLICIT_WAIT", &v)?;
        }
        if let Some(v) = lookup("INSIGHTS_IMPLICIT_WAIT") {
            self.implicit_wait_seconds = parse_value("INSIGHTS_IMPLICIT_WAIT", &v)?;
        }
        if let Some(v) = lookup("INSIGHTS_RETRY_COUNT") {
            self.retry_count = parse_value("INSIGHTS_RETRY_COUNT", &v)?;
        }
        if let Some(v) = lookup("INSIGHTS_SCREENSHOT_ON_FAILURE") {
            self.screenshot_on_failure = parse_value("INSIGHTS_SCREENSHOT_ON_FAILURE", &v)?;
        }
        if let Some(path) = lookup("INSIGHTS_REPORT_PATH") {
            self.report_path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Reject configurations that would leave a wait without a deadline
    pub fn validate(&self) -> Result<()> {
        if self.app_url.trim().is_empty() {
            return Err(Error::InvalidConfig("app_url must not be empty".to_string()));
        }
        if self.explicit_wait_seconds == 0 {
            return Err(Error::InvalidConfig(
                "explicit_wait_seconds must be greater than zero".to_string(),
            ));
        }
        if self.attempt_timeout_seconds == 0 {
            return Err(Error::InvalidConfig(
                "attempt_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn explicit_wait(&self) -> Duration {
        Duration::from_secs(self.explicit_wait_seconds)
    }

    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_seconds)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_seconds)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{key}: cannot parse '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.app_url, "http://localhost:3000/");
        assert_eq!(config.retry_count, 2);
        assert_eq!(config.explicit_wait(), Duration::from_secs(10));
        assert!(config.screenshot_on_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = SuiteConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config, SuiteConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("suite.toml");
        std::fs::write(
            &path,
            "app_url = \"http://127.0.0.1:3001/\"\n\
             retry_count = 0\n\
             screenshot_on_failure = false\n",
        )
        .unwrap();

        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.app_url, "http://127.0.0.1:3001/");
        assert_eq!(config.retry_count, 0);
        assert!(!config.screenshot_on_failure);
        assert_eq!(config.explicit_wait_seconds, 10);
    }

    #[test]
    fn test_load_yaml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("suite.yaml");
        std::fs::write(&path, "retry_count: 1\ncases_dir: cases\n").unwrap();

        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.retry_count, 1);
        assert_eq!(config.cases_dir, Some(PathBuf::from("cases")));
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("suite.toml");
        let config = SuiteConfig {
            retry_count: 5,
            status_path: Some(PathBuf::from("status.json")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SuiteConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_negative_retry_count_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("suite.toml");
        std::fs::write(&path, "retry_count = -1\n").unwrap();
        assert!(matches!(SuiteConfig::load(&path), Err(Error::TomlParse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("INSIGHTS_APP_URL", "http://dashboard.local/"),
            ("INSIGHTS_RETRY_COUNT", "1"),
            ("INSIGHTS_SCREENSHOT_ON_FAILURE", "false"),
            ("INSIGHTS_EXPLICIT_WAIT", " 3 "),
        ]
        .into_iter()
        .collect();

        let mut config = SuiteConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.app_url, "http://dashboard.local/");
        assert_eq!(config.retry_count, 1);
        assert!(!config.screenshot_on_failure);
        assert_eq!(config.explicit_wait_seconds, 3);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = SuiteConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "INSIGHTS_RETRY_COUNT").then(|| "two".to_string())
        });
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_requires_deadlines() {
        let config = SuiteConfig {
            explicit_wait_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SuiteConfig {
            app_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
