//! In-process browser double and scripted test bodies shared by the
//! integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use insights_common::{LinkKind, MemoryReportSink, SuiteConfig};
use insights_e2e::{
    AttemptFailure, BodyResult, BodyVerdict, BrowserDriver, BrowserSession, DashboardPage,
    DriverError, LaunchOptions, SuiteRunner, TestBody, TestExecutionContext,
};
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Suite configuration with short deadlines and `retry_count` retries
pub fn config(retry_count: u32, report_dir: &Path) -> SuiteConfig {
    SuiteConfig {
        suite_name: "integration".to_string(),
        app_url: "http://dashboard.test/".to_string(),
        explicit_wait_seconds: 1,
        implicit_wait_seconds: 1,
        attempt_timeout_seconds: 5,
        retry_count,
        report_path: report_dir.join("report.json"),
        ..Default::default()
    }
}

pub fn runner(
    config: SuiteConfig,
    driver: &FakeDriver,
    sink: &Arc<MemoryReportSink>,
) -> SuiteRunner {
    SuiteRunner::new(config, Arc::new(driver.clone()), sink.clone()).unwrap()
}

/// What the fake browser did over a suite run
#[derive(Debug, Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub navigations: AtomicUsize,
    pub screenshots: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Counters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    pub fn screenshots(&self) -> usize {
        self.screenshots.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Dashboard state served by every session of a [`FakeDriver`]
#[derive(Debug, Clone)]
pub struct FakePage {
    pub loaded: bool,
    pub title: bool,
    pub customers: Vec<String>,
    pub columns: Vec<String>,
    pub links: bool,
    pub query: Option<String>,
    pub modal_open: bool,
    pub auto_refresh: bool,
}

impl FakePage {
    /// A dashboard that satisfies every scenario
    pub fn healthy() -> Self {
        Self {
            loaded: true,
            title: true,
            customers: ["Arjun Mehta", "Priya Shah", "Arjun Rao", "Test Co", "Lena Ortiz"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            columns: ["Name", "Date", "Total", "Successful", "Pending", "Errored", "Status"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            links: true,
            query: None,
            modal_open: false,
            auto_refresh: true,
        }
    }
}

#[async_trait]
impl DashboardPage for FakePage {
    async fn is_loaded(&mut self) -> Result<bool, DriverError> {
        Ok(self.loaded && !self.modal_open)
    }

    async fn has_title(&mut self) -> Result<bool, DriverError> {
        Ok(self.title)
    }

    async fn row_count(&mut self) -> Result<usize, DriverError> {
        let rows = match &self.query {
            Some(q) => self.customers.iter().filter(|c| c.contains(q.as_str())).count(),
            None => self.customers.len(),
        };
        Ok(rows)
    }

    async fn header_count(&mut self) -> Result<usize, DriverError> {
        Ok(self.columns.len())
    }

    async fn verify_columns_exist(&mut self, names: &[&str]) -> Result<bool, DriverError> {
        Ok(names.iter().all(|n| self.columns.iter().any(|c| c == n)))
    }

    async fn search(&mut self, query: &str) -> Result<(), DriverError> {
        self.query = Some(query.to_string());
        Ok(())
    }

    async fn clear_search(&mut self) -> Result<(), DriverError> {
        self.query = None;
        Ok(())
    }

    async fn click_first_link(&mut self, kind: LinkKind) -> Result<(), DriverError> {
        if !self.links {
            return Err(DriverError::ElementNotFound(format!("{kind} link")));
        }
        self.modal_open = true;
        Ok(())
    }

    async fn is_modal_displayed(&mut self) -> Result<bool, DriverError> {
        Ok(self.modal_open)
    }

    async fn close_modal(&mut self) -> Result<(), DriverError> {
        self.modal_open = false;
        Ok(())
    }

    async fn toggle_auto_refresh(&mut self) -> Result<(), DriverError> {
        self.auto_refresh = !self.auto_refresh;
        Ok(())
    }
}

/// Browser driver double. Each launch gets a fresh copy of `page`.
#[derive(Debug, Clone)]
pub struct FakeDriver {
    pub counters: Arc<Counters>,
    pub page: FakePage,
    pub fail_launch: bool,
    pub fail_navigate: bool,
    pub fail_screenshot: bool,
    pub fail_close: bool,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::with_page(FakePage::healthy())
    }

    pub fn with_page(page: FakePage) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            page,
            fail_launch: false,
            fail_navigate: false,
            fail_screenshot: false,
            fail_close: false,
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn launch(
        &self,
        _options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, DriverError> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(DriverError::Launch("chrome binary not found".to_string()));
        }
        Ok(Box::new(FakeSession {
            driver: self.clone(),
            page: self.page.clone(),
        }))
    }
}

struct FakeSession {
    driver: FakeDriver,
    page: FakePage,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.driver.counters.navigations.fetch_add(1, Ordering::SeqCst);
        if self.driver.fail_navigate {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        if self.driver.fail_screenshot {
            return Err(DriverError::Screenshot("renderer crashed".to_string()));
        }
        self.driver.counters.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.driver.counters.closes.fetch_add(1, Ordering::SeqCst);
        if self.driver.fail_close {
            return Err(DriverError::Close("session already gone".to_string()));
        }
        Ok(())
    }

    fn page(&mut self) -> &mut dyn DashboardPage {
        &mut self.page
    }
}

/// Fails with an assertion `failures` times, then passes
pub struct Flaky {
    failures: u32,
    calls: AtomicU32,
}

impl Flaky {
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
        }
    }

    pub fn always() -> Self {
        Self::new(u32::MAX)
    }
}

#[async_trait]
impl TestBody for Flaky {
    async fn run(&self, ctx: &mut TestExecutionContext<'_>) -> BodyResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.step(1, "Check the flaky widget");
        if call < self.failures {
            return Err(AttemptFailure::Assertion(format!("widget missing on call {}", call + 1)));
        }
        ctx.checkpoint("Widget present");
        Ok(BodyVerdict::Passed)
    }
}

pub struct Panics;

#[async_trait]
impl TestBody for Panics {
    async fn run(&self, _ctx: &mut TestExecutionContext<'_>) -> BodyResult {
        panic!("table vanished")
    }
}

pub struct Infrastructure;

#[async_trait]
impl TestBody for Infrastructure {
    async fn run(&self, _ctx: &mut TestExecutionContext<'_>) -> BodyResult {
        Err(AttemptFailure::Infrastructure("grid node lost".to_string()))
    }
}

pub struct Skips;

#[async_trait]
impl TestBody for Skips {
    async fn run(&self, _ctx: &mut TestExecutionContext<'_>) -> BodyResult {
        Ok(BodyVerdict::Skipped("feature flag off".to_string()))
    }
}

/// Sleeps past any attempt deadline used in these tests
pub struct Hangs;

#[async_trait]
impl TestBody for Hangs {
    async fn run(&self, _ctx: &mut TestExecutionContext<'_>) -> BodyResult {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(BodyVerdict::Passed)
    }
}
