//! The dashboard matrix and data-driven cases against an in-process page

mod support;

use insights_common::{MemoryReportSink, Severity, TestIdentity, TestOutcome};
use insights_e2e::{
    configured_suite, standard_suite, CaseCatalogue, Scenario, TestRegistry, CASE_METHOD,
};
use std::sync::Arc;
use support::*;
use tempfile::TempDir;

#[tokio::test]
async fn healthy_dashboard_passes_every_scenario() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let sink = Arc::new(MemoryReportSink::new());
    let runner = runner(config(2, tmp.path()), &driver, &sink);

    let suite = runner.run(&standard_suite().unwrap()).await.unwrap();

    let failures: Vec<_> = suite
        .results
        .iter()
        .filter(|r| r.outcome != TestOutcome::Passed)
        .map(|r| (r.name.clone(), r.error.clone()))
        .collect();
    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    assert_eq!(suite.passed, Scenario::ALL.len());
    assert_eq!(suite.attempts, Scenario::ALL.len());

    // bodies only log informational steps; the verdict is the runner's
    let report = sink.last().unwrap();
    for entry in &report.entries {
        assert_eq!(entry.count(Severity::Pass), 1, "{}", entry.name);
        assert_eq!(entry.count(Severity::Warning), 0, "{}", entry.name);
        assert_eq!(entry.category, "Dashboard Testing");
    }
}

#[tokio::test]
async fn search_scenario_logs_its_steps() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let sink = Arc::new(MemoryReportSink::new());
    let runner = runner(config(0, tmp.path()), &driver, &sink);

    let mut registry = standard_suite().unwrap();
    registry.retain_named(&[Scenario::SearchFilters.method_name()]);
    runner.run(&registry).await.unwrap();

    let entry = &sink.last().unwrap().entries[0];
    let messages: Vec<_> = entry.events.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&"Initial row count: 5"));
    assert!(messages.contains(&"Filtered row count: 2"));
    assert!(messages.contains(&"Step 3: Enter search term 'Arjun' in Search bar"));
    assert_eq!(messages.last(), Some(&"Test Passed"));
}

#[tokio::test]
async fn missing_column_fails_after_retries() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let mut page = FakePage::healthy();
    page.columns.retain(|c| c != "Errored");
    let driver = FakeDriver::with_page(page);
    let sink = Arc::new(MemoryReportSink::new());
    let runner = runner(config(2, tmp.path()), &driver, &sink);

    let mut registry = standard_suite().unwrap();
    registry.retain_named(&[Scenario::ColumnsPresent.method_name()]);
    let suite = runner.run(&registry).await.unwrap();

    let result = &suite.results[0];
    assert_eq!(result.outcome, TestOutcome::FailedTerminal);
    assert_eq!(result.attempts, 3);
    assert_eq!(
        result.error.as_deref(),
        Some("Assertion failed: Not all expected columns found")
    );

    let entry = &sink.last().unwrap().entries[0];
    assert_eq!(entry.count(Severity::Warning), 2);
    assert_eq!(entry.count(Severity::Fail), 1);
    assert_eq!(entry.attachments.len(), 1);
    assert_eq!(entry.attachments[0].caption, "Failure Screenshot - columns_present");
}

#[tokio::test]
async fn missing_link_surfaces_as_element_not_found() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let mut page = FakePage::healthy();
    page.links = false;
    let driver = FakeDriver::with_page(page);
    let sink = Arc::new(MemoryReportSink::new());
    let runner = runner(config(1, tmp.path()), &driver, &sink);

    let mut registry = standard_suite().unwrap();
    registry.retain_named(&[Scenario::ErroredModal.method_name()]);
    let suite = runner.run(&registry).await.unwrap();

    let error = suite.results[0].error.clone().unwrap();
    assert!(error.starts_with("Element not found: Errored link"), "{error}");
    assert_eq!(suite.results[0].attempts, 2);
}

#[tokio::test]
async fn catalogue_cases_run_matching_scenarios_and_skip_the_rest() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let cases_dir = tmp.path().join("cases");
    std::fs::create_dir_all(&cases_dir).unwrap();
    std::fs::write(
        cases_dir.join("dashboard.yaml"),
        r#"
- id: TC_001
  title: Dashboard loads
  expected: Title and table are visible
- id: TC_012
  title: Auto-refresh toggle
- id: TC_077
  title: Export to CSV
"#,
    )
    .unwrap();

    let driver = FakeDriver::new();
    let sink = Arc::new(MemoryReportSink::new());
    let mut config = config(1, tmp.path());
    config.cases_dir = Some(cases_dir.clone());
    config.status_path = Some(tmp.path().join("status.json"));

    let mut registry = configured_suite(&config).unwrap();
    registry.retain_named(&[CASE_METHOD]);
    assert_eq!(registry.len(), 3);

    let runner = runner(config.clone(), &driver, &sink);
    let suite = runner.run(&registry).await.unwrap();
    assert_eq!((suite.passed, suite.failed, suite.skipped), (2, 0, 1));

    let catalogue = CaseCatalogue::load_all(&cases_dir).unwrap();
    let unknown = catalogue.cases[2].identity();
    let entry = sink
        .last()
        .unwrap()
        .entries
        .into_iter()
        .find(|e| e.identity == unknown)
        .unwrap();
    assert_eq!(entry.count(Severity::Skip), 1);
    assert!(entry
        .events
        .iter()
        .any(|e| e.message == "Test Skipped: Test case TC_077 not implemented in automation"));
    assert!(entry.name.starts_with("Execute test case [TC_077, Export to CSV"), "{}", entry.name);

    let ledger = insights_e2e::StatusLedger::load(config.status_path.as_deref().unwrap()).unwrap();
    assert_eq!(ledger.status("TC_001"), Some("Yes"));
    assert_eq!(ledger.status("TC_012"), Some("Yes"));
    assert_eq!(ledger.status("TC_077"), None);
}

#[test]
fn category_filter_narrows_the_suite() {
    let mut registry: TestRegistry = standard_suite().unwrap();
    registry.retain_category("Smoke");
    assert!(registry.is_empty());

    let mut registry = standard_suite().unwrap();
    registry.retain_category("Dashboard Testing");
    assert_eq!(registry.len(), Scenario::ALL.len());
    assert!(registry.get(&TestIdentity::new("dashboard_loads")).is_some());
}
