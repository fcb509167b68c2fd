//! Data-driven test cases loaded from YAML catalogues

use async_trait::async_trait;
use insights_common::{SuiteConfig, TestIdentity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::context::TestExecutionContext;
use crate::error::{E2eError, E2eResult};
use crate::lifecycle::{BodyResult, BodyVerdict};
use crate::registry::{RegisteredTest, TestBody, TestRegistry};
use crate::scenarios::{standard_suite, Scenario};

/// Method name every data-driven case is registered under
pub const CASE_METHOD: &str = "execute_test_case";

/// One row of a case catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub preconditions: String,
    #[serde(default)]
    pub steps: String,
    #[serde(default)]
    pub expected: String,
}

impl TestCase {
    /// `execute_test_case` with the five fields as arguments, in file order
    pub fn identity(&self) -> TestIdentity {
        TestIdentity::with_args(
            CASE_METHOD,
            [
                self.id.as_str(),
                self.title.as_str(),
                self.preconditions.as_str(),
                self.steps.as_str(),
                self.expected.as_str(),
            ],
        )
    }

    pub fn scenario(&self) -> Option<Scenario> {
        Scenario::from_case_id(&self.id)
    }
}

/// Cases read from one or more YAML files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseCatalogue {
    pub cases: Vec<TestCase>,
}

impl CaseCatalogue {
    /// Parse a YAML list of cases
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let cases: Vec<TestCase> = serde_yaml::from_str(yaml)?;
        if let Some(blank) = cases.iter().position(|c| c.id.trim().is_empty()) {
            return Err(E2eError::CaseCatalogue(format!(
                "case #{} has an empty id",
                blank + 1
            )));
        }
        Ok(Self { cases })
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::CaseCatalogue(format!("{}: {}", path.display(), e)))
    }

    /// Load every `.yaml`/`.yml` file under `dir`, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Self> {
        if !dir.is_dir() {
            return Err(E2eError::CaseCatalogue(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut catalogue = Self::default();
        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let file = Self::from_file(entry.path())?;
            debug!("Loaded {} cases from {}", file.len(), entry.path().display());
            catalogue.cases.extend(file.cases);
        }
        Ok(catalogue)
    }

    /// Register every case under [`CASE_METHOD`]
    pub fn register(&self, registry: &mut TestRegistry) -> E2eResult<()> {
        for case in &self.cases {
            let description = if case.title.is_empty() {
                case.id.clone()
            } else {
                format!("{}: {}", case.id, case.title)
            };
            registry.add(
                RegisteredTest::new(case.identity(), CaseBody::new(case.clone()))
                    .description(description),
            )?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// The standard scenarios plus every case under `cases_dir`, if configured
pub fn configured_suite(config: &SuiteConfig) -> E2eResult<TestRegistry> {
    let mut registry = standard_suite()?;
    if let Some(dir) = &config.cases_dir {
        let catalogue = CaseCatalogue::load_all(dir)?;
        info!("Loaded {} data-driven case(s) from {}", catalogue.len(), dir.display());
        catalogue.register(&mut registry)?;
    }
    Ok(registry)
}

/// Runs the scenario matching a case id, or skips unknown ids
pub struct CaseBody {
    case: TestCase,
}

impl CaseBody {
    pub fn new(case: TestCase) -> Self {
        Self { case }
    }
}

#[async_trait]
impl TestBody for CaseBody {
    async fn run(&self, ctx: &mut TestExecutionContext<'_>) -> BodyResult {
        ctx.note(format!("Executing test case {}: {}", self.case.id, self.case.title));
        match self.case.scenario() {
            Some(scenario) => scenario.execute(ctx).await,
            None => Ok(BodyVerdict::Skipped(format!(
                "Test case {} not implemented in automation",
                self.case.id
            ))),
        }
    }
}
