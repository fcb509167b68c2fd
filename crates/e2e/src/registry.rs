//! Explicit registry of test bodies keyed by identity

use async_trait::async_trait;
use insights_common::report::DEFAULT_CATEGORY;
use insights_common::TestIdentity;
use std::collections::HashSet;
use std::sync::Arc;

use crate::context::TestExecutionContext;
use crate::error::{E2eError, E2eResult};
use crate::lifecycle::BodyResult;

/// A test body. Called once per attempt with a fresh context.
#[async_trait]
pub trait TestBody: Send + Sync {
    async fn run(&self, ctx: &mut TestExecutionContext<'_>) -> BodyResult;
}

/// One entry of the registry
#[derive(Clone)]
pub struct RegisteredTest {
    pub identity: TestIdentity,
    pub description: String,
    pub category: String,
    pub body: Arc<dyn TestBody>,
}

impl RegisteredTest {
    pub fn new(identity: TestIdentity, body: impl TestBody + 'static) -> Self {
        Self {
            identity,
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            body: Arc::new(body),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

impl std::fmt::Debug for RegisteredTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTest")
            .field("identity", &self.identity)
            .field("description", &self.description)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Ordered set of tests to run, built at suite-assembly time
#[derive(Debug, Clone, Default)]
pub struct TestRegistry {
    tests: Vec<RegisteredTest>,
    identities: HashSet<TestIdentity>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a test. Identities must be unique within a registry.
    pub fn add(&mut self, test: RegisteredTest) -> E2eResult<()> {
        if !self.identities.insert(test.identity.clone()) {
            return Err(E2eError::DuplicateTest(test.identity.to_string()));
        }
        self.tests.push(test);
        Ok(())
    }

    pub fn register(
        &mut self,
        identity: TestIdentity,
        description: &str,
        body: impl TestBody + 'static,
    ) -> E2eResult<()> {
        self.add(RegisteredTest::new(identity, body).description(description))
    }

    /// Append every test of `other`
    pub fn extend(&mut self, other: TestRegistry) -> E2eResult<()> {
        for test in other.tests {
            self.add(test)?;
        }
        Ok(())
    }

    /// Keep only tests in `category`
    pub fn retain_category(&mut self, category: &str) {
        self.retain(|t| t.category == category);
    }

    /// Keep only tests whose method name is listed
    pub fn retain_named(&mut self, methods: &[&str]) {
        self.retain(|t| methods.contains(&t.identity.method()));
    }

    fn retain<F: Fn(&RegisteredTest) -> bool>(&mut self, keep: F) {
        self.tests.retain(|t| keep(t));
        self.identities = self.tests.iter().map(|t| t.identity.clone()).collect();
    }

    pub fn get(&self, identity: &TestIdentity) -> Option<&RegisteredTest> {
        self.tests.iter().find(|t| &t.identity == identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTest> {
        self.tests.iter()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
