//! Dashboard page-object capability set and deadline enforcement

use async_trait::async_trait;
use insights_common::LinkKind;
use std::future::Future;
use std::time::Duration;

use crate::error::{AttemptFailure, DriverError};

/// Interactions the suite performs on the Transaction Insights dashboard.
///
/// Implementations locate elements however they like; a missing element is
/// reported as [`DriverError::ElementNotFound`].
#[async_trait]
pub trait DashboardPage: Send {
    /// Transaction table is present
    async fn is_loaded(&mut self) -> Result<bool, DriverError>;

    /// Dashboard heading is visible
    async fn has_title(&mut self) -> Result<bool, DriverError>;

    async fn row_count(&mut self) -> Result<usize, DriverError>;

    async fn header_count(&mut self) -> Result<usize, DriverError>;

    /// Every name is contained in some column header
    async fn verify_columns_exist(&mut self, names: &[&str]) -> Result<bool, DriverError>;

    async fn search(&mut self, query: &str) -> Result<(), DriverError>;

    async fn clear_search(&mut self) -> Result<(), DriverError>;

    /// Click the first enabled numeric link in the given column
    async fn click_first_link(&mut self, kind: LinkKind) -> Result<(), DriverError>;

    async fn is_modal_displayed(&mut self) -> Result<bool, DriverError>;

    async fn close_modal(&mut self) -> Result<(), DriverError>;

    async fn toggle_auto_refresh(&mut self) -> Result<(), DriverError>;
}

/// Run a page interaction under a deadline.
///
/// Exceeding `wait` and a collaborator-reported missing element both surface
/// as [`AttemptFailure::ElementNotFound`]; any other driver error is an
/// unexpected failure. All of these are retry-eligible.
pub async fn within<T, F>(wait: Duration, what: &str, interaction: F) -> Result<T, AttemptFailure>
where
    F: Future<Output = Result<T, DriverError>>,
{
    match tokio::time::timeout(wait, interaction).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(DriverError::ElementNotFound(element))) => {
            Err(AttemptFailure::element_not_found(element, wait))
        }
        Ok(Err(e)) => Err(AttemptFailure::Unexpected(e.to_string())),
        Err(_) => Err(AttemptFailure::element_not_found(what, wait)),
    }
}

/// [`DashboardPage`] view that bounds every call by the explicit wait
pub struct BoundedPage<'a> {
    inner: &'a mut dyn DashboardPage,
    wait: Duration,
}

impl<'a> BoundedPage<'a> {
    pub fn new(inner: &'a mut dyn DashboardPage, wait: Duration) -> Self {
        Self { inner, wait }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub async fn is_loaded(self) -> Result<bool, AttemptFailure> {
        within(self.wait, "transaction table", self.inner.is_loaded()).await
    }

    pub async fn has_title(self) -> Result<bool, AttemptFailure> {
        within(self.wait, "dashboard title", self.inner.has_title()).await
    }

    pub async fn row_count(self) -> Result<usize, AttemptFailure> {
        within(self.wait, "table rows", self.inner.row_count()).await
    }

    pub async fn header_count(self) -> Result<usize, AttemptFailure> {
        within(self.wait, "table headers", self.inner.header_count()).await
    }

    pub async fn verify_columns_exist(self, names: &[&str]) -> Result<bool, AttemptFailure> {
        within(self.wait, "table headers", self.inner.verify_columns_exist(names)).await
    }

    pub async fn search(self, query: &str) -> Result<(), AttemptFailure> {
        within(self.wait, "search input", self.inner.search(query)).await
    }

    pub async fn clear_search(self) -> Result<(), AttemptFailure> {
        within(self.wait, "search input", self.inner.clear_search()).await
    }

    pub async fn click_first_link(self, kind: LinkKind) -> Result<(), AttemptFailure> {
        let what = format!("{kind} transactions link");
        within(self.wait, &what, self.inner.click_first_link(kind)).await
    }

    pub async fn is_modal_displayed(self) -> Result<bool, AttemptFailure> {
        within(self.wait, "details modal", self.inner.is_modal_displayed()).await
    }

    pub async fn close_modal(self) -> Result<(), AttemptFailure> {
        within(self.wait, "modal close button", self.inner.close_modal()).await
    }

    pub async fn toggle_auto_refresh(self) -> Result<(), AttemptFailure> {
        within(self.wait, "auto-refresh toggle", self.inner.toggle_auto_refresh()).await
    }
}
