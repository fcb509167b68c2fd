//! Browser session collaborator and scoped session release

use async_trait::async_trait;
use insights_common::SuiteConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::DriverError;
use crate::page::DashboardPage;

/// Options handed to the driver for every fresh session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub implicit_wait: Duration,
}

impl LaunchOptions {
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            headless: config.headless,
            implicit_wait: config.implicit_wait(),
        }
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from_config(&SuiteConfig::default())
    }
}

/// Launches browser sessions. One session is acquired per attempt.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, DriverError>;
}

/// A live browser session
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` in the session's window
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// PNG capture of the current viewport
    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;

    /// Dashboard page object bound to this session
    fn page(&mut self) -> &mut dyn DashboardPage;
}

/// Owns a session until it is released.
///
/// `release` closes the session on the normal path. A guard dropped without
/// release (a panic unwinding through the runner, or the suite future being
/// cancelled) hands the close to the current tokio runtime instead.
pub struct SessionGuard {
    session: Arc<Mutex<Box<dyn BrowserSession>>>,
    label: String,
    released: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowserSession>, label: impl Into<String>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            label: label.into(),
            released: false,
        }
    }

    /// Exclusive access to the guarded session
    pub async fn session(&self) -> MutexGuard<'_, Box<dyn BrowserSession>> {
        self.session.lock().await
    }

    /// Close the session. Consumes the guard so release happens once.
    pub async fn release(mut self) -> Result<(), DriverError> {
        self.released = true;
        debug!("Releasing browser session for {}", self.label);
        let closed = self.session.lock().await.close().await;
        closed
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        warn!("Browser session for {} dropped without release", self.label);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let session = Arc::clone(&self.session);
                let label = std::mem::take(&mut self.label);
                handle.spawn(async move {
                    let closed = session.lock().await.close().await;
                    if let Err(e) = closed {
                        warn!("Best-effort close of session for {} failed: {}", label, e);
                    }
                });
            }
            Err(_) => {
                warn!("No runtime available to close session for {}", self.label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted(Arc<AtomicUsize>);

    #[async_trait]
    impl BrowserSession for Counted {
        async fn navigate(&mut self, _url: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
            Ok(Vec::new())
        }

        async fn close(&mut self) -> Result<(), DriverError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn page(&mut self) -> &mut dyn DashboardPage {
            unimplemented!("no page in guard tests")
        }
    }

    #[tokio::test]
    async fn test_release_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let guard = SessionGuard::new(Box::new(Counted(closes.clone())), "dashboard_loads");
        guard.session().await.navigate("http://dashboard.test/").await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        guard.release().await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_without_release_closes_in_background() {
        let closes = Arc::new(AtomicUsize::new(0));
        drop(SessionGuard::new(Box::new(Counted(closes.clone())), "aborted"));

        for _ in 0..50 {
            if closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_launch_options_follow_config() {
        let config = SuiteConfig {
            headless: false,
            implicit_wait_seconds: 4,
            ..Default::default()
        };
        let options = LaunchOptions::from_config(&config);
        assert!(!options.headless);
        assert_eq!(options.implicit_wait, Duration::from_secs(4));
    }
}
