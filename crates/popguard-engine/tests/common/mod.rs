//! Shared test helpers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use popguard_protocols::{
    AutomationDriver, DismissAction, DriverError, ElementHandle, InterruptionType, PageContext,
    Pattern,
};

/// Driver double whose page is a fixed set of present selectors.
///
/// Every call is appended to a log as `find:<first selector>` or
/// `act:<matched selector>:<action kind>`.
#[derive(Default)]
pub struct ScriptedDriver {
    present: HashSet<String>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    lookup_errors: HashSet<String>,
    action_delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_present(mut self, selectors: &[&str]) -> Self {
        self.present.extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    /// Actions on elements matched by `selector` fail.
    pub fn failing_on(mut self, selector: &str) -> Self {
        self.failing.insert(selector.to_string());
        self
    }

    /// Actions on elements matched by `selector` never complete.
    pub fn hanging_on(mut self, selector: &str) -> Self {
        self.hanging.insert(selector.to_string());
        self
    }

    /// Lookups whose first selector is `selector` return a driver error.
    pub fn lookup_error_on(mut self, selector: &str) -> Self {
        self.lookup_errors.insert(selector.to_string());
        self
    }

    /// Every action takes `delay` before it completes.
    pub fn with_action_delay(mut self, delay: Duration) -> Self {
        self.action_delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn action_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("act:"))
            .collect()
    }
}

#[async_trait]
impl AutomationDriver for ScriptedDriver {
    async fn find_element(
        &self,
        _page: &PageContext,
        selectors: &[String],
        _timeout: Duration,
    ) -> Result<Option<ElementHandle>, DriverError> {
        let first = selectors.first().cloned().unwrap_or_default();
        self.calls.lock().push(format!("find:{}", first));

        if self.lookup_errors.contains(&first) {
            return Err(DriverError::Protocol("target closed".to_string()));
        }

        Ok(selectors
            .iter()
            .find(|s| self.present.contains(*s))
            .map(|s| ElementHandle::new(s.clone(), format!("node:{}", s))))
    }

    async fn perform_action(
        &self,
        _page: &PageContext,
        element: &ElementHandle,
        action: &DismissAction,
    ) -> Result<(), DriverError> {
        self.calls
            .lock()
            .push(format!("act:{}:{}", element.selector, action.kind()));

        if let Some(delay) = self.action_delay {
            tokio::time::sleep(delay).await;
        }
        if self.hanging.contains(&element.selector) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.contains(&element.selector) {
            return Err(DriverError::ActionFailed("element is not visible".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn page() -> PageContext {
    PageContext::new("page-1")
}

pub fn cookie_accept() -> Pattern {
    Pattern::new("cookie_accept", InterruptionType::Cookie)
        .with_selector("button.accept")
        .with_action(DismissAction::click())
        .with_priority(10)
}

pub fn ad_close() -> Pattern {
    Pattern::new("ad_close", InterruptionType::Ad)
        .with_selector(".ad-close")
        .with_action(DismissAction::click())
        .with_domain("example.com")
        .with_priority(5)
}
