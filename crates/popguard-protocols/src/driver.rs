//! Automation driver contract.
//!
//! The engine never touches a page directly. Everything it needs from a live
//! browser goes through [`AutomationDriver`], which may be backed by a CDP
//! session, a Playwright bridge, a simulator or a test double.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::types::DismissAction;

/// Opaque handle to the page a pass runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageContext {
    page_id: String,
}

impl PageContext {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }
}

/// Element located by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Selector that matched.
    pub selector: String,
    /// Driver-specific reference (node id, object id, ...).
    pub node_ref: String,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>, node_ref: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            node_ref: node_ref.into(),
        }
    }
}

/// Capability the engine requires from the browser layer.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Locate the first element matching any of `selectors`, tried in order.
    ///
    /// Returns `Ok(None)` when nothing matches; absence is not an error.
    /// Implementations should give up after `timeout`.
    async fn find_element(
        &self,
        page: &PageContext,
        selectors: &[String],
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, DriverError>;

    /// Perform one dismiss action against a located element.
    async fn perform_action(
        &self,
        page: &PageContext,
        element: &ElementHandle,
        action: &DismissAction,
    ) -> Result<(), DriverError>;

    /// Driver name used in logs.
    fn name(&self) -> &str {
        "driver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFound;

    #[async_trait]
    impl AutomationDriver for AlwaysFound {
        async fn find_element(
            &self,
            _page: &PageContext,
            selectors: &[String],
            _timeout: Duration,
        ) -> Result<Option<ElementHandle>, DriverError> {
            Ok(selectors.first().map(|s| ElementHandle::new(s.clone(), "node-1")))
        }

        async fn perform_action(
            &self,
            _page: &PageContext,
            _element: &ElementHandle,
            action: &DismissAction,
        ) -> Result<(), DriverError> {
            match action {
                DismissAction::Script { .. } => {
                    Err(DriverError::Unsupported("script".to_string()))
                }
                _ => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn test_driver_contract() {
        let driver = AlwaysFound;
        let page = PageContext::new("page_1");

        let found = driver
            .find_element(&page, &[".close".to_string()], Duration::from_secs(1))
            .await
            .unwrap();
        let element = found.unwrap();
        assert_eq!(element.selector, ".close");

        let none = driver
            .find_element(&page, &[], Duration::from_secs(1))
            .await
            .unwrap();
        assert!(none.is_none());

        assert!(driver
            .perform_action(&page, &element, &DismissAction::click())
            .await
            .is_ok());
        assert!(driver
            .perform_action(&page, &element, &DismissAction::Script { source: "x".into() })
            .await
            .is_err());
        assert_eq!(driver.name(), "driver");
    }

    #[test]
    fn test_page_context() {
        let page = PageContext::new("page_7");
        assert_eq!(page.page_id(), "page_7");
    }
}
