//! Interruption pattern definition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{DismissAction, InterruptionType};

/// Open metadata bag carried by patterns. Never interpreted by the engine.
pub type Metadata = HashMap<String, serde_json::Value>;

fn default_true() -> bool {
    true
}

/// A named rule describing how to recognize and dismiss one interruption.
///
/// Every field except `id` and `type` is optional on the wire; missing
/// fields take their documented defaults so older pattern files stay
/// readable. A missing `id` decodes to the empty string and a missing
/// `type` to [`InterruptionType::Custom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub interruption_type: InterruptionType,

    /// Element locators, tried in order until one matches.
    #[serde(default)]
    pub selectors: Vec<String>,

    /// Dismiss steps, executed strictly in order.
    #[serde(default)]
    pub actions: Vec<DismissAction>,

    /// Free-text hints for humans and auxiliary matchers.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Hostnames the pattern applies to. Empty means every host.
    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub metadata: Metadata,
}

impl Pattern {
    /// Create an enabled, global pattern with no selectors or actions.
    pub fn new(id: impl Into<String>, interruption_type: InterruptionType) -> Self {
        Self {
            id: id.into(),
            interruption_type,
            selectors: Vec::new(),
            actions: Vec::new(),
            keywords: Vec::new(),
            domains: Vec::new(),
            priority: 0,
            enabled: true,
            description: String::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn with_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selectors.extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn with_action(mut self, action: DismissAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domains.push(domain.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether the pattern applies to every host.
    pub fn is_global(&self) -> bool {
        self.domains.is_empty()
    }

    /// Whether the pattern applies to `host`.
    pub fn applies_to(&self, host: &str) -> bool {
        self.is_global() || self.domains.iter().any(|d| host_matches(d, host))
    }

    /// Trim whitespace and lowercase domain entries, dropping empty ones.
    pub fn normalize(&mut self) {
        self.id = self.id.trim().to_string();
        self.domains = self
            .domains
            .iter()
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
    }
}

/// Match a host against a domain rule.
///
/// A rule is either an exact hostname or `*.suffix`, which matches every
/// strict subdomain of `suffix` but not `suffix` itself.
pub fn host_matches(rule: &str, host: &str) -> bool {
    let rule = rule.trim();
    if let Some(suffix) = rule.strip_prefix("*.") {
        let (host, suffix) = (host.as_bytes(), suffix.as_bytes());
        host.len() > suffix.len() + 1
            && host[host.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
            && host[host.len() - suffix.len() - 1] == b'.'
    } else {
        rule.eq_ignore_ascii_case(host)
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
