//! Host extraction and allow/deny filtering.

use tracing::debug;
use url::Url;

use popguard_config::DomainsConfig;
use popguard_protocols::host_matches;

/// Lowercased host of `url`, or `None` when it does not parse or has no host.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() { None } else { Some(host) }
}

/// Host allow/deny lists. Deny wins; an empty allow list allows everything.
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    allow: Vec<String>,
    deny: Vec<String>,
}

impl DomainFilter {
    pub fn new(allow: Vec<String>, deny: Vec<String>) -> Self {
        Self { allow, deny }
    }

    pub fn from_config(config: &DomainsConfig) -> Self {
        Self::new(config.allow.clone(), config.deny.clone())
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        if self.deny.iter().any(|rule| host_matches(rule, host)) {
            debug!("Host {} is denied", host);
            return false;
        }

        if self.allow.is_empty() {
            return true;
        }

        let allowed = self.allow.iter().any(|rule| host_matches(rule, host));
        if !allowed {
            debug!("Host {} is not in the allow list", host);
        }
        allowed
    }
}
