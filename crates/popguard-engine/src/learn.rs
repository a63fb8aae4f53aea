//! Pattern learning from recorded operator steps.
//!
//! An operator who dismisses an unknown interruption by hand can hand the
//! recorded steps to [`learn_pattern`], which turns them into a
//! domain-scoped pattern that replays the same sequence.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use popguard_protocols::{DismissAction, InterruptionType, Pattern};

use crate::domain::host_of;

/// Priority given to learned patterns so they run before the built-ins.
pub const LEARNED_PRIORITY: i32 = 10;

/// One step of a recorded dismissal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordedStep {
    Click { selector: String },
    Fill { selector: String, value: String },
    Keypress { key: String },
    Wait { millis: u64 },
}

impl RecordedStep {
    fn selector(&self) -> Option<&str> {
        match self {
            Self::Click { selector } | Self::Fill { selector, .. } => {
                let selector = selector.trim();
                (!selector.is_empty()).then_some(selector)
            }
            Self::Keypress { .. } | Self::Wait { .. } => None,
        }
    }

    fn to_action(&self) -> DismissAction {
        match self {
            Self::Click { .. } => DismissAction::click(),
            Self::Fill { value, .. } => DismissAction::Fill {
                value: value.clone(),
            },
            Self::Keypress { key } => DismissAction::Keypress { key: key.clone() },
            Self::Wait { millis } => DismissAction::Wait { millis: *millis },
        }
    }
}

/// Build a pattern from the steps recorded on `url`.
///
/// Returns `None` when the url has no host or no step targets an element.
/// Selectors are ordered most specific (longest) first.
pub fn learn_pattern(
    url: &str,
    steps: &[RecordedStep],
    interruption_type: InterruptionType,
) -> Option<Pattern> {
    let Some(host) = host_of(url) else {
        debug!("Cannot learn pattern: no host in {}", url);
        return None;
    };

    let mut selectors: Vec<&str> = Vec::new();
    for selector in steps.iter().filter_map(RecordedStep::selector) {
        if !selectors.contains(&selector) {
            selectors.push(selector);
        }
    }
    if selectors.is_empty() {
        debug!("Cannot learn pattern for {}: no element selectors recorded", host);
        return None;
    }
    selectors.sort_by(|a, b| b.len().cmp(&a.len()));

    let simple = Uuid::new_v4().simple().to_string();
    let id = format!("learned_{}", &simple[..12]);

    let mut pattern = Pattern::new(id, interruption_type)
        .with_selectors(selectors)
        .with_domain(host.clone())
        .with_priority(LEARNED_PRIORITY)
        .with_description(format!(
            "Learned from {} recorded steps on {}",
            steps.len(),
            host
        ))
        .with_metadata("source", serde_json::json!("recording"))
        .with_metadata("learned_at", serde_json::json!(Utc::now().to_rfc3339()));
    pattern.actions = steps.iter().map(RecordedStep::to_action).collect();

    info!(
        "Learned pattern {} for {} with {} actions",
        pattern.id,
        host,
        pattern.actions.len()
    );
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(selector: &str) -> RecordedStep {
        RecordedStep::Click {
            selector: selector.to_string(),
        }
    }

    #[test]
    fn test_learn_pattern() {
        let steps = vec![
            click(".close"),
            RecordedStep::Wait { millis: 200 },
            click("#promo-modal button.dismiss"),
            RecordedStep::Keypress {
                key: "Escape".to_string(),
            },
        ];

        let pattern =
            learn_pattern("https://Shop.Example.com/cart", &steps, InterruptionType::Popup).unwrap();

        assert!(pattern.id.starts_with("learned_"));
        assert_eq!(pattern.interruption_type, InterruptionType::Popup);
        assert_eq!(pattern.domains, vec!["shop.example.com"]);
        assert_eq!(pattern.priority, LEARNED_PRIORITY);
        assert_eq!(pattern.selectors, vec!["#promo-modal button.dismiss", ".close"]);
        assert_eq!(
            pattern.actions,
            vec![
                DismissAction::click(),
                DismissAction::Wait { millis: 200 },
                DismissAction::click(),
                DismissAction::Keypress {
                    key: "Escape".to_string()
                },
            ]
        );
        assert_eq!(pattern.metadata["source"], "recording");
        assert!(pattern.metadata.contains_key("learned_at"));
    }

    #[test]
    fn test_learn_dedupes_selectors() {
        let steps = vec![click(".accept"), click(".accept")];
        let pattern = learn_pattern("https://a.com", &steps, InterruptionType::Cookie).unwrap();
        assert_eq!(pattern.selectors, vec![".accept"]);
        assert_eq!(pattern.actions.len(), 2);
    }

    #[test]
    fn test_learn_requires_selector() {
        let steps = vec![RecordedStep::Keypress {
            key: "Escape".to_string(),
        }];
        assert!(learn_pattern("https://a.com", &steps, InterruptionType::Popup).is_none());
        assert!(learn_pattern("https://a.com", &[click("  ")], InterruptionType::Popup).is_none());
    }

    #[test]
    fn test_learn_requires_host() {
        assert!(learn_pattern("not a url", &[click(".x")], InterruptionType::Popup).is_none());
    }

    #[test]
    fn test_learned_ids_differ() {
        let a = learn_pattern("https://a.com", &[click(".x")], InterruptionType::Ad).unwrap();
        let b = learn_pattern("https://a.com", &[click(".x")], InterruptionType::Ad).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_recorded_step_wire_format() {
        let step: RecordedStep =
            serde_json::from_str(r##"{"type": "fill", "selector": "#email", "value": "x"}"##).unwrap();
        assert_eq!(
            step,
            RecordedStep::Fill {
                selector: "#email".to_string(),
                value: "x".to_string()
            }
        );
    }
}
