//! Resolution pass results.

use serde::{Deserialize, Serialize};

use super::{DismissAction, InterruptionType};

/// One interruption dismissed during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInterruption {
    pub pattern_id: String,

    #[serde(rename = "type")]
    pub interruption_type: InterruptionType,

    /// Last action performed. `None` when the pattern has no actions.
    pub action: Option<DismissAction>,
}

/// Outcome of one resolution pass.
///
/// `success` is false only when the pass could not start (no page context or
/// no driver). Zero or partial matches within a valid pass are still a success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub success: bool,
    pub results: Vec<ResolvedInterruption>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionResult {
    /// A completed pass.
    pub fn completed(results: Vec<ResolvedInterruption>) -> Self {
        Self {
            success: true,
            count: results.len(),
            results,
            error: None,
        }
    }

    /// A pass that could not start.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            count: 0,
            error: Some(error.into()),
        }
    }

    /// Ids of the dismissed patterns, in the order they were handled.
    pub fn pattern_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.pattern_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_counts_results() {
        let result = ResolutionResult::completed(vec![ResolvedInterruption {
            pattern_id: "cookie_accept".to_string(),
            interruption_type: InterruptionType::Cookie,
            action: Some(DismissAction::click()),
        }]);
        assert!(result.success);
        assert_eq!(result.count, 1);
        assert_eq!(result.pattern_ids(), vec!["cookie_accept"]);
    }

    #[test]
    fn test_failed_serialization() {
        let result = ResolutionResult::failed("no page context");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["count"], 0);
        assert_eq!(json["error"], "no page context");
    }

    #[test]
    fn test_completed_omits_error() {
        let json = serde_json::to_value(ResolutionResult::completed(Vec::new())).unwrap();
        assert!(json.get("error").is_none());
    }
}
