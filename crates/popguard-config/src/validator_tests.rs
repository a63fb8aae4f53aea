use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_zero_timeouts() {
    let mut config = Config::default();
    config.engine.find_timeout_ms = 0;
    config.engine.action_timeout_ms = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "engine.find_timeout_ms"));
    assert!(result.errors.iter().any(|e| e.path == "engine.action_timeout_ms"));
}

#[test]
fn test_validate_empty_patterns_path() {
    let mut config = Config::default();
    config.engine.patterns_path = "  ".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "engine.patterns_path"));
}

#[test]
fn test_validate_high_find_timeout_warning() {
    let mut config = Config::default();
    config.engine.find_timeout_ms = 60_000;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "engine.find_timeout_ms"));
}

#[test]
fn test_validate_disabled_engine_warning() {
    let mut config = Config::default();
    config.engine.enabled = false;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "engine.enabled"));
}

#[test]
fn test_validate_domain_entries() {
    let mut config = Config::default();
    config.domains.allow.push("https://example.com".to_string());
    config.domains.deny.push("ex*ample.com".to_string());
    config.domains.deny.push(String::new());

    let result = ConfigValidator::validate(&config).unwrap();
    assert_eq!(result.errors.len(), 3);
}

#[test]
fn test_validate_wildcard_accepted() {
    let mut config = Config::default();
    config.domains.deny.push("*.internal.example".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
}

#[test]
fn test_validate_allow_deny_overlap_warning() {
    let mut config = Config::default();
    config.domains.allow.push("example.com".to_string());
    config.domains.deny.push("example.com".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "domains"));
}

#[test]
fn test_validation_error_new() {
    let err = ValidationError::new("engine.find_timeout_ms", "must be positive");
    assert_eq!(err.path, "engine.find_timeout_ms");
    assert_eq!(err.message, "must be positive");
}
