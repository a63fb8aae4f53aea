use super::*;

#[test]
fn test_decode_minimal_record_uses_defaults() {
    let pattern: Pattern = serde_json::from_str(r#"{"id": "p1", "type": "cookie"}"#).unwrap();

    assert_eq!(pattern.id, "p1");
    assert_eq!(pattern.interruption_type, InterruptionType::Cookie);
    assert!(pattern.selectors.is_empty());
    assert!(pattern.actions.is_empty());
    assert!(pattern.keywords.is_empty());
    assert!(pattern.domains.is_empty());
    assert_eq!(pattern.priority, 0);
    assert!(pattern.enabled);
    assert_eq!(pattern.description, "");
    assert!(pattern.metadata.is_empty());
}

#[test]
fn test_decode_missing_id_and_type() {
    let pattern: Pattern = serde_json::from_str(r#"{"selectors": [".x"]}"#).unwrap();
    assert_eq!(pattern.id, "");
    assert_eq!(pattern.interruption_type, InterruptionType::Custom);
    assert_eq!(pattern.selectors, vec![".x"]);
}

#[test]
fn test_decode_full_record() {
    let json = r##"{
        "id": "cookie_accept",
        "type": "cookie",
        "selectors": ["button.accept", "#accept-cookies"],
        "actions": [{"type": "click"}, {"type": "wait", "millis": 200}],
        "keywords": ["cookies"],
        "domains": ["example.com"],
        "priority": 10,
        "enabled": false,
        "description": "Accept cookies",
        "metadata": {"source": "manual"}
    }"##;
    let pattern: Pattern = serde_json::from_str(json).unwrap();

    assert_eq!(pattern.selectors.len(), 2);
    assert_eq!(
        pattern.actions,
        vec![DismissAction::click(), DismissAction::Wait { millis: 200 }]
    );
    assert_eq!(pattern.priority, 10);
    assert!(!pattern.enabled);
    assert_eq!(pattern.metadata["source"], "manual");
}

#[test]
fn test_serialize_uses_type_key() {
    let pattern = Pattern::new("ad_close", InterruptionType::Ad);
    let json = serde_json::to_value(&pattern).unwrap();
    assert_eq!(json["type"], "ad");
    assert!(json.get("interruption_type").is_none());
}

#[test]
fn test_builder() {
    let pattern = Pattern::new("ad_close", InterruptionType::Ad)
        .with_selector(".ad-close")
        .with_action(DismissAction::click())
        .with_domain("example.com")
        .with_priority(5)
        .with_enabled(false);

    assert_eq!(pattern.selectors, vec![".ad-close"]);
    assert_eq!(pattern.domains, vec!["example.com"]);
    assert_eq!(pattern.priority, 5);
    assert!(!pattern.enabled);
    assert!(!pattern.is_global());
}

#[test]
fn test_applies_to() {
    let global = Pattern::new("g", InterruptionType::Popup);
    assert!(global.applies_to("anything.org"));

    let scoped = Pattern::new("s", InterruptionType::Ad)
        .with_domain("example.com")
        .with_domain("*.news.org");
    assert!(scoped.applies_to("example.com"));
    assert!(scoped.applies_to("www.news.org"));
    assert!(!scoped.applies_to("news.org"));
    assert!(!scoped.applies_to("other.com"));
}

#[test]
fn test_host_matches_wildcard_boundaries() {
    assert!(host_matches("*.example.com", "a.example.com"));
    assert!(host_matches("*.example.com", "a.b.example.com"));
    assert!(!host_matches("*.example.com", "example.com"));
    assert!(!host_matches("*.example.com", "badexample.com"));
    assert!(host_matches("Example.COM", "example.com"));
}

#[test]
fn test_normalize() {
    let mut pattern = Pattern::new("  p1 ", InterruptionType::Ad)
        .with_domain(" Example.com ")
        .with_domain("");
    pattern.normalize();
    assert_eq!(pattern.id, "p1");
    assert_eq!(pattern.domains, vec!["example.com"]);
}
