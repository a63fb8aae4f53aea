//! Secondary lookup structures over the pattern set.

use std::collections::{HashMap, HashSet};

use popguard_protocols::{InterruptionType, Pattern};

/// Type and domain buckets of pattern ids.
///
/// Global patterns (empty `domains`) are tracked separately and never enter
/// the domain buckets. Wildcard rules (`*.example.com`) are bucketed under
/// their literal key and reached through [`PatternIndex::domain_ids`].
#[derive(Debug, Default)]
pub struct PatternIndex {
    by_type: HashMap<InterruptionType, HashSet<String>>,
    by_domain: HashMap<String, HashSet<String>>,
    globals: HashSet<String>,
}

impl PatternIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a pattern. The caller removes any previous version first.
    pub fn insert(&mut self, pattern: &Pattern) {
        self.by_type
            .entry(pattern.interruption_type)
            .or_default()
            .insert(pattern.id.clone());

        if pattern.is_global() {
            self.globals.insert(pattern.id.clone());
            return;
        }

        for domain in &pattern.domains {
            self.by_domain
                .entry(domain.clone())
                .or_default()
                .insert(pattern.id.clone());
        }
    }

    /// Drop a pattern from every bucket it was indexed under.
    pub fn remove(&mut self, pattern: &Pattern) {
        if let Some(bucket) = self.by_type.get_mut(&pattern.interruption_type) {
            bucket.remove(&pattern.id);
            if bucket.is_empty() {
                self.by_type.remove(&pattern.interruption_type);
            }
        }

        self.globals.remove(&pattern.id);

        for domain in &pattern.domains {
            if let Some(bucket) = self.by_domain.get_mut(domain) {
                bucket.remove(&pattern.id);
                if bucket.is_empty() {
                    self.by_domain.remove(domain);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.by_type.clear();
        self.by_domain.clear();
        self.globals.clear();
    }

    /// Ids of every pattern of the given type.
    pub fn type_ids(&self, interruption_type: InterruptionType) -> impl Iterator<Item = &str> {
        self.by_type
            .get(&interruption_type)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(String::as_str))
    }

    /// Ids of domain-scoped patterns that apply to `host`.
    ///
    /// Looks up the exact host plus a `*.suffix` key for every proper suffix.
    pub fn domain_ids(&self, host: &str) -> HashSet<&str> {
        let mut ids = HashSet::new();
        for key in lookup_keys(host) {
            if let Some(bucket) = self.by_domain.get(&key) {
                ids.extend(bucket.iter().map(String::as_str));
            }
        }
        ids
    }

    pub fn is_global(&self, id: &str) -> bool {
        self.globals.contains(id)
    }

    pub fn globals(&self) -> impl Iterator<Item = &str> {
        self.globals.iter().map(String::as_str)
    }

    /// Number of distinct domain keys.
    pub fn domain_count(&self) -> usize {
        self.by_domain.len()
    }
}

/// Index keys that can match `host`: the host itself, then one wildcard key
/// per parent domain (`a.b.com` → `a.b.com`, `*.b.com`, `*.com`).
fn lookup_keys(host: &str) -> Vec<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return Vec::new();
    }

    let mut keys = vec![host.clone()];
    let mut rest = host.as_str();
    while let Some(pos) = rest.find('.') {
        rest = &rest[pos + 1..];
        if !rest.is_empty() {
            keys.push(format!("*.{}", rest));
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(id: &str, ty: InterruptionType, domains: &[&str]) -> Pattern {
        let mut p = Pattern::new(id, ty);
        p.domains = domains.iter().map(|d| d.to_string()).collect();
        p
    }

    #[test]
    fn test_lookup_keys() {
        assert_eq!(
            lookup_keys("a.b.example.com"),
            vec!["a.b.example.com", "*.b.example.com", "*.example.com", "*.com"]
        );
        assert_eq!(lookup_keys("localhost"), vec!["localhost"]);
        assert!(lookup_keys("").is_empty());
    }

    #[test]
    fn test_global_pattern_not_in_domain_index() {
        let mut index = PatternIndex::new();
        index.insert(&pattern("g", InterruptionType::Cookie, &[]));

        assert!(index.is_global("g"));
        assert_eq!(index.domain_count(), 0);
        assert_eq!(index.type_ids(InterruptionType::Cookie).collect::<Vec<_>>(), vec!["g"]);
    }

    #[test]
    fn test_domain_ids_exact_and_wildcard() {
        let mut index = PatternIndex::new();
        index.insert(&pattern("exact", InterruptionType::Ad, &["news.example.com"]));
        index.insert(&pattern("wild", InterruptionType::Ad, &["*.example.com"]));
        index.insert(&pattern("other", InterruptionType::Ad, &["other.com"]));

        let ids = index.domain_ids("news.example.com");
        assert!(ids.contains("exact"));
        assert!(ids.contains("wild"));
        assert!(!ids.contains("other"));

        let apex = index.domain_ids("example.com");
        assert!(apex.is_empty());
    }

    #[test]
    fn test_remove_cleans_every_bucket() {
        let mut index = PatternIndex::new();
        let p = pattern("ad_close", InterruptionType::Ad, &["a.com", "b.com"]);
        index.insert(&p);
        index.remove(&p);

        assert_eq!(index.type_ids(InterruptionType::Ad).count(), 0);
        assert!(index.domain_ids("a.com").is_empty());
        assert!(index.domain_ids("b.com").is_empty());
        assert_eq!(index.domain_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut index = PatternIndex::new();
        index.insert(&pattern("g", InterruptionType::Popup, &[]));
        index.insert(&pattern("s", InterruptionType::Popup, &["x.com"]));
        index.clear();

        assert_eq!(index.globals().count(), 0);
        assert_eq!(index.domain_count(), 0);
    }
}
