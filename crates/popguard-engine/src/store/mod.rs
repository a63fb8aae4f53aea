//! Pattern store.
//!
//! The store owns every [`Pattern`] and keeps the [`PatternIndex`] in
//! lock-step with it. Patterns and index live behind a single lock, so a
//! resolution pass never observes a half-applied add or remove.
//!
//! Persistence is a single JSON array file:
//! ```text
//! ~/.popguard/
//! └── patterns.json    # [{"id": ..., "type": ..., "selectors": [...], ...}, ...]
//! ```

mod codec;
mod index;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use popguard_protocols::{InterruptionType, Pattern, PersistenceError};

pub use codec::{DecodeDiagnostic, LoadReport};
pub use index::PatternIndex;

pub(crate) use codec::{decode_record, read_file, write_atomic};

struct Entry {
    pattern: Arc<Pattern>,
    /// Insertion sequence; breaks priority ties and orders saved files.
    seq: u64,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, Entry>,
    index: PatternIndex,
    next_seq: u64,
}

impl StoreState {
    fn insert(&mut self, pattern: Pattern) -> Option<Arc<Pattern>> {
        let previous = self.entries.remove(&pattern.id);
        let seq = match &previous {
            Some(entry) => {
                self.index.remove(&entry.pattern);
                entry.seq
            }
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };

        self.index.insert(&pattern);
        self.entries.insert(
            pattern.id.clone(),
            Entry {
                pattern: Arc::new(pattern),
                seq,
            },
        );
        previous.map(|e| e.pattern)
    }

    fn remove(&mut self, id: &str) -> Option<Arc<Pattern>> {
        let entry = self.entries.remove(id)?;
        self.index.remove(&entry.pattern);
        Some(entry.pattern)
    }

    /// Resolve ids to entries, ordered by insertion.
    fn ordered<'a>(&'a self, ids: impl IntoIterator<Item = &'a str>) -> Vec<&'a Entry> {
        let mut entries: Vec<&Entry> = ids
            .into_iter()
            .filter_map(|id| self.entries.get(id))
            .collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }
}

/// Authoritative pattern collection with durable persistence.
pub struct PatternStore {
    path: PathBuf,
    state: RwLock<StoreState>,
    // Held from snapshot to rename so saves land in the order they snapshot.
    save_lock: Mutex<()>,
}

impl PatternStore {
    /// Create an empty store backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(StoreState::default()),
            save_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.read().entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Pattern>> {
        self.state.read().entries.get(id).map(|e| e.pattern.clone())
    }

    /// Insert or replace a pattern by id.
    ///
    /// A replaced pattern keeps its original insertion position. Returns
    /// false when the pattern has an empty id.
    pub fn add(&self, mut pattern: Pattern) -> bool {
        pattern.normalize();
        if pattern.id.is_empty() {
            warn!("Rejected pattern with empty id");
            return false;
        }

        let id = pattern.id.clone();
        let previous = self.state.write().insert(pattern);
        if previous.is_some() {
            warn!("Duplicate pattern id: {}, overwriting", id);
        } else {
            debug!("Added pattern {}", id);
        }
        true
    }

    /// Remove a pattern by id. Returns false if it was not present.
    pub fn remove(&self, id: &str) -> bool {
        match self.state.write().remove(id) {
            Some(_) => {
                debug!("Removed pattern {}", id);
                true
            }
            None => {
                warn!("Pattern to remove not found: {}", id);
                false
            }
        }
    }

    /// Every pattern, in insertion order.
    pub fn all(&self) -> Vec<Arc<Pattern>> {
        let state = self.state.read();
        state
            .ordered(state.entries.keys().map(String::as_str))
            .into_iter()
            .map(|e| e.pattern.clone())
            .collect()
    }

    /// Filter patterns by type and/or host.
    ///
    /// A host filter selects the patterns that apply to that host: the
    /// domain-scoped matches plus every global pattern. With both filters a
    /// pattern must satisfy both. Results come back in insertion order.
    pub fn query(
        &self,
        interruption_type: Option<InterruptionType>,
        domain: Option<&str>,
    ) -> Vec<Arc<Pattern>> {
        let state = self.state.read();
        let index = &state.index;
        let domain = domain.map(|d| d.trim().to_ascii_lowercase());

        let ids: Vec<&str> = match (interruption_type, domain.as_deref()) {
            (None, None) => state.entries.keys().map(String::as_str).collect(),
            (Some(ty), None) => index.type_ids(ty).collect(),
            (ty, Some(host)) => {
                let scoped = index.domain_ids(host);
                let applies = |id: &&str| index.is_global(id) || scoped.contains(id);
                match ty {
                    Some(ty) => index.type_ids(ty).filter(applies).collect(),
                    None => index.globals().chain(scoped.iter().copied()).collect(),
                }
            }
        };

        state
            .ordered(ids)
            .into_iter()
            .map(|e| e.pattern.clone())
            .collect()
    }

    /// Resolution candidates for one pass, highest priority first.
    ///
    /// A candidate is any pattern of a requested type (every type when
    /// `types` is empty) that is global or scoped to `domain`. Equal
    /// priorities keep insertion order. Disabled patterns are included; the
    /// resolver skips them.
    pub fn candidates(
        &self,
        domain: Option<&str>,
        types: &[InterruptionType],
    ) -> Vec<Arc<Pattern>> {
        let types = if types.is_empty() {
            &InterruptionType::ALL[..]
        } else {
            types
        };

        let state = self.state.read();
        let index = &state.index;
        let scoped = domain.map(|d| index.domain_ids(d)).unwrap_or_default();

        let mut seen = HashSet::new();
        let mut entries: Vec<&Entry> = types
            .iter()
            .flat_map(|ty| index.type_ids(*ty))
            .filter(|id| index.is_global(id) || scoped.contains(id))
            .filter(|id| seen.insert(*id))
            .filter_map(|id| state.entries.get(id))
            .collect();

        entries.sort_by(|a, b| {
            b.pattern
                .priority
                .cmp(&a.pattern.priority)
                .then(a.seq.cmp(&b.seq))
        });
        entries.into_iter().map(|e| e.pattern.clone()).collect()
    }

    /// Replace the in-memory set with the contents of the pattern file.
    ///
    /// A missing file leaves the store empty. Records that fail to decode are
    /// skipped and listed in the report.
    pub async fn load(&self) -> Result<LoadReport, PersistenceError> {
        let Some(content) = codec::read_file(&self.path).await? else {
            info!("Pattern file does not exist: {}", self.path.display());
            *self.state.write() = StoreState::default();
            return Ok(LoadReport::default());
        };

        let (patterns, diagnostics) = codec::decode_patterns(&content)?;

        let mut fresh = StoreState::default();
        for pattern in patterns {
            let id = pattern.id.clone();
            if fresh.insert(pattern).is_some() {
                warn!("Duplicate pattern id in file: {}, later record wins", id);
            }
        }
        let loaded = fresh.entries.len();
        *self.state.write() = fresh;

        info!("Loaded {} patterns from {}", loaded, self.path.display());
        Ok(LoadReport {
            loaded,
            diagnostics,
        })
    }

    /// Write every pattern to the pattern file. Returns the number written.
    pub async fn save(&self) -> Result<usize, PersistenceError> {
        self.export_to(&self.path).await
    }

    /// Write every pattern to an arbitrary file.
    pub async fn export_to(&self, path: &Path) -> Result<usize, PersistenceError> {
        let _guard = self.save_lock.lock().await;
        let patterns = self.all();
        let content = codec::encode_patterns(&patterns)?;
        codec::write_atomic(path, &content).await?;
        info!("Saved {} patterns to {}", patterns.len(), path.display());
        Ok(patterns.len())
    }

    /// Merge patterns from another file into the store.
    ///
    /// Imported ids that collide with existing ones get a numeric suffix
    /// instead of overwriting. The report's `loaded` count is the number of
    /// patterns added.
    pub async fn import_from(&self, path: &Path) -> Result<LoadReport, PersistenceError> {
        let content = codec::read_file(path).await?.ok_or_else(|| {
            PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))
        })?;
        let (patterns, diagnostics) = codec::decode_patterns(&content)?;

        let mut loaded = 0;
        {
            let mut state = self.state.write();
            for mut pattern in patterns {
                if state.entries.contains_key(&pattern.id) {
                    let renamed = unique_id(&state.entries, &pattern.id);
                    info!("Imported pattern id {} already exists, renamed to {}", pattern.id, renamed);
                    pattern.id = renamed;
                }
                state.insert(pattern);
                loaded += 1;
            }
        }

        info!("Imported {} patterns from {}", loaded, path.display());
        Ok(LoadReport {
            loaded,
            diagnostics,
        })
    }
}

fn unique_id(entries: &HashMap<String, Entry>, base: &str) -> String {
    (2u64..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !entries.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
