//! Per-pattern attempt statistics.
//!
//! Statistics persist as a JSON object keyed by pattern id, next to the
//! pattern file:
//! ```text
//! ~/.popguard/
//! ├── patterns.json
//! └── patterns.stats.json    # {"cookie_accept": {"attempts": 3, ...}, ...}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use popguard_protocols::PersistenceError;

use crate::store::{read_file, write_atomic};

/// Where the statistics for a pattern file live.
pub fn stats_path(patterns_path: &Path) -> PathBuf {
    patterns_path.with_extension("stats.json")
}

/// Counters for one pattern. Only attempts where the element was found count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_applied: Option<DateTime<Utc>>,
}

/// Statistics keyed by pattern id.
///
/// Every change marks the recorder dirty until the next
/// [`save_to`](Self::save_to).
#[derive(Debug, Default)]
pub struct StatsRecorder {
    inner: Mutex<HashMap<String, PatternStats>>,
    dirty: AtomicBool,
    save_lock: tokio::sync::Mutex<()>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, id: &str) {
        let mut inner = self.inner.lock();
        let stats = inner.entry(id.to_string()).or_default();
        stats.attempts += 1;
        stats.successes += 1;
        stats.last_applied = Some(Utc::now());
        self.dirty.store(true, Ordering::Release);
    }

    pub fn record_failure(&self, id: &str) {
        let mut inner = self.inner.lock();
        let stats = inner.entry(id.to_string()).or_default();
        stats.attempts += 1;
        stats.failures += 1;
        stats.last_applied = Some(Utc::now());
        self.dirty.store(true, Ordering::Release);
    }

    pub fn get(&self, id: &str) -> Option<PatternStats> {
        self.inner.lock().get(id).cloned()
    }

    pub fn forget(&self, id: &str) {
        if self.inner.lock().remove(id).is_some() {
            self.dirty.store(true, Ordering::Release);
        }
    }

    /// Drop the counters for `id`, or for every pattern when `id` is `None`.
    /// Returns how many entries were dropped.
    pub fn reset(&self, id: Option<&str>) -> usize {
        let mut inner = self.inner.lock();
        let dropped = match id {
            Some(id) => usize::from(inner.remove(id).is_some()),
            None => {
                let count = inner.len();
                inner.clear();
                count
            }
        };
        if dropped > 0 {
            self.dirty.store(true, Ordering::Release);
        }
        dropped
    }

    /// Keep only the entries whose id satisfies `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) {
        let mut inner = self.inner.lock();
        let before = inner.len();
        inner.retain(|id, _| keep(id));
        if inner.len() != before {
            self.dirty.store(true, Ordering::Release);
        }
    }

    pub fn snapshot(&self) -> HashMap<String, PatternStats> {
        self.inner.lock().clone()
    }

    /// Whether anything changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Replace the counters with the contents of `path`. A missing file
    /// leaves the recorder empty. Returns the number of entries loaded.
    pub async fn load_from(&self, path: &Path) -> Result<usize, PersistenceError> {
        let loaded: HashMap<String, PatternStats> = match read_file(path).await? {
            Some(content) => serde_json::from_str(&content)?,
            None => HashMap::new(),
        };

        let count = loaded.len();
        *self.inner.lock() = loaded;
        self.dirty.store(false, Ordering::Release);
        debug!("Loaded statistics for {} patterns from {}", count, path.display());
        Ok(count)
    }

    /// Write the counters to `path`. Returns the number of entries written.
    pub async fn save_to(&self, path: &Path) -> Result<usize, PersistenceError> {
        let _guard = self.save_lock.lock().await;
        self.dirty.store(false, Ordering::Release);
        match self.write_snapshot(path).await {
            Ok(count) => {
                info!("Saved statistics for {} patterns to {}", count, path.display());
                Ok(count)
            }
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                Err(e)
            }
        }
    }

    async fn write_snapshot(&self, path: &Path) -> Result<usize, PersistenceError> {
        let snapshot: BTreeMap<String, PatternStats> =
            self.inner.lock().clone().into_iter().collect();
        let content = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(path, &content).await?;
        Ok(snapshot.len())
    }
}
