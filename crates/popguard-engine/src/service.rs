//! Service facade over the resolution engine.
//!
//! [`InterruptionService`] is what a task executor holds on to. It builds the
//! engine from configuration, owns persistence policy (autosave, default
//! installation) and absorbs persistence failures so callers only ever see
//! [`EngineError`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use popguard_config::{Config, ConfigValidator};
use popguard_protocols::{
    AutomationDriver, EngineError, InterruptionType, PageContext, Pattern, ResolutionResult,
};

use crate::defaults::builtin_patterns;
use crate::learn::{RecordedStep, learn_pattern};
use crate::resolver::{EngineSettings, ResolutionEngine};
use crate::stats::{PatternStats, stats_path};
use crate::store::{LoadReport, PatternStore, decode_record};

/// A pattern handed to [`InterruptionService::add_pattern`].
#[derive(Debug, Clone)]
pub enum PatternInput {
    Pattern(Pattern),
    /// Raw record in the pattern file format.
    Record(serde_json::Value),
}

impl From<Pattern> for PatternInput {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<serde_json::Value> for PatternInput {
    fn from(record: serde_json::Value) -> Self {
        Self::Record(record)
    }
}

struct ServiceState {
    engine: Arc<ResolutionEngine>,
    autosave: bool,
    stats_path: PathBuf,
    load_report: LoadReport,
}

impl ServiceState {
    fn store(&self) -> &PatternStore {
        self.engine.store()
    }

    /// Write patterns and statistics. Returns false if either write failed.
    async fn save_all(&self) -> bool {
        let patterns_saved = match self.store().save().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to save patterns to {}: {}", self.store().path().display(), e);
                false
            }
        };
        let stats_saved = match self.engine.stats().save_to(&self.stats_path).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to save statistics to {}: {}", self.stats_path.display(), e);
                false
            }
        };
        patterns_saved && stats_saved
    }

    async fn persist(&self) {
        if self.autosave {
            self.save_all().await;
        }
    }

    async fn persist_stats(&self) {
        if !self.autosave || !self.engine.stats().is_dirty() {
            return;
        }
        if let Err(e) = self.engine.stats().save_to(&self.stats_path).await {
            warn!("Failed to save statistics to {}: {}", self.stats_path.display(), e);
        }
    }
}

/// Interruption handling entry point.
///
/// Every operation fails with [`EngineError::NotInitialized`] until
/// [`initialize`](Self::initialize) has succeeded.
#[derive(Default)]
pub struct InterruptionService {
    state: RwLock<Option<Arc<ServiceState>>>,
}

impl InterruptionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().is_some()
    }

    fn state(&self) -> Result<Arc<ServiceState>, EngineError> {
        self.state.read().clone().ok_or(EngineError::NotInitialized)
    }

    /// Build the engine from `config` and load the pattern and statistics files.
    ///
    /// Returns false when the configuration is invalid. Re-initializing
    /// replaces the engine (and its dedup set) but keeps the driver.
    pub async fn initialize(&self, config: &Config) -> bool {
        match ConfigValidator::validate(config) {
            Ok(validation) => {
                for warning in &validation.warnings {
                    warn!("Config warning at {}: {}", warning.path, warning.message);
                }
                if !validation.is_valid() {
                    for err in &validation.errors {
                        error!("Config error at {}: {}", err.path, err.message);
                    }
                    return false;
                }
            }
            Err(e) => {
                error!("Config validation failed: {}", e);
                return false;
            }
        }

        let store = Arc::new(PatternStore::new(config.engine.resolved_patterns_path()));
        let (load_report, loaded) = match store.load().await {
            Ok(report) => (report, true),
            Err(e) => {
                warn!("Failed to load patterns from {}: {}", store.path().display(), e);
                (LoadReport::default(), false)
            }
        };

        // A file that failed to load is left untouched rather than overwritten.
        if loaded && store.is_empty() && config.engine.install_defaults {
            for pattern in builtin_patterns() {
                store.add(pattern);
            }
            info!("Installed {} built-in patterns", store.len());
            if let Err(e) = store.save().await {
                warn!("Failed to save built-in patterns: {}", e);
            }
        }

        let stats_path = stats_path(store.path());
        let engine = Arc::new(ResolutionEngine::new(
            store,
            EngineSettings::from_config(config),
        ));
        match engine.stats().load_from(&stats_path).await {
            Ok(_) => engine.stats().retain(|id| engine.store().contains(id)),
            Err(e) => warn!("Failed to load statistics from {}: {}", stats_path.display(), e),
        }
        let previous_driver = self
            .state
            .read()
            .as_ref()
            .and_then(|state| state.engine.driver());
        if let Some(driver) = previous_driver {
            engine.set_driver(driver);
        }

        info!(
            "Interruption service initialized with {} patterns",
            engine.store().len()
        );
        *self.state.write() = Some(Arc::new(ServiceState {
            engine,
            autosave: config.engine.autosave,
            stats_path,
            load_report,
        }));
        true
    }

    pub fn set_automation_driver(
        &self,
        driver: Arc<dyn AutomationDriver>,
    ) -> Result<(), EngineError> {
        self.state()?.engine.set_driver(driver);
        Ok(())
    }

    pub async fn handle(
        &self,
        page: Option<&PageContext>,
        url: Option<&str>,
        types: Option<&[InterruptionType]>,
    ) -> Result<ResolutionResult, EngineError> {
        let state = self.state()?;
        let result = state.engine.handle(page, url, types).await;
        state.persist_stats().await;
        Ok(result)
    }

    pub async fn handle_with_cancel(
        &self,
        page: Option<&PageContext>,
        url: Option<&str>,
        types: Option<&[InterruptionType]>,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult, EngineError> {
        let state = self.state()?;
        let result = state
            .engine
            .handle_with_cancel(page, url, types, cancel)
            .await;
        state.persist_stats().await;
        Ok(result)
    }

    /// Patterns the next pass on `url` would attempt, in order.
    pub fn plan(
        &self,
        url: Option<&str>,
        types: Option<&[InterruptionType]>,
    ) -> Result<Vec<Pattern>, EngineError> {
        let state = self.state()?;
        Ok(state
            .engine
            .plan(url, types)
            .iter()
            .map(|p| p.as_ref().clone())
            .collect())
    }

    /// Add or replace a pattern. Returns false when the pattern is rejected.
    pub async fn add_pattern(&self, input: impl Into<PatternInput>) -> Result<bool, EngineError> {
        let state = self.state()?;
        let pattern = match input.into() {
            PatternInput::Pattern(pattern) => pattern,
            PatternInput::Record(record) => match decode_record(record) {
                Ok(pattern) => pattern,
                Err(reason) => {
                    warn!("Rejected pattern record: {}", reason);
                    return Ok(false);
                }
            },
        };

        let added = state.store().add(pattern);
        if added {
            state.persist().await;
        }
        Ok(added)
    }

    /// Remove a pattern, forgetting its dedup entry and statistics.
    pub async fn remove_pattern(&self, id: &str) -> Result<bool, EngineError> {
        let state = self.state()?;
        let removed = state.engine.remove_pattern(id);
        if removed {
            state.persist().await;
        }
        Ok(removed)
    }

    pub fn get_pattern(&self, id: &str) -> Result<Option<Pattern>, EngineError> {
        Ok(self
            .state()?
            .store()
            .get(id)
            .map(|p| p.as_ref().clone()))
    }

    pub fn get_patterns(
        &self,
        interruption_type: Option<InterruptionType>,
        domain: Option<&str>,
    ) -> Result<Vec<Pattern>, EngineError> {
        let state = self.state()?;
        Ok(state
            .store()
            .query(interruption_type, domain)
            .iter()
            .map(|p| p.as_ref().clone())
            .collect())
    }

    /// Reset the dedup set. Returns how many patterns were cleared.
    pub fn clear_handled(&self) -> Result<usize, EngineError> {
        Ok(self.state()?.engine.clear_handled())
    }

    /// Write the pattern and statistics files now, regardless of autosave.
    pub async fn save(&self) -> Result<bool, EngineError> {
        Ok(self.state()?.save_all().await)
    }

    /// Merge patterns from `path`. Returns the number imported.
    pub async fn import_patterns(&self, path: &Path) -> Result<usize, EngineError> {
        let state = self.state()?;
        match state.store().import_from(path).await {
            Ok(report) => {
                if report.loaded > 0 {
                    state.persist().await;
                }
                Ok(report.loaded)
            }
            Err(e) => {
                warn!("Failed to import patterns from {}: {}", path.display(), e);
                Ok(0)
            }
        }
    }

    pub async fn export_patterns(&self, path: &Path) -> Result<bool, EngineError> {
        let state = self.state()?;
        match state.store().export_to(path).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Failed to export patterns to {}: {}", path.display(), e);
                Ok(false)
            }
        }
    }

    pub fn stats(&self) -> Result<HashMap<String, PatternStats>, EngineError> {
        Ok(self.state()?.engine.stats().snapshot())
    }

    /// Drop the statistics of one pattern, or of all patterns when `id` is
    /// `None`. Returns how many entries were dropped.
    pub async fn reset_stats(&self, id: Option<&str>) -> Result<usize, EngineError> {
        let state = self.state()?;
        let dropped = state.engine.stats().reset(id);
        match id {
            Some(id) => info!("Reset statistics for pattern {}", id),
            None => info!("Reset statistics for {} patterns", dropped),
        }
        state.persist_stats().await;
        Ok(dropped)
    }

    /// Learn a pattern from recorded steps and add it. Returns the new id.
    pub async fn learn(
        &self,
        url: &str,
        steps: &[RecordedStep],
        interruption_type: InterruptionType,
    ) -> Result<Option<String>, EngineError> {
        let state = self.state()?;
        let Some(pattern) = learn_pattern(url, steps, interruption_type) else {
            return Ok(None);
        };

        let id = pattern.id.clone();
        if !state.store().add(pattern) {
            return Ok(None);
        }
        state.persist().await;
        Ok(Some(id))
    }

    /// Diagnostics from the most recent pattern file load.
    pub fn last_load_report(&self) -> Result<LoadReport, EngineError> {
        Ok(self.state()?.load_report.clone())
    }
}
