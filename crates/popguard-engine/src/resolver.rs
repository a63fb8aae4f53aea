//! Resolution engine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use popguard_config::Config;
use popguard_protocols::{
    AutomationDriver, DismissAction, DriverError, EngineError, InterruptionType, PageContext,
    Pattern, ResolutionResult, ResolvedInterruption,
};

use crate::domain::{DomainFilter, host_of};
use crate::handled::HandledSet;
use crate::stats::StatsRecorder;
use crate::store::PatternStore;

/// Runtime knobs for a [`ResolutionEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub enabled: bool,
    pub find_timeout: Duration,
    pub action_timeout: Duration,
    pub domain_filter: DomainFilter,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.engine.enabled,
            find_timeout: config.engine.find_timeout(),
            action_timeout: config.engine.action_timeout(),
            domain_filter: DomainFilter::from_config(&config.domains),
        }
    }
}

/// Why a bounded driver call did not produce a value.
enum CallError {
    Driver(DriverError),
    Cancelled,
}

/// Outcome of attempting one candidate.
enum Attempt {
    Missed,
    Handled(Option<DismissAction>),
    Failed(DriverError),
    Cancelled,
}

/// Runs resolution passes against a shared pattern store.
///
/// The engine owns its dedup set and statistics; two engines over the same
/// store do not see each other's handled patterns.
pub struct ResolutionEngine {
    store: Arc<PatternStore>,
    handled: HandledSet,
    stats: StatsRecorder,
    driver: RwLock<Option<Arc<dyn AutomationDriver>>>,
    settings: EngineSettings,
}

impl ResolutionEngine {
    pub fn new(store: Arc<PatternStore>, settings: EngineSettings) -> Self {
        Self {
            store,
            handled: HandledSet::new(),
            stats: StatsRecorder::new(),
            driver: RwLock::new(None),
            settings,
        }
    }

    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_driver(&self, driver: Arc<dyn AutomationDriver>) {
        info!("Automation driver set: {}", driver.name());
        *self.driver.write() = Some(driver);
    }

    pub fn driver(&self) -> Option<Arc<dyn AutomationDriver>> {
        self.driver.read().clone()
    }

    pub fn handled(&self) -> &HandledSet {
        &self.handled
    }

    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    /// Remove a pattern along with its dedup entry and statistics.
    ///
    /// A pass still attempting the pattern will not record it afterwards:
    /// the store entry goes first, and passes check it before recording.
    pub fn remove_pattern(&self, id: &str) -> bool {
        let removed = self.store.remove(id);
        if removed {
            self.handled.remove(id);
            self.stats.forget(id);
        }
        removed
    }

    /// Reset the dedup set so every pattern becomes eligible again.
    pub fn clear_handled(&self) -> usize {
        let cleared = self.handled.clear();
        info!("Cleared {} handled patterns", cleared);
        cleared
    }

    /// Patterns the next pass on `url` would attempt, in order.
    ///
    /// Disabled and already handled patterns are left out. Nothing is
    /// returned when the engine is disabled or the host is denied.
    pub fn plan(&self, url: Option<&str>, types: Option<&[InterruptionType]>) -> Vec<Arc<Pattern>> {
        let domain = url.and_then(host_of);
        if !self.admits(domain.as_deref()) {
            return Vec::new();
        }

        self.store
            .candidates(domain.as_deref(), types.unwrap_or_default())
            .into_iter()
            .filter(|p| p.enabled && !self.handled.contains(&p.id))
            .collect()
    }

    /// Run one resolution pass.
    pub async fn handle(
        &self,
        page: Option<&PageContext>,
        url: Option<&str>,
        types: Option<&[InterruptionType]>,
    ) -> ResolutionResult {
        self.handle_with_cancel(page, url, types, &CancellationToken::new())
            .await
    }

    /// Run one resolution pass that stops early when `cancel` fires.
    ///
    /// A cancelled pass returns the patterns completed before cancellation.
    /// A pattern interrupted mid-sequence is neither reported nor recorded
    /// as handled.
    pub async fn handle_with_cancel(
        &self,
        page: Option<&PageContext>,
        url: Option<&str>,
        types: Option<&[InterruptionType]>,
        cancel: &CancellationToken,
    ) -> ResolutionResult {
        let Some(page) = page else {
            let err = EngineError::Precondition("no page context supplied".to_string());
            warn!("Resolution pass rejected: {}", err);
            return ResolutionResult::failed(err.to_string());
        };
        let Some(driver) = self.driver() else {
            let err = EngineError::Precondition("no automation driver configured".to_string());
            warn!("Resolution pass rejected: {}", err);
            return ResolutionResult::failed(err.to_string());
        };

        let domain = url.and_then(host_of);
        if let (Some(url), None) = (url, &domain) {
            debug!("No host in url {}, only global patterns apply", url);
        }
        if !self.admits(domain.as_deref()) {
            return ResolutionResult::completed(Vec::new());
        }

        let candidates = self
            .store
            .candidates(domain.as_deref(), types.unwrap_or_default());
        debug!(
            "Resolution pass on page {} ({:?}): {} candidates",
            page.page_id(),
            domain,
            candidates.len()
        );

        let mut results = Vec::new();
        for pattern in candidates {
            if cancel.is_cancelled() {
                info!("Resolution pass cancelled after {} patterns", results.len());
                break;
            }
            if !pattern.enabled {
                continue;
            }
            let Some(reservation) = self.handled.try_begin(&pattern.id) else {
                continue;
            };

            match self.attempt(driver.as_ref(), page, &pattern, cancel).await {
                Attempt::Missed => reservation.abandon(|| {}),
                Attempt::Handled(action) => {
                    let committed = reservation.complete(|| {
                        let current = self.is_current(&pattern);
                        if current {
                            self.stats.record_success(&pattern.id);
                        }
                        current
                    });
                    if !committed {
                        debug!("Pattern {} was removed or replaced mid-pass", pattern.id);
                        continue;
                    }
                    info!(
                        "Handled {} interruption with pattern {}",
                        pattern.interruption_type, pattern.id
                    );
                    results.push(ResolvedInterruption {
                        pattern_id: pattern.id.clone(),
                        interruption_type: pattern.interruption_type,
                        action,
                    });
                }
                Attempt::Failed(e) => {
                    reservation.abandon(|| {
                        if self.is_current(&pattern) {
                            self.stats.record_failure(&pattern.id);
                        }
                    });
                    warn!("Pattern {} failed: {}", pattern.id, e);
                }
                Attempt::Cancelled => {
                    reservation.abandon(|| {});
                    info!(
                        "Resolution pass cancelled during pattern {}, {} completed",
                        pattern.id,
                        results.len()
                    );
                    break;
                }
            }
        }

        ResolutionResult::completed(results)
    }

    /// Whether the store still holds this exact pattern.
    fn is_current(&self, pattern: &Arc<Pattern>) -> bool {
        self.store
            .get(&pattern.id)
            .is_some_and(|current| Arc::ptr_eq(&current, pattern))
    }

    fn admits(&self, domain: Option<&str>) -> bool {
        if !self.settings.enabled {
            debug!("Resolution engine is disabled");
            return false;
        }
        domain.is_none_or(|host| self.settings.domain_filter.is_allowed(host))
    }

    async fn attempt(
        &self,
        driver: &dyn AutomationDriver,
        page: &PageContext,
        pattern: &Pattern,
        cancel: &CancellationToken,
    ) -> Attempt {
        if pattern.selectors.is_empty() {
            return Attempt::Missed;
        }

        let limit = self.settings.find_timeout;
        let lookup = bounded(limit, cancel, driver.find_element(page, &pattern.selectors, limit));
        let element = match lookup.await {
            Ok(Some(element)) => element,
            Ok(None) => return Attempt::Missed,
            Err(CallError::Cancelled) => return Attempt::Cancelled,
            Err(CallError::Driver(e)) => {
                warn!("Element lookup for pattern {} failed: {}", pattern.id, e);
                return Attempt::Missed;
            }
        };
        debug!("Pattern {} matched {}", pattern.id, element.selector);

        for action in &pattern.actions {
            let outcome = match action {
                DismissAction::Wait { millis } => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(CallError::Cancelled),
                        _ = tokio::time::sleep(Duration::from_millis(*millis)) => Ok(()),
                    }
                }
                _ => {
                    let call = driver.perform_action(page, &element, action);
                    bounded(self.settings.action_timeout, cancel, call).await
                }
            };

            match outcome {
                Ok(()) => {}
                Err(CallError::Cancelled) => return Attempt::Cancelled,
                Err(CallError::Driver(e)) => return Attempt::Failed(e),
            }
        }

        Attempt::Handled(pattern.actions.last().cloned())
    }
}

/// Await a driver call for at most `limit`, giving up early on cancellation.
async fn bounded<T, F>(limit: Duration, cancel: &CancellationToken, call: F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CallError::Cancelled),
        outcome = timeout(limit, call) => match outcome {
            Ok(result) => result.map_err(CallError::Driver),
            Err(_) => Err(CallError::Driver(DriverError::Timeout(limit))),
        },
    }
}
