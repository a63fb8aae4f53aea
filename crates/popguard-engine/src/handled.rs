//! Session dedup set.

use std::collections::HashSet;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct HandledState {
    done: HashSet<String>,
    in_flight: HashSet<String>,
}

/// Ids of patterns that completed their dismiss sequence in this session.
///
/// Empty when the engine is created, grows as passes succeed, and shrinks
/// only through [`remove`](Self::remove) (pattern deleted) or
/// [`clear`](Self::clear). Never persisted.
///
/// A pass reserves a pattern with [`try_begin`](Self::try_begin) before
/// touching the driver and releases it through the returned
/// [`Reservation`], so concurrent passes never attempt the same pattern at
/// once.
#[derive(Debug, Default)]
pub struct HandledSet {
    state: Mutex<HandledState>,
}

/// An attempt in progress on one pattern.
#[must_use]
pub struct Reservation<'a> {
    set: &'a HandledSet,
    id: String,
    finished: bool,
}

impl Reservation<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Release the reservation and record the id as handled if `commit`
    /// agrees. `commit` runs under the set's lock, so it cannot interleave
    /// with a [`HandledSet::remove`] of the same id.
    pub fn complete(mut self, commit: impl FnOnce() -> bool) -> bool {
        self.finished = true;
        let mut state = self.set.state.lock();
        state.in_flight.remove(&self.id);
        if !commit() {
            return false;
        }
        state.done.insert(self.id.clone());
        true
    }

    /// Release the reservation without recording it. `on_release` runs
    /// under the set's lock.
    pub fn abandon(mut self, on_release: impl FnOnce()) {
        self.finished = true;
        let mut state = self.set.state.lock();
        state.in_flight.remove(&self.id);
        on_release();
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.set.state.lock().in_flight.remove(&self.id);
        }
    }
}

impl HandledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.lock().done.contains(id)
    }

    /// Reserve `id` for an attempt.
    ///
    /// Returns `None` when it is already handled or another pass holds it.
    /// Dropping the reservation without finishing it releases the id.
    pub fn try_begin(&self, id: &str) -> Option<Reservation<'_>> {
        let mut state = self.state.lock();
        if state.done.contains(id) || !state.in_flight.insert(id.to_string()) {
            return None;
        }
        Some(Reservation {
            set: self,
            id: id.to_string(),
            finished: false,
        })
    }

    /// Record a handled pattern directly. Returns false if it was already recorded.
    pub fn insert(&self, id: impl Into<String>) -> bool {
        self.state.lock().done.insert(id.into())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.state.lock().done.remove(id)
    }

    /// Forget every handled pattern. Returns how many were recorded.
    ///
    /// Attempts still in flight are unaffected.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.done.len();
        state.done.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.state.lock().done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().done.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Sorted copy of the recorded ids.
    pub fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().done.iter().cloned().collect();
        ids.sort();
        ids
    }
}
