//! Rebuild-on-write.
//!
//! The content store announces writes as [`ChangeEvent`]s. [`SpineRefresher`]
//! filters out edits that cannot change navigation and rebuilds and persists
//! the spine for the rest.

use std::sync::Arc;
use std::time::Instant;

use lore_storage::{ChangeEvent, ChangeEventReceiver, Storage};

use crate::error::SpineError;
use crate::spine::SpineIndex;

/// Default depth above which rebuilt spines log a warning.
pub const DEFAULT_MAX_DEPTH_WARNING: usize = 32;

/// Rebuilds and persists spines in response to change events.
pub struct SpineRefresher {
    storage: Arc<dyn Storage>,
    max_depth_warning: usize,
}

impl SpineRefresher {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_depth_warning: DEFAULT_MAX_DEPTH_WARNING,
        }
    }

    /// Set the depth above which rebuilds log a warning.
    #[must_use]
    pub fn with_max_depth_warning(mut self, depth: usize) -> Self {
        self.max_depth_warning = depth;
        self
    }

    /// React to one event.
    ///
    /// Returns `Ok(false)` when the event cannot affect the spine.
    pub fn handle(&self, event: &ChangeEvent) -> Result<bool, SpineError> {
        if !event.affects_spine() {
            tracing::debug!(unit = event.unit, fields = ?event.fields, "Change ignored");
            return Ok(false);
        }
        self.rebuild(event.unit)?;
        Ok(true)
    }

    /// Rebuild the spine of `unit` and persist it in its own transaction.
    pub fn rebuild(&self, unit: i64) -> Result<SpineIndex, SpineError> {
        let start = Instant::now();

        let mut tx = self.storage.begin()?;
        let spine = SpineIndex::create(&*tx, unit)?;
        tx.set_spine(unit, spine.encode()?)?;
        tx.commit()?;

        let max_depth = spine.max_depth();
        if max_depth > self.max_depth_warning {
            tracing::warn!(
                unit,
                max_depth,
                limit = self.max_depth_warning,
                "Spine is unusually deep"
            );
        }

        tracing::info!(
            unit,
            nodes = spine.nodes().count(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Spine rebuilt"
        );
        Ok(spine)
    }

    /// Process events until every sender is dropped.
    ///
    /// Events already queued are drained together and consecutive structural
    /// events for the same project trigger a single rebuild. Failed rebuilds
    /// are logged and skipped. Returns the number of successful rebuilds.
    pub fn run(&self, events: &ChangeEventReceiver) -> usize {
        let mut rebuilds = 0;
        while let Some(first) = events.recv() {
            let mut batch = vec![first];
            while let Some(next) = events.try_recv() {
                batch.push(next);
            }

            for unit in coalesce(&batch) {
                match self.rebuild(unit) {
                    Ok(_) => rebuilds += 1,
                    Err(e) => tracing::warn!(unit, error = %e, "Spine rebuild failed"),
                }
            }
        }
        rebuilds
    }
}

/// Units to rebuild for a batch, one per run of consecutive structural events.
fn coalesce(events: &[ChangeEvent]) -> Vec<i64> {
    let mut units: Vec<i64> = Vec::new();
    for event in events.iter().filter(|e| e.affects_spine()) {
        if units.last() != Some(&event.unit) {
            units.push(event.unit);
        }
    }
    units
}
