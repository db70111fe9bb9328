//! In-memory receipt collection
//!
//! Holds the full server-authoritative collection and the subset selected by
//! the current `FilterCriteria`. The subset is only ever derived from the full
//! collection; it is recomputed whenever either input changes.
//!
//! Loads are ticketed: each fetch takes a `LoadTicket`, and only the most
//! recently issued ticket may replace the collection. A slow response that
//! completes after a newer fetch has started is discarded.

use tracing::debug;

use crate::filter::FilterCriteria;
use crate::models::Receipt;

/// Identifies one collection fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Default)]
pub struct ReceiptStore {
    all: Vec<Receipt>,
    filtered: Vec<Receipt>,
    criteria: FilterCriteria,
    generation: u64,
    loaded: bool,
}

impl ReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch; any ticket issued earlier becomes stale
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    /// Complete a fetch. Returns false (and keeps the current data) for a stale ticket.
    pub fn finish_load(&mut self, ticket: LoadTicket, receipts: Vec<Receipt>) -> bool {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "Discarding stale receipt load"
            );
            return false;
        }
        self.all = receipts;
        self.loaded = true;
        self.refilter();
        true
    }

    /// Replace the criteria and recompute the filtered subset
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    pub fn clear_criteria(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    /// Drop all data (logout); outstanding tickets become stale
    pub fn reset(&mut self) {
        self.generation += 1;
        self.all.clear();
        self.filtered.clear();
        self.criteria = FilterCriteria::default();
        self.loaded = false;
    }

    pub fn all(&self) -> &[Receipt] {
        &self.all
    }

    pub fn filtered(&self) -> &[Receipt] {
        &self.filtered
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn active_filter_count(&self) -> usize {
        self.criteria.active_count()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, id: i64) -> Option<&Receipt> {
        self.all.iter().find(|r| r.id == id)
    }

    fn refilter(&mut self) {
        self.filtered = if self.criteria.is_empty() {
            self.all.clone()
        } else {
            self.criteria.apply(&self.all)
        };
    }
}
