//! Windowed pagination
//!
//! A window exposes a growing prefix of a collection: `initial_count` items on
//! first paint, then one more `page_size` batch per load-more. The window is a
//! pure state machine with no delay and no I/O; pacing and network fetches are
//! layered on top through load tickets (`begin_load_more`/`finish_load_more`).

use serde::Serialize;

use crate::stores::errors::SyncError;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    page_size: usize,
    initial_count: usize,
}

impl WindowConfig {
    pub fn new(page_size: usize, initial_count: usize) -> Result<Self, SyncError> {
        if page_size == 0 {
            return Err(SyncError::InvalidConfig {
                field: "page_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        let config = Self {
            page_size,
            initial_count,
        };
        if config.strands_tail() {
            log::warn!(
                "initial_count {} is below page_size {}: a list of at most {} items never shows its tail",
                initial_count,
                page_size,
                page_size
            );
        }
        Ok(config)
    }

    /// Whether a short list (more than `initial_count` but at most one page)
    /// would be cut at first paint with no page left to load
    pub fn strands_tail(&self) -> bool {
        self.initial_count < self.page_size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }
}

// =============================================================================
// Window
// =============================================================================

/// Proof that a load-more was started against a particular window generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Serializable view of the window bookkeeping ("Page X of Y", "N of M items")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSnapshot {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub is_loading_more: bool,
    pub total_items: usize,
    pub displayed_count: usize,
}

#[derive(Debug, Clone)]
pub struct PaginationWindow {
    config: WindowConfig,
    current_page: usize,
    displayed_count: usize,
    total_items: usize,
    is_loading_more: bool,
    /// Bumped by every reset; tickets from older generations are ignored
    generation: u64,
}

impl PaginationWindow {
    pub fn new(config: WindowConfig, total_items: usize) -> Self {
        Self {
            config,
            current_page: 1,
            displayed_count: config.initial_count.min(total_items),
            total_items,
            is_loading_more: false,
            generation: 0,
        }
    }

    pub fn config(&self) -> WindowConfig {
        self.config
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn displayed_count(&self) -> usize {
        self.displayed_count
    }

    pub fn is_loading_more(&self) -> bool {
        self.is_loading_more
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.config.page_size)
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// The visible prefix of `items` (which must be the windowed collection)
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.displayed_count.min(items.len())]
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            current_page: self.current_page,
            total_pages: self.total_pages(),
            has_more: self.has_more(),
            is_loading_more: self.is_loading_more,
            total_items: self.total_items,
            displayed_count: self.displayed_count,
        }
    }

    /// Advance one page immediately. No-op while a load is in flight or at the
    /// end of the list.
    pub fn load_more(&mut self) -> bool {
        match self.begin_load_more() {
            Some(ticket) => self.finish_load_more(ticket),
            None => false,
        }
    }

    /// Check-and-set the loading flag in one step. `None` means the call must
    /// be ignored (already loading, or nothing more to show).
    pub fn begin_load_more(&mut self) -> Option<LoadTicket> {
        if self.is_loading_more || !self.has_more() {
            return None;
        }
        self.is_loading_more = true;
        Some(LoadTicket {
            generation: self.generation,
        })
    }

    /// Start a load that may extend the collection itself (network page).
    /// Only a load already in flight blocks it.
    pub fn begin_remote_load(&mut self) -> Option<LoadTicket> {
        if self.is_loading_more {
            return None;
        }
        self.is_loading_more = true;
        Some(LoadTicket {
            generation: self.generation,
        })
    }

    /// Whether no reset happened since `ticket` was issued
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Complete a load started with `ticket`. Stale tickets (a reset happened
    /// meanwhile) change nothing and return false.
    pub fn finish_load_more(&mut self, ticket: LoadTicket) -> bool {
        if ticket.generation != self.generation {
            log::debug!("Dropping stale load-more from generation {}", ticket.generation);
            return false;
        }
        self.is_loading_more = false;
        if !self.has_more() {
            return false;
        }
        self.current_page += 1;
        self.recompute_displayed();
        true
    }

    /// Give up on a load without advancing (e.g. the fetch failed)
    pub fn abort_load_more(&mut self, ticket: LoadTicket) {
        if ticket.generation == self.generation {
            self.is_loading_more = false;
        }
    }

    /// Back to the first page; any in-flight load becomes stale
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.current_page = 1;
        self.is_loading_more = false;
        self.displayed_count = self.config.initial_count.min(self.total_items);
    }

    /// Tell the window the current length of its collection. A length that
    /// differs from the last one seen (new filter, refetch, insert) resets the
    /// window. Returns whether a reset happened.
    pub fn observe_total(&mut self, total_items: usize) -> bool {
        if total_items == self.total_items {
            return false;
        }
        log::debug!(
            "Collection length changed {} -> {}, resetting window",
            self.total_items,
            total_items
        );
        self.total_items = total_items;
        self.reset();
        true
    }

    /// Record growth produced by this window's own remote load-more, which
    /// must not snap the window back to page one.
    pub fn grow_total(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.displayed_count = self.displayed_count.min(total_items);
    }

    fn recompute_displayed(&mut self) {
        let paged = self.current_page.saturating_mul(self.config.page_size);
        // never shrink below the first paint when initial_count > page_size
        let target = paged.max(self.config.initial_count);
        self.displayed_count = target.min(self.total_items);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn window(page_size: usize, initial_count: usize, total: usize) -> PaginationWindow {
        PaginationWindow::new(WindowConfig::new(page_size, initial_count).unwrap(), total)
    }

    fn assert_bounds(w: &PaginationWindow) {
        assert!(w.displayed_count() <= w.total_items());
        assert_eq!(w.has_more(), w.current_page() < w.total_items().div_ceil(w.config().page_size()));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(WindowConfig::new(0, 5).is_err());
    }

    #[test]
    fn test_twenty_three_items_in_pages_of_five() {
        let mut w = window(5, 5, 23);
        assert_eq!(w.displayed_count(), 5);
        assert_eq!(w.total_pages(), 5);
        assert!(w.has_more());

        for _ in 0..4 {
            assert!(w.load_more());
        }

        assert_eq!(w.current_page(), 5);
        assert_eq!(w.displayed_count(), 23);
        assert!(!w.has_more());
    }

    #[test]
    fn test_load_more_at_end_changes_nothing() {
        let mut w = window(5, 5, 7);
        assert!(w.load_more());
        let before = w.snapshot();

        assert!(!w.load_more());
        assert!(!w.load_more());
        assert_eq!(w.snapshot(), before);
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let mut w = window(5, 5, 50);
        let ticket = w.begin_load_more().unwrap();
        assert!(w.begin_load_more().is_none());
        assert!(!w.load_more());

        assert!(w.finish_load_more(ticket));
        assert_eq!(w.current_page(), 2);
        assert_eq!(w.displayed_count(), 10);
    }

    #[test]
    fn test_reset_invalidates_in_flight_ticket() {
        let mut w = window(5, 5, 50);
        let ticket = w.begin_load_more().unwrap();
        w.reset();

        assert!(!w.finish_load_more(ticket));
        assert_eq!(w.current_page(), 1);
        assert_eq!(w.displayed_count(), 5);
        assert!(!w.is_loading_more());
    }

    #[test]
    fn test_abort_leaves_page_unchanged() {
        let mut w = window(5, 5, 50);
        let ticket = w.begin_load_more().unwrap();
        w.abort_load_more(ticket);

        assert!(!w.is_loading_more());
        assert_eq!(w.current_page(), 1);
        assert_eq!(w.displayed_count(), 5);
    }

    #[test]
    fn test_shorter_collection_clamps() {
        let mut w = window(5, 5, 40);
        w.load_more();
        w.load_more();
        assert_eq!(w.displayed_count(), 15);

        assert!(w.observe_total(3));
        assert_eq!(w.current_page(), 1);
        assert_eq!(w.displayed_count(), 3);
        assert!(!w.has_more());
        assert_bounds(&w);
    }

    #[test]
    fn test_same_length_does_not_reset() {
        let mut w = window(5, 5, 40);
        w.load_more();
        assert!(!w.observe_total(40));
        assert_eq!(w.current_page(), 2);
    }

    #[test]
    fn test_grow_total_keeps_page() {
        let mut w = window(5, 5, 5);
        assert!(!w.has_more());
        w.grow_total(10);
        assert_eq!(w.current_page(), 1);
        assert!(w.load_more());
        assert_eq!(w.displayed_count(), 10);
    }

    #[test]
    fn test_remote_load_past_local_end() {
        let mut w = window(5, 5, 5);
        assert!(w.begin_load_more().is_none());

        let ticket = w.begin_remote_load().unwrap();
        assert!(w.begin_remote_load().is_none());
        assert!(w.is_current(ticket));

        w.grow_total(8);
        assert!(w.finish_load_more(ticket));
        assert_eq!(w.current_page(), 2);
        assert_eq!(w.displayed_count(), 8);

        let stale = w.begin_remote_load().unwrap();
        w.reset();
        assert!(!w.is_current(stale));
    }

    #[test]
    fn test_short_first_paint_is_flagged() {
        assert!(WindowConfig::new(5, 2).unwrap().strands_tail());
        assert!(!WindowConfig::new(5, 5).unwrap().strands_tail());
        assert!(!WindowConfig::new(5, 12).unwrap().strands_tail());

        // the tail of a one-page list stays out of reach
        let mut w = window(5, 2, 4);
        assert_eq!(w.displayed_count(), 2);
        assert!(!w.has_more());
        assert!(!w.load_more());
    }

    #[test]
    fn test_initial_count_independent_of_page_size() {
        let mut w = window(5, 12, 30);
        assert_eq!(w.displayed_count(), 12);
        w.load_more();
        assert_eq!(w.displayed_count(), 12);
        w.load_more();
        assert_eq!(w.displayed_count(), 15);

        let w = window(5, 2, 30);
        assert_eq!(w.displayed_count(), 2);
    }

    #[test]
    fn test_empty_collection() {
        let mut w = window(5, 5, 0);
        assert_eq!(w.displayed_count(), 0);
        assert_eq!(w.total_pages(), 0);
        assert!(!w.has_more());
        assert!(!w.load_more());
    }

    #[test]
    fn test_bounds_hold_across_operation_sequences() {
        for page_size in 1..6 {
            for initial in 0..8 {
                for total in 0..25 {
                    let mut w = window(page_size, initial, total);
                    assert_bounds(&w);
                    for step in 0..12 {
                        match step % 5 {
                            3 => w.reset(),
                            4 => {
                                w.observe_total(total / 2);
                            }
                            _ => {
                                w.load_more();
                            }
                        }
                        assert_bounds(&w);
                    }
                    w.reset();
                    assert_eq!(w.current_page(), 1);
                    assert_eq!(w.displayed_count(), initial.min(w.total_items()));
                }
            }
        }
    }

    #[test]
    fn test_visible_prefix() {
        let mut w = window(2, 2, 5);
        let items = [1, 2, 3, 4, 5];
        assert_eq!(w.visible(&items), &[1, 2]);
        w.load_more();
        assert_eq!(w.visible(&items), &[1, 2, 3, 4]);
    }
}
