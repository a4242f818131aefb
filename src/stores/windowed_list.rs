//! Windowed view over a shared collection
//!
//! What a list screen actually renders: the collection, narrowed by an
//! optional filter, cut to the pagination window, with the user's local
//! items merged ahead. Every read re-checks the filtered length so a new
//! filter or an insert/remove resets the window instead of showing a window
//! that no longer matches the list.

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::stores::collection::SharedCollection;
use crate::stores::errors::SyncError;
use crate::stores::list_settings::ListSettings;
use crate::stores::local_overlay::{merge_local, LocalOverlay};
use crate::stores::pagination::{PaginationWindow, WindowConfig, WindowSnapshot};
use crate::utils::identity::Identified;
use crate::utils::runtime::sleep;

pub type ItemFilter<T> = Rc<dyn Fn(&T) -> bool>;

/// Everything a list screen needs to render one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage<T> {
    pub displayed_items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub is_loading_more: bool,
    pub total_items: usize,
    pub displayed_count: usize,
}

impl<T> ListPage<T> {
    fn new(displayed_items: Vec<T>, window: WindowSnapshot) -> Self {
        Self {
            displayed_items,
            current_page: window.current_page,
            total_pages: window.total_pages,
            has_more: window.has_more,
            is_loading_more: window.is_loading_more,
            total_items: window.total_items,
            displayed_count: window.displayed_count,
        }
    }
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self {
            displayed_items: Vec::new(),
            current_page: 1,
            total_pages: 0,
            has_more: false,
            is_loading_more: false,
            total_items: 0,
            displayed_count: 0,
        }
    }
}

pub struct WindowedList<T> {
    source: SharedCollection<T>,
    window: Rc<RefCell<PaginationWindow>>,
    filter: Rc<RefCell<Option<ItemFilter<T>>>>,
    overlay: Option<LocalOverlay<T>>,
    /// Spinner pacing for local load-more; `None` advances instantly
    pacing: Option<Duration>,
}

impl<T> Clone for WindowedList<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            window: Rc::clone(&self.window),
            filter: Rc::clone(&self.filter),
            overlay: self.overlay.clone(),
            pacing: self.pacing,
        }
    }
}

impl<T: Identified + Clone + 'static> WindowedList<T> {
    pub fn new(source: SharedCollection<T>, config: WindowConfig) -> Self {
        let window = PaginationWindow::new(config, source.len());
        Self {
            source,
            window: Rc::new(RefCell::new(window)),
            filter: Rc::new(RefCell::new(None)),
            overlay: None,
            pacing: None,
        }
    }

    pub fn from_settings(source: SharedCollection<T>, settings: &ListSettings) -> Result<Self, SyncError> {
        settings.validate()?;
        Ok(Self::new(source, settings.window_config()?).with_pacing(settings.pacing()))
    }

    pub fn with_overlay(mut self, overlay: LocalOverlay<T>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_pacing(mut self, pacing: Option<Duration>) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn source(&self) -> &SharedCollection<T> {
        &self.source
    }

    pub fn overlay(&self) -> Option<&LocalOverlay<T>> {
        self.overlay.as_ref()
    }

    // ============================================================================
    // Filtering
    // ============================================================================

    pub fn set_filter<F>(&self, filter: F)
    where
        F: Fn(&T) -> bool + 'static,
    {
        *self.filter.borrow_mut() = Some(Rc::new(filter));
        self.sync();
    }

    pub fn clear_filter(&self) {
        *self.filter.borrow_mut() = None;
        self.sync();
    }

    fn current_filter(&self) -> Option<ItemFilter<T>> {
        self.filter.borrow().clone()
    }

    fn matching(&self) -> Vec<T> {
        match self.current_filter() {
            Some(filter) => self.source.filtered(|item| filter(item)),
            None => self.source.snapshot(),
        }
    }

    /// Length of the filtered collection
    pub fn filtered_len(&self) -> usize {
        match self.current_filter() {
            Some(filter) => self.source.with(|items| items.iter().filter(|item| filter(item)).count()),
            None => self.source.len(),
        }
    }

    /// Re-check the filtered length; resets the window when it changed.
    /// Returns whether a reset happened.
    pub fn sync(&self) -> bool {
        let total = self.filtered_len();
        self.window.borrow_mut().observe_total(total)
    }

    // ============================================================================
    // Reading
    // ============================================================================

    /// The windowed server/collection items, without local items
    pub fn visible_items(&self) -> Vec<T> {
        let mut items = self.matching();
        let mut window = self.window.borrow_mut();
        window.observe_total(items.len());
        items.truncate(window.displayed_count());
        items
    }

    /// Local items merged ahead of the visible window
    pub fn displayed_items(&self) -> Vec<T> {
        let visible = self.visible_items();
        let Some(overlay) = &self.overlay else {
            return visible;
        };

        let local = match self.current_filter() {
            Some(filter) => overlay.collection().filtered(|item| filter(item)),
            None => overlay.items(),
        };
        merge_local(&local, &visible)
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.sync();
        self.window.borrow().snapshot()
    }

    pub fn view(&self) -> ListPage<T> {
        let displayed_items = self.displayed_items();
        ListPage::new(displayed_items, self.window.borrow().snapshot())
    }

    pub fn current_page(&self) -> usize {
        self.snapshot().current_page
    }

    pub fn total_pages(&self) -> usize {
        self.snapshot().total_pages
    }

    pub fn has_more(&self) -> bool {
        self.snapshot().has_more
    }

    pub fn is_loading_more(&self) -> bool {
        self.window.borrow().is_loading_more()
    }

    pub fn total_items(&self) -> usize {
        self.snapshot().total_items
    }

    pub fn displayed_count(&self) -> usize {
        self.snapshot().displayed_count
    }

    // ============================================================================
    // Paging
    // ============================================================================

    /// Show one more page. The loading check happens right away, so repeated
    /// calls during one scroll gesture advance at most once. Resolves to
    /// whether the window advanced.
    pub fn load_more(&self) -> LocalBoxFuture<'static, bool> {
        self.sync();
        let ticket = match self.window.borrow_mut().begin_load_more() {
            Some(ticket) => ticket,
            None => return future::ready(false).boxed_local(),
        };

        match self.pacing {
            None => {
                let advanced = self.window.borrow_mut().finish_load_more(ticket);
                future::ready(advanced).boxed_local()
            }
            Some(delay) => {
                let window = Rc::clone(&self.window);
                async move {
                    sleep(delay).await;
                    window.borrow_mut().finish_load_more(ticket)
                }
                .boxed_local()
            }
        }
    }

    /// Back to the first page. Owners call this when they know the list
    /// changed underneath; length changes are also picked up on every read.
    pub fn reset(&self) {
        self.sync();
        self.window.borrow_mut().reset();
    }

    pub(crate) fn window(&self) -> &Rc<RefCell<PaginationWindow>> {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::identity::{Item, ItemId};
    use tokio::time::{self, Instant};

    fn numbered(count: i64) -> SharedCollection<Item> {
        SharedCollection::from_vec((1..=count).map(|n| Item::new(n).with("even", n % 2 == 0)).collect())
    }

    fn list(count: i64, page_size: usize, initial: usize) -> WindowedList<Item> {
        WindowedList::new(numbered(count), WindowConfig::new(page_size, initial).unwrap())
    }

    #[tokio::test]
    async fn test_twenty_three_items_end_to_end() {
        let list = list(23, 5, 5);
        let page = list.view();
        assert_eq!(page.displayed_count, 5);
        assert_eq!(page.total_pages, 5);
        assert!(page.has_more);

        for _ in 0..4 {
            assert!(list.load_more().await);
        }

        let page = list.view();
        assert_eq!(page.current_page, 5);
        assert_eq!(page.displayed_count, 23);
        assert_eq!(page.displayed_items.len(), 23);
        assert!(!page.has_more);

        assert!(!list.load_more().await);
        assert_eq!(list.view(), page);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_load_more_ignores_repeat_calls() {
        let list = list(30, 5, 5).with_pacing(Some(Duration::from_millis(300)));
        let start = Instant::now();

        let first = list.load_more();
        assert!(list.is_loading_more());
        let repeat = list.load_more();
        assert!(!repeat.await);

        assert!(first.await);
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(list.current_page(), 2);
        assert_eq!(list.displayed_count(), 10);
        assert!(!list.is_loading_more());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_beats_in_flight_paced_load() {
        let list = list(30, 5, 5).with_pacing(Some(Duration::from_millis(300)));

        let pending = list.load_more();
        time::sleep(Duration::from_millis(100)).await;
        list.reset();

        assert!(!pending.await);
        assert_eq!(list.current_page(), 1);
        assert_eq!(list.displayed_count(), 5);
    }

    #[tokio::test]
    async fn test_filter_shrink_resets_and_clamps() {
        let list = list(40, 5, 5);
        list.load_more().await;
        list.load_more().await;
        assert_eq!(list.displayed_count(), 15);

        list.set_filter(|item: &Item| item.get_i64("n").is_some());
        let page = list.view();
        assert_eq!(page.total_items, 0);
        assert_eq!(page.displayed_count, 0);
        assert_eq!(page.current_page, 1);

        list.set_filter(|item: &Item| item.get_bool("even") == Some(true));
        let page = list.view();
        assert_eq!(page.total_items, 20);
        assert_eq!(page.displayed_count, 5);
        assert!(page.displayed_items.iter().all(|item| item.get_bool("even") == Some(true)));
    }

    #[tokio::test]
    async fn test_field_change_keeps_window() {
        let list = list(20, 5, 5);
        list.load_more().await;

        list.source().update_item(&ItemId::Num(3), |item| item.set("liked", true));
        assert_eq!(list.current_page(), 2);

        list.source().remove(&ItemId::Num(3));
        assert_eq!(list.current_page(), 1);
        assert_eq!(list.total_items(), 19);
    }

    #[test]
    fn test_overlay_merged_ahead_without_duplicates() {
        let overlay = LocalOverlay::new();
        let list = list(10, 3, 3).with_overlay(overlay.clone());

        overlay.push(Item::new("local-a"));
        overlay.push(Item::new(2));

        let ids: Vec<ItemId> = list.displayed_items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![ItemId::from("local-a"), ItemId::Num(1), ItemId::Num(2), ItemId::Num(3)]);

        let page = list.view();
        assert_eq!(page.displayed_count, 3);
        assert_eq!(page.displayed_items.len(), 4);
    }

    #[test]
    fn test_filter_applies_to_local_items() {
        let overlay = LocalOverlay::new();
        overlay.push(Item::new("draft").with("even", false));
        let list = list(4, 5, 5).with_overlay(overlay);

        list.set_filter(|item: &Item| item.get_bool("even") == Some(true));
        let ids: Vec<ItemId> = list.displayed_items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![ItemId::Num(2), ItemId::Num(4)]);
    }

    #[test]
    fn test_from_settings() {
        let settings = ListSettings {
            page_size: 4,
            initial_count: 6,
            ..Default::default()
        };
        let list = WindowedList::from_settings(numbered(10), &settings).unwrap();
        assert_eq!(list.displayed_count(), 6);
        assert_eq!(list.total_pages(), 3);

        let bad = ListSettings {
            page_size: 0,
            ..Default::default()
        };
        assert!(WindowedList::from_settings(numbered(1), &bad).is_err());
    }
}
