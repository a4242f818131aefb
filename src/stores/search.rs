//! Debounced search over a windowed list
//!
//! Keystrokes go through a debouncer; only the settled query becomes a filter.
//! Applying a new filter resets the window to the first page.

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::stores::errors::SyncError;
use crate::stores::list_settings::ListSettings;
use crate::stores::windowed_list::{ListPage, WindowedList};
use crate::utils::debounce::Debouncer;
use crate::utils::identity::{Identified, Item};
use crate::utils::runtime::DisposalToken;

/// Entries that can be matched against a search query
pub trait Searchable {
    /// `query` is already normalized (trimmed, lowercase) and non-empty
    fn matches(&self, query: &str) -> bool;
}

impl Searchable for Item {
    fn matches(&self, query: &str) -> bool {
        if self.id.to_string().to_lowercase().contains(query) {
            return true;
        }
        self.fields.values().any(|value| match value {
            Value::String(text) => text.to_lowercase().contains(query),
            _ => false,
        })
    }
}

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

type QueryListener = Rc<RefCell<Option<Box<dyn Fn(&str)>>>>;

pub struct SearchableList<T> {
    list: WindowedList<T>,
    debouncer: Debouncer<String>,
    typed: Rc<RefCell<String>>,
    applied: Rc<RefCell<String>>,
    listener: QueryListener,
}

impl<T> Clone for SearchableList<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            debouncer: self.debouncer.clone(),
            typed: Rc::clone(&self.typed),
            applied: Rc::clone(&self.applied),
            listener: Rc::clone(&self.listener),
        }
    }
}

impl<T: Identified + Searchable + Clone + 'static> SearchableList<T> {
    pub fn new(list: WindowedList<T>, delay: Duration) -> Self {
        Self::with_owner(list, delay, &DisposalToken::new())
    }

    /// Search whose pending debounce is cancelled when `owner` is disposed
    pub fn with_owner(list: WindowedList<T>, delay: Duration, owner: &DisposalToken) -> Self {
        let applied = Rc::new(RefCell::new(String::new()));
        let listener: QueryListener = Rc::new(RefCell::new(None));

        let debouncer = {
            let list = list.clone();
            let applied = Rc::clone(&applied);
            let listener = Rc::clone(&listener);
            Debouncer::with_owner(delay, owner, move |query: String| {
                apply_query(&list, &applied, &listener, &query);
            })
        };

        Self {
            list,
            debouncer,
            typed: Rc::new(RefCell::new(String::new())),
            applied,
            listener,
        }
    }

    pub fn from_settings(list: WindowedList<T>, settings: &ListSettings) -> Result<Self, SyncError> {
        settings.validate()?;
        Ok(Self::new(list, settings.search_debounce()))
    }

    /// Called with the normalized query every time a new filter is applied
    /// (e.g. to also kick off a server-side search)
    pub fn on_query_applied<F>(self, listener: F) -> Self
    where
        F: Fn(&str) + 'static,
    {
        *self.listener.borrow_mut() = Some(Box::new(listener));
        self
    }

    /// Record a keystroke; the filter follows once typing pauses
    ///
    /// # Panics
    /// Native builds must call this inside a `tokio::task::LocalSet`, like
    /// [`Debouncer::call`].
    pub fn set_query(&self, raw: &str) {
        *self.typed.borrow_mut() = raw.to_string();
        self.debouncer.call(raw.to_string());
    }

    /// Apply whatever was typed right now (search button / enter key)
    pub fn submit(&self) -> bool {
        self.debouncer.flush()
    }

    /// Drop the filter immediately (search bar closed)
    pub fn clear_query(&self) {
        self.debouncer.cancel();
        self.typed.borrow_mut().clear();
        if !self.debouncer.is_disposed() {
            apply_query(&self.list, &self.applied, &self.listener, "");
        }
    }

    /// What the user typed last
    pub fn query(&self) -> String {
        self.typed.borrow().clone()
    }

    /// The query the list is currently filtered by
    pub fn applied_query(&self) -> String {
        self.applied.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn list(&self) -> &WindowedList<T> {
        &self.list
    }

    pub fn view(&self) -> ListPage<T> {
        self.list.view()
    }

    /// Screen teardown: nothing typed before this point will be applied
    pub fn dispose(&self) {
        self.debouncer.dispose();
    }
}

fn apply_query<T: Identified + Searchable + Clone + 'static>(
    list: &WindowedList<T>,
    applied: &Rc<RefCell<String>>,
    listener: &QueryListener,
    raw: &str,
) {
    let query = normalize_query(raw);
    if *applied.borrow() == query {
        return;
    }
    log::debug!("Applying search filter '{}'", query);
    *applied.borrow_mut() = query.clone();

    if query.is_empty() {
        list.clear_filter();
    } else {
        let needle = query.clone();
        list.set_filter(move |item: &T| item.matches(&needle));
    }
    list.reset();

    if let Some(listener) = listener.borrow().as_ref() {
        listener(&query);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::collection::SharedCollection;
    use crate::stores::pagination::WindowConfig;
    use std::cell::Cell;
    use tokio::task::LocalSet;
    use tokio::time;

    fn communities() -> WindowedList<Item> {
        let names = [
            "Paris Runners", "Park Cleanup", "Parents Club", "Hiking", "Photography",
            "Party Planning", "Cooking", "Parrot Owners", "Chess", "Painting",
            "Gardening", "Parkour",
        ];
        let items = names
            .iter()
            .enumerate()
            .map(|(i, name)| Item::new(i as i64 + 1).with("name", *name))
            .collect();
        WindowedList::new(SharedCollection::from_vec(items), WindowConfig::new(3, 3).unwrap())
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_item_matching() {
        let item = Item::new(5).with("name", "Paris Runners").with("members", 12);
        assert!(item.matches("runners"));
        assert!(item.matches("5"));
        assert!(!item.matches("12"));
        assert_eq!(normalize_query("  PaR "), "par");
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_filters_once() {
        LocalSet::new()
            .run_until(async {
                let passes = Rc::new(RefCell::new(Vec::new()));
                let recorded = Rc::clone(&passes);
                let search = SearchableList::new(communities(), ms(300))
                    .on_query_applied(move |q| recorded.borrow_mut().push(q.to_string()));

                for query in ["p", "pa", "par"] {
                    search.set_query(query);
                    time::sleep(ms(50)).await;
                }
                assert_eq!(search.view().total_items, 12);
                assert_eq!(search.query(), "par");
                assert_eq!(search.applied_query(), "");

                time::sleep(ms(300)).await;
                assert_eq!(*passes.borrow(), vec!["par".to_string()]);

                let page = search.view();
                // Paris, Park, Parents, Party, Parrot, Parkour
                assert_eq!(page.total_items, 6);
                assert_eq!(page.displayed_count, 3);
                assert!(page.has_more);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_query_resets_window() {
        LocalSet::new()
            .run_until(async {
                let search = SearchableList::new(communities(), ms(100));
                search.list().load_more().await;
                search.list().load_more().await;
                assert_eq!(search.list().current_page(), 3);

                search.set_query("a");
                time::sleep(ms(150)).await;

                let page = search.view();
                assert_eq!(page.current_page, 1);
                assert_eq!(page.displayed_count, 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_and_clear_apply_immediately() {
        LocalSet::new()
            .run_until(async {
                let count = Rc::new(Cell::new(0));
                let counter = Rc::clone(&count);
                let search = SearchableList::new(communities(), ms(300))
                    .on_query_applied(move |_| counter.set(counter.get() + 1));

                search.set_query("chess");
                assert!(search.submit());
                assert_eq!(search.view().total_items, 1);

                search.clear_query();
                assert_eq!(search.view().total_items, 12);
                assert_eq!(search.applied_query(), "");

                time::sleep(ms(600)).await;
                assert_eq!(count.get(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_drops_pending_query() {
        LocalSet::new()
            .run_until(async {
                let screen = DisposalToken::new();
                let search = SearchableList::with_owner(communities(), ms(300), &screen);

                search.set_query("chess");
                time::sleep(ms(100)).await;
                screen.dispose();
                time::sleep(ms(500)).await;

                assert_eq!(search.applied_query(), "");
                assert_eq!(search.view().total_items, 12);

                search.set_query("cooking");
                search.clear_query();
                time::sleep(ms(500)).await;
                assert_eq!(search.view().total_items, 12);
            })
            .await;
    }
}
