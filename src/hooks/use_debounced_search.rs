//! use_debounced_search hook - search bar over a windowed list
//!
//! Keystrokes update `query` right away; the list is filtered once typing
//! pauses. The pending debounce is disposed when the component unmounts.

use dioxus::prelude::*;
use std::time::Duration;

use crate::stores::search::{Searchable, SearchableList};
use crate::stores::windowed_list::{ListPage, WindowedList};
use crate::utils::identity::Identified;
use crate::utils::runtime::DisposalToken;

/// Return type for the use_debounced_search hook
pub struct UseDebouncedSearch<T: 'static> {
    /// Text as typed
    pub query: Signal<String>,
    /// Filtered, windowed items
    pub page: Signal<ListPage<T>>,
    /// Feed a keystroke
    pub set_query: Callback<String>,
    /// Apply the typed query now (enter key)
    pub submit: Callback<()>,
    /// Close the search: drop the filter immediately
    pub clear: Callback<()>,
    pub load_more: Callback<()>,
}

impl<T: 'static> Clone for UseDebouncedSearch<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for UseDebouncedSearch<T> {}

/// Hook for a debounced search over a windowed list
///
/// # Example
/// ```rust,ignore
/// let search = use_debounced_search(move || WindowedList::new(members.clone(), config), Duration::from_millis(300));
///
/// input {
///     value: "{search.query}",
///     oninput: move |evt| search.set_query.call(evt.value()),
/// }
/// ```
pub fn use_debounced_search<T, F>(init: F, delay: Duration) -> UseDebouncedSearch<T>
where
    T: Identified + Searchable + Clone + 'static,
    F: FnOnce() -> WindowedList<T>,
{
    let mut query = use_signal(String::new);
    let list = use_hook(init);
    let mut page = use_signal({
        let list = list.clone();
        move || list.view()
    });

    let owner = use_hook(DisposalToken::new);
    let search = use_hook(|| {
        let applied_view = list.clone();
        SearchableList::with_owner(list.clone(), delay, &owner).on_query_applied(move |applied| {
            log::debug!("Search applied: '{}'", applied);
            let mut page = page;
            page.set(applied_view.view());
        })
    });

    {
        let owner = owner.clone();
        use_drop(move || owner.dispose());
    }

    let search_for_input = search.clone();
    let set_query = use_callback(move |raw: String| {
        query.set(raw.clone());
        search_for_input.set_query(&raw);
    });

    let search_for_submit = search.clone();
    let submit = use_callback(move |_: ()| {
        search_for_submit.submit();
    });

    let search_for_clear = search.clone();
    let clear = use_callback(move |_: ()| {
        query.set(String::new());
        search_for_clear.clear_query();
        page.set(search_for_clear.view());
    });

    let load_more = use_callback(move |_: ()| {
        let list = search.list().clone();
        let pending = list.load_more();
        page.set(list.view());
        spawn(async move {
            pending.await;
            page.set(list.view());
        });
    });

    UseDebouncedSearch {
        query,
        page,
        set_query,
        submit,
        clear,
        load_more,
    }
}
