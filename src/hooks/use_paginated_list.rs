//! use_paginated_list hook - windowed list state for a screen
//!
//! Wraps a `WindowedList` in a signal holding the current `ListPage`, plus
//! callbacks for load-more, reset and re-reading the collection after it was
//! changed elsewhere (mutations, refetches).

use dioxus::prelude::*;

use crate::stores::windowed_list::{ListPage, WindowedList};
use crate::utils::identity::Identified;

/// Return type for the use_paginated_list hook
pub struct UsePaginatedList<T: 'static> {
    /// What to render: displayed items plus window bookkeeping
    pub page: Signal<ListPage<T>>,
    /// Show the next page (ignored while a load is in flight)
    pub load_more: Callback<()>,
    /// Back to the first page
    pub reset: Callback<()>,
    /// Re-read the collection into `page`
    pub sync: Callback<()>,
}

impl<T: 'static> Clone for UsePaginatedList<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for UsePaginatedList<T> {}

/// Hook for rendering a windowed list
///
/// # Example
/// ```rust,ignore
/// let communities = use_paginated_list(move || WindowedList::new(collection.clone(), config));
///
/// for item in communities.page.read().displayed_items.iter() { ... }
/// button {
///     disabled: communities.page.read().is_loading_more,
///     onclick: move |_| communities.load_more.call(()),
///     "Load more"
/// }
/// ```
pub fn use_paginated_list<T, F>(init: F) -> UsePaginatedList<T>
where
    T: Identified + Clone + 'static,
    F: FnOnce() -> WindowedList<T>,
{
    let list = use_hook(init);
    let mut page = use_signal({
        let list = list.clone();
        move || list.view()
    });

    let list_for_load = list.clone();
    let load_more = use_callback(move |_: ()| {
        let list = list_for_load.clone();
        let pending = list.load_more();
        // paced loads render the spinner before advancing
        page.set(list.view());

        spawn(async move {
            if pending.await {
                log::debug!("Advanced to page {}", list.current_page());
            }
            page.set(list.view());
        });
    });

    let list_for_reset = list.clone();
    let reset = use_callback(move |_: ()| {
        list_for_reset.reset();
        page.set(list_for_reset.view());
    });

    let sync = use_callback(move |_: ()| {
        page.set(list.view());
    });

    UsePaginatedList {
        page,
        load_more,
        reset,
        sync,
    }
}
