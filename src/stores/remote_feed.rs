//! Network-backed feed
//!
//! Same window as a local list, but once the window reaches the end of what
//! has been fetched, load-more asks the `PageSource` for the next page first.

use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::services::collaborators::PageSource;
use crate::stores::errors::SyncError;
use crate::stores::windowed_list::{ListPage, WindowedList};
use crate::utils::identity::Identified;

/// Fetch status of a feed. The fetched items themselves live in the
/// feed's collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    /// Nothing requested yet
    #[default]
    Idle,

    /// A refresh or page fetch is in flight
    Loading,

    /// Last fetch succeeded
    Loaded,

    /// Last fetch failed with this message
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

pub struct RemoteFeed<T, P> {
    list: WindowedList<T>,
    pages: Rc<P>,
    state: Rc<RefCell<LoadState>>,
    exhausted: Rc<Cell<bool>>,
    refreshing: Rc<Cell<bool>>,
    /// Server position of the next page. Optimistic entries sharing the
    /// collection are not counted.
    server_offset: Rc<Cell<usize>>,
}

impl<T, P> Clone for RemoteFeed<T, P> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            pages: Rc::clone(&self.pages),
            state: Rc::clone(&self.state),
            exhausted: Rc::clone(&self.exhausted),
            refreshing: Rc::clone(&self.refreshing),
            server_offset: Rc::clone(&self.server_offset),
        }
    }
}

impl<T, P> RemoteFeed<T, P>
where
    T: Identified + Clone + 'static,
    P: PageSource<T> + 'static,
{
    pub fn new(list: WindowedList<T>, pages: Rc<P>) -> Self {
        Self {
            list,
            pages,
            state: Rc::new(RefCell::new(LoadState::Idle)),
            exhausted: Rc::new(Cell::new(false)),
            refreshing: Rc::new(Cell::new(false)),
            server_offset: Rc::new(Cell::new(0)),
        }
    }

    pub fn list(&self) -> &WindowedList<T> {
        &self.list
    }

    pub fn view(&self) -> ListPage<T> {
        let mut page = self.list.view();
        page.has_more = self.has_more();
        page
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// More to show locally, or the source has not returned a short page yet
    pub fn has_more(&self) -> bool {
        self.list.has_more() || !self.exhausted.get()
    }

    fn page_size(&self) -> usize {
        self.list.window().borrow().config().page_size()
    }

    fn set_state(&self, state: LoadState) {
        *self.state.borrow_mut() = state;
    }

    /// Refetch the first page and replace the collection with it. The window
    /// is reset right away, so a load-more still in flight is discarded.
    pub fn refresh(&self) -> LocalBoxFuture<'static, Result<usize, SyncError>> {
        if self.refreshing.replace(true) {
            return future::ready(Err(SyncError::LoadInProgress)).boxed_local();
        }
        self.list.reset();
        self.set_state(LoadState::Loading);

        let feed = self.clone();
        let limit = self.page_size();
        async move {
            let result = feed.pages.fetch_page(0, limit).await;
            feed.refreshing.set(false);
            match result {
                Ok(items) => {
                    let count = items.len();
                    feed.exhausted.set(count < limit);
                    feed.server_offset.set(count);
                    feed.list.source().replace_all(items);
                    feed.list.reset();
                    feed.set_state(LoadState::Loaded);
                    log::info!("Refreshed feed with {} items", count);
                    Ok(count)
                }
                Err(e) => {
                    log::error!("Failed to refresh feed: {:#}", e);
                    feed.set_state(LoadState::Failed(format!("{:#}", e)));
                    Err(SyncError::load_failed(e))
                }
            }
        }
        .boxed_local()
    }

    /// Show one more page, fetching it first when the window has reached the
    /// end of the fetched items. Resolves to whether the window advanced; a
    /// failed fetch leaves the window where it was.
    pub fn load_more(&self) -> LocalBoxFuture<'static, Result<bool, SyncError>> {
        self.list.sync();
        if self.list.has_more() {
            return self.list.load_more().map(Ok::<bool, SyncError>).boxed_local();
        }
        if self.exhausted.get() {
            return future::ready(Ok(false)).boxed_local();
        }

        let Some(ticket) = self.list.window().borrow_mut().begin_remote_load() else {
            return future::ready(Ok(false)).boxed_local();
        };
        let previous = self.state();
        self.set_state(LoadState::Loading);

        let feed = self.clone();
        let offset = self.server_offset.get();
        let limit = self.page_size();
        async move {
            let result = feed.pages.fetch_page(offset, limit).await;

            if !feed.list.window().borrow().is_current(ticket) {
                log::debug!("Discarding page at offset {}, feed was reset", offset);
                // a refresh in flight owns the state
                if !feed.refreshing.get() && feed.state().is_loading() {
                    feed.set_state(previous);
                }
                return Ok(false);
            }

            match result {
                Ok(items) => {
                    let fetched = items.len();
                    feed.exhausted.set(fetched < limit);
                    feed.server_offset.set(offset + fetched);
                    let added = feed.list.source().append_page(items);
                    let total = feed.list.filtered_len();
                    let advanced = {
                        let mut window = feed.list.window().borrow_mut();
                        window.grow_total(total);
                        window.finish_load_more(ticket)
                    };
                    feed.set_state(LoadState::Loaded);
                    log::debug!("Fetched {} items at offset {} ({} new)", fetched, offset, added);
                    Ok(advanced)
                }
                Err(e) => {
                    log::warn!("Failed to load page at offset {}: {:#}", offset, e);
                    feed.list.window().borrow_mut().abort_load_more(ticket);
                    feed.set_state(LoadState::Failed(format!("{:#}", e)));
                    Err(SyncError::load_failed(e))
                }
            }
        }
        .boxed_local()
    }
}
