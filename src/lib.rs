//! Client-side list sync core
//!
//! Windowed pagination, debounced search, local insertion overlays and
//! optimistic mutations for list screens, plus Dioxus hooks exposing them.

// Modules
pub mod hooks;
pub mod services;
pub mod stores;
pub mod utils;

pub use services::{MutationSink, PageSource};
pub use stores::{
    ListPage, ListSettings, LoadState, LocalOverlay, MutationCoordinator, PaginationWindow, RemoteFeed,
    SearchableList, SessionContext, SharedCollection, SyncError, WindowConfig, WindowedList,
};
pub use utils::{Debouncer, DisposalToken, Identified, Item, ItemId};

/// Install the panic hook and console logger. Call once at startup; a no-op
/// outside the browser, where the embedding binary picks its own logger.
pub fn init_logging(level: log::Level) {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(level));
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = level;

    log::info!("List sync core ready");
}
