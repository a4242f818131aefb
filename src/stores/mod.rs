// List state
// Stores own the collections and the state machines screens render from

pub mod collection;
pub mod errors;
pub mod list_settings;
pub mod local_overlay;
pub mod mutations;
pub mod pagination;
pub mod remote_feed;
pub mod search;
pub mod session;
pub mod windowed_list;

pub use collection::SharedCollection;
pub use errors::SyncError;
pub use list_settings::ListSettings;
pub use local_overlay::{merge_local, LocalOverlay};
pub use mutations::{MutationCoordinator, MutationKind, MutationStatus, PendingMutation, Snapshot};
pub use pagination::{PaginationWindow, WindowConfig, WindowSnapshot};
pub use remote_feed::{LoadState, RemoteFeed};
pub use search::{Searchable, SearchableList};
pub use session::{Session, SessionContext};
pub use windowed_list::{ListPage, WindowedList};
