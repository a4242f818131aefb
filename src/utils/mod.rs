// Utility functions
// Identity, timers and debouncing shared by the stores

pub mod debounce;
pub mod identity;
pub mod runtime;

pub use debounce::{create_debounced, Debouncer};
pub use identity::{Identified, Item, ItemId};
pub use runtime::{sleep, spawn_local, DisposalToken};
