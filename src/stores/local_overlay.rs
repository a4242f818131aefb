//! Local insertion overlay - the user's own new items, shown immediately
//!
//! New comments and posts appear at the top of the list before the server
//! pages include them. Once a refetch brings the server version back, the
//! local copy is dropped so nothing renders twice.

use std::collections::HashSet;

use crate::stores::collection::SharedCollection;
use crate::utils::identity::Identified;

/// Local items (most-recent-first) ahead of the paginated items.
///
/// A local item whose id also appears in `paginated` is dropped in favour of
/// the server version; duplicate ids inside `local` keep the first (newest).
pub fn merge_local<T: Identified + Clone>(local: &[T], paginated: &[T]) -> Vec<T> {
    let server_ids: HashSet<T::Id> = paginated.iter().map(|item| item.id()).collect();
    let mut seen = HashSet::new();

    let mut merged: Vec<T> = local
        .iter()
        .filter(|item| {
            let id = item.id();
            !server_ids.contains(&id) && seen.insert(id)
        })
        .cloned()
        .collect();
    merged.extend(paginated.iter().cloned());
    merged
}

/// Store for locally created items of one list (e.g. the comments typed into
/// an open comment modal). Creates are routed through the mutation coordinator
/// over `collection()`, so a failed create disappears again.
pub struct LocalOverlay<T> {
    items: SharedCollection<T>,
}

impl<T> Clone for LocalOverlay<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for LocalOverlay<T> {
    fn default() -> Self {
        Self {
            items: SharedCollection::new(),
        }
    }
}

impl<T: Identified + Clone> LocalOverlay<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing collection, newest first
    pub fn collection(&self) -> SharedCollection<T> {
        self.items.clone()
    }

    /// Show a new local item ahead of everything else
    pub fn push(&self, item: T) {
        log::debug!("Adding local item {}", item.id());
        self.items.push_front(item);
    }

    pub fn remove(&self, id: &T::Id) -> Option<T> {
        log::debug!("Removing local item {}", id);
        self.items.remove(id).map(|(_, item)| item)
    }

    /// Forget every local item (the owning modal/screen closed)
    pub fn clear(&self) {
        self.items.clear();
    }

    pub fn items(&self) -> Vec<T> {
        self.items.snapshot()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn merge(&self, paginated: &[T]) -> Vec<T> {
        self.items.with(|local| merge_local(local, paginated))
    }

    /// Drop local items whose server version has arrived. Returns how many
    /// were pruned.
    pub fn prune_arrived(&self, server_items: &[T]) -> usize {
        let server_ids: HashSet<T::Id> = server_items.iter().map(|item| item.id()).collect();
        self.items.update(|local| {
            let before = local.len();
            local.retain(|item| !server_ids.contains(&item.id()));
            before - local.len()
        })
    }
}
