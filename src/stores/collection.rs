//! Shared list collection
//!
//! The screen owns one `SharedCollection`; the window, the local overlay and
//! the mutation coordinator all hold clones of the same handle so "what is
//! mutated" and "what is windowed" can never diverge.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::utils::identity::Identified;

pub struct SharedCollection<T> {
    items: Rc<RefCell<Vec<T>>>,
    version: Rc<Cell<u64>>,
}

impl<T> Clone for SharedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
            version: Rc::clone(&self.version),
        }
    }
}

impl<T> Default for SharedCollection<T> {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T> SharedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
            version: Rc::new(Cell::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Bumped on every write; lets screens skip re-deriving unchanged views
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Read access without cloning
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.borrow())
    }

    /// Write access. The closure must not touch this collection again.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = f(&mut self.items.borrow_mut());
        self.version.set(self.version.get().wrapping_add(1));
        result
    }

    pub fn same_as(&self, other: &SharedCollection<T>) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl<T: Clone> SharedCollection<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    /// Clone the entries matching `predicate`, in collection order
    pub fn filtered(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.items
            .borrow()
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }
}

impl<T: Identified + Clone> SharedCollection<T> {
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.borrow().iter().position(|item| &item.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.items.borrow().iter().find(|item| &item.id() == id).cloned()
    }

    /// Apply `f` to the entry with `id`; false when it is not in the list
    pub fn update_item(&self, id: &T::Id, f: impl FnOnce(&mut T)) -> bool {
        self.update(|items| match items.iter_mut().find(|item| &item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        })
    }

    /// Replace everything with a fresh server list (refetch)
    pub fn replace_all(&self, items: Vec<T>) {
        self.update(|current| *current = dedup_by_id(items));
    }

    /// Append a server page in server order, skipping ids already present.
    /// Returns how many entries were actually added.
    pub fn append_page(&self, page: Vec<T>) -> usize {
        self.update(|items| {
            let mut seen: HashSet<T::Id> = items.iter().map(|item| item.id()).collect();
            let before = items.len();
            for item in page {
                if seen.insert(item.id()) {
                    items.push(item);
                }
            }
            items.len() - before
        })
    }

    /// Insert ahead of everything else (most-recent-first lists).
    /// An existing entry with the same id is replaced in place instead.
    pub fn push_front(&self, item: T) {
        self.update(|items| {
            let id = item.id();
            match items.iter_mut().find(|existing| existing.id() == id) {
                Some(existing) => *existing = item,
                None => items.insert(0, item),
            }
        });
    }

    /// Insert at `index`, clamped to the current length
    pub fn insert(&self, index: usize, item: T) {
        self.update(|items| {
            let index = index.min(items.len());
            items.insert(index, item);
        });
    }

    pub fn remove(&self, id: &T::Id) -> Option<(usize, T)> {
        self.update(|items| {
            let index = items.iter().position(|item| &item.id() == id)?;
            Some((index, items.remove(index)))
        })
    }

    pub fn clear(&self) {
        self.update(Vec::clear);
    }
}

/// Keep the first occurrence of every id, preserving order
pub fn dedup_by_id<T: Identified>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.id())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::identity::{Item, ItemId};

    fn items(ids: &[i64]) -> Vec<Item> {
        ids.iter().map(|id| Item::new(*id)).collect()
    }

    fn ids(collection: &SharedCollection<Item>) -> Vec<ItemId> {
        collection.with(|items| items.iter().map(|item| item.id.clone()).collect())
    }

    #[test]
    fn test_clones_share_storage() {
        let owner = SharedCollection::from_vec(items(&[1, 2]));
        let window_view = owner.clone();

        owner.update_item(&ItemId::Num(1), |item| item.set("joined", true));

        assert_eq!(window_view.get(&ItemId::Num(1)).unwrap().get_bool("joined"), Some(true));
        assert!(owner.same_as(&window_view));
    }

    #[test]
    fn test_append_page_skips_known_ids() {
        let collection = SharedCollection::from_vec(items(&[1, 2, 3]));
        let added = collection.append_page(items(&[3, 4, 4, 5]));

        assert_eq!(added, 2);
        assert_eq!(ids(&collection), items(&[1, 2, 3, 4, 5]).into_iter().map(|i| i.id).collect::<Vec<_>>());
    }

    #[test]
    fn test_replace_all_dedups() {
        let collection = SharedCollection::from_vec(items(&[9]));
        collection.replace_all(items(&[1, 2, 1]));
        assert_eq!(collection.len(), 2);
        assert!(!collection.contains(&ItemId::Num(9)));
    }

    #[test]
    fn test_push_front_and_remove() {
        let collection = SharedCollection::from_vec(items(&[1, 2]));
        collection.push_front(Item::new(3));
        assert_eq!(collection.position(&ItemId::Num(3)), Some(0));

        collection.push_front(Item::new(2).with("text", "edited"));
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.get(&ItemId::Num(2)).unwrap().get_str("text"), Some("edited"));

        let (index, removed) = collection.remove(&ItemId::Num(1)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(removed.id, ItemId::Num(1));
        assert!(collection.remove(&ItemId::Num(1)).is_none());
    }

    #[test]
    fn test_version_bumps_on_write() {
        let collection = SharedCollection::from_vec(items(&[1]));
        let before = collection.version();
        collection.insert(10, Item::new(2));
        assert!(collection.version() > before);
        assert_eq!(collection.position(&ItemId::Num(2)), Some(1));
    }
}
