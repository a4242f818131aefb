//! Optimistic mutations - show the change now, reconcile when the server answers
//!
//! Every toggle (join, follow, like, bookmark), create (comment, post) and
//! delete goes through a `MutationCoordinator`:
//! - at most one mutation per entity is in flight; a second tap is rejected
//!   instead of queued
//! - the change is applied to the shared collection synchronously, before the
//!   returned future is even polled
//! - on success the server's version is reconciled into the collection
//! - on failure (or if the future is dropped) the entity is restored exactly
//!   to its pre-mutation snapshot

use chrono::{DateTime, Utc};
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use uuid::Uuid;

use crate::services::collaborators::MutationSink;
use crate::stores::collection::SharedCollection;
use crate::stores::errors::SyncError;
use crate::stores::list_settings::{ListSettings, DEFAULT_SETTLED_HISTORY};
use crate::stores::session::SessionContext;
use crate::utils::identity::Identified;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Toggle,
    Create,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationStatus {
    /// Applied locally, waiting for the server
    Applying,
    Committed,
    RolledBack,
}

/// Where an entity sat in the collection at some point in time
#[derive(Clone, Debug, PartialEq)]
pub enum Snapshot<T> {
    Absent,
    Present { index: usize, item: T },
}

impl<T> Snapshot<T> {
    pub fn item(&self) -> Option<&T> {
        match self {
            Self::Absent => None,
            Self::Present { item, .. } => Some(item),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PendingMutation<T: Identified> {
    pub mutation_id: Uuid,
    pub entity_id: T::Id,
    pub kind: MutationKind,
    pub prior_snapshot: Snapshot<T>,
    pub applied_snapshot: Snapshot<T>,
    pub status: MutationStatus,
    pub started_at: DateTime<Utc>,
    /// Failure shown to the user after a rollback
    pub error: Option<String>,
}

struct CoordinatorState<T: Identified> {
    in_flight: HashMap<T::Id, PendingMutation<T>>,
    settled: VecDeque<PendingMutation<T>>,
    history_limit: usize,
}

impl<T: Identified> CoordinatorState<T> {
    fn record_settled(&mut self, mutation: PendingMutation<T>) {
        if self.history_limit == 0 {
            return;
        }
        while self.settled.len() >= self.history_limit {
            self.settled.pop_front();
        }
        self.settled.push_back(mutation);
    }
}

pub struct MutationCoordinator<T: Identified, M> {
    collection: SharedCollection<T>,
    sink: Rc<M>,
    state: Rc<RefCell<CoordinatorState<T>>>,
    session: Option<SessionContext>,
}

impl<T: Identified, M> Clone for MutationCoordinator<T, M> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            sink: Rc::clone(&self.sink),
            state: Rc::clone(&self.state),
            session: self.session.clone(),
        }
    }
}

impl<T, M> MutationCoordinator<T, M>
where
    T: Identified + Clone + 'static,
    M: MutationSink<T> + 'static,
{
    pub fn new(collection: SharedCollection<T>, sink: Rc<M>) -> Self {
        Self {
            collection,
            sink,
            state: Rc::new(RefCell::new(CoordinatorState {
                in_flight: HashMap::new(),
                settled: VecDeque::new(),
                history_limit: DEFAULT_SETTLED_HISTORY,
            })),
            session: None,
        }
    }

    pub fn from_settings(collection: SharedCollection<T>, sink: Rc<M>, settings: &ListSettings) -> Self {
        Self::new(collection, sink).with_history_limit(settings.settled_history)
    }

    /// Reject every mutation while nobody is logged in
    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_history_limit(self, limit: usize) -> Self {
        self.state.borrow_mut().history_limit = limit;
        self
    }

    pub fn collection(&self) -> &SharedCollection<T> {
        &self.collection
    }

    // ============================================================================
    // Inspection
    // ============================================================================

    pub fn is_pending(&self, entity_id: &T::Id) -> bool {
        self.state.borrow().in_flight.contains_key(entity_id)
    }

    pub fn pending_ids(&self) -> Vec<T::Id> {
        self.state.borrow().in_flight.keys().cloned().collect()
    }

    pub fn pending(&self, entity_id: &T::Id) -> Option<PendingMutation<T>> {
        self.state.borrow().in_flight.get(entity_id).cloned()
    }

    /// Recently settled mutations, oldest first
    pub fn settled(&self) -> Vec<PendingMutation<T>> {
        self.state.borrow().settled.iter().cloned().collect()
    }

    /// Drain rolled-back mutations so the screen can show each failure once
    pub fn take_failures(&self) -> Vec<PendingMutation<T>> {
        let mut state = self.state.borrow_mut();
        let (failed, kept): (VecDeque<_>, VecDeque<_>) = state
            .settled
            .drain(..)
            .partition(|m| m.status == MutationStatus::RolledBack);
        state.settled = kept;
        failed.into_iter().collect()
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Apply `apply` to the collection now, submit `intent`, then reconcile
    /// or roll back. Resolves to the server's entity.
    ///
    /// Rejection (mutation already in flight, logged out) happens before
    /// anything is applied, and the returned future resolves to the error.
    pub fn mutate<A, R>(
        &self,
        entity_id: T::Id,
        kind: MutationKind,
        intent: M::Intent,
        apply: A,
        reconcile: R,
    ) -> LocalBoxFuture<'static, Result<T, SyncError>>
    where
        A: FnOnce(&mut Vec<T>),
        R: FnOnce(&mut Vec<T>, &T::Id, T) + 'static,
    {
        if let Err(e) = self.admit(&entity_id) {
            return future::ready(Err(e)).boxed_local();
        }

        let prior_snapshot = snapshot_of(&self.collection, &entity_id);
        self.collection.update(apply);
        let applied_snapshot = snapshot_of(&self.collection, &entity_id);

        let pending = PendingMutation {
            mutation_id: Uuid::new_v4(),
            entity_id: entity_id.clone(),
            kind,
            prior_snapshot,
            applied_snapshot,
            status: MutationStatus::Applying,
            started_at: Utc::now(),
            error: None,
        };
        log::debug!("Applied optimistic {:?} on {} ({})", kind, entity_id, pending.mutation_id);
        self.state
            .borrow_mut()
            .in_flight
            .insert(entity_id.clone(), pending);

        let mut guard = InFlight {
            collection: self.collection.clone(),
            state: Rc::clone(&self.state),
            entity_id,
            armed: true,
        };
        let sink = Rc::clone(&self.sink);

        async move {
            let result = sink.submit(&guard.entity_id, intent).await;
            match result {
                Ok(server_item) => {
                    guard.commit(server_item.clone(), reconcile);
                    Ok(server_item)
                }
                Err(e) => {
                    let err = SyncError::mutation_failed(&guard.entity_id, e);
                    guard.roll_back(err.to_string());
                    Err(err)
                }
            }
        }
        .boxed_local()
    }

    /// Flip state on an existing entity (join/follow/like/bookmark). The
    /// server's copy replaces the optimistic one on success.
    pub fn toggle<F>(
        &self,
        entity_id: T::Id,
        intent: M::Intent,
        apply: F,
    ) -> LocalBoxFuture<'static, Result<T, SyncError>>
    where
        F: FnOnce(&mut T),
    {
        if !self.is_pending(&entity_id) && !self.collection.contains(&entity_id) {
            return future::ready(Err(SyncError::EntityNotFound {
                entity: entity_id.to_string(),
            }))
            .boxed_local();
        }

        let target = entity_id.clone();
        self.mutate(
            entity_id,
            MutationKind::Toggle,
            intent,
            move |items| {
                if let Some(item) = items.iter_mut().find(|item| item.id() == target) {
                    apply(item);
                }
            },
            replace_entity,
        )
    }

    /// Show a locally built entity at the front right away. On success the
    /// placeholder is replaced by the server's entity (which may carry a new
    /// id); if a refetch already delivered that entity, the placeholder is
    /// dropped instead so it never renders twice.
    pub fn create(&self, item: T, intent: M::Intent) -> LocalBoxFuture<'static, Result<T, SyncError>> {
        let local_id = item.id();
        self.mutate(
            local_id.clone(),
            MutationKind::Create,
            intent,
            move |items| match items.iter_mut().find(|existing| existing.id() == local_id) {
                Some(existing) => *existing = item,
                None => items.insert(0, item),
            },
            reconcile_created,
        )
    }

    /// Hide the entity now; it comes back at its old position on failure
    pub fn delete(&self, entity_id: T::Id, intent: M::Intent) -> LocalBoxFuture<'static, Result<T, SyncError>> {
        if !self.is_pending(&entity_id) && !self.collection.contains(&entity_id) {
            return future::ready(Err(SyncError::EntityNotFound {
                entity: entity_id.to_string(),
            }))
            .boxed_local();
        }

        let target = entity_id.clone();
        self.mutate(
            entity_id,
            MutationKind::Delete,
            intent,
            move |items| items.retain(|item| item.id() != target),
            |_, _, _| {},
        )
    }

    fn admit(&self, entity_id: &T::Id) -> Result<(), SyncError> {
        if self.is_pending(entity_id) {
            log::debug!("Rejecting mutation on {}: already in progress", entity_id);
            return Err(SyncError::MutationInProgress {
                entity: entity_id.to_string(),
            });
        }
        if let Some(session) = &self.session {
            if !session.is_authenticated() {
                return Err(SyncError::NotAuthenticated);
            }
        }
        Ok(())
    }
}

/// Owns an in-flight mutation. Settling disarms it; dropping it armed (the
/// caller abandoned the future) rolls the change back.
struct InFlight<T: Identified + Clone> {
    collection: SharedCollection<T>,
    state: Rc<RefCell<CoordinatorState<T>>>,
    entity_id: T::Id,
    armed: bool,
}

impl<T: Identified + Clone> InFlight<T> {
    fn commit<R>(&mut self, server_item: T, reconcile: R)
    where
        R: FnOnce(&mut Vec<T>, &T::Id, T),
    {
        self.armed = false;
        let entity_id = self.entity_id.clone();
        self.collection
            .update(|items| reconcile(items, &entity_id, server_item));

        let mut state = self.state.borrow_mut();
        if let Some(mut mutation) = state.in_flight.remove(&entity_id) {
            mutation.status = MutationStatus::Committed;
            mutation.applied_snapshot = snapshot_of(&self.collection, &entity_id);
            log::info!("Committed {:?} on {}", mutation.kind, entity_id);
            state.record_settled(mutation);
        }
    }

    fn roll_back(&mut self, error: String) {
        self.armed = false;
        let Ok(mut state) = self.state.try_borrow_mut() else {
            log::error!("Could not roll back {}: coordinator state busy", self.entity_id);
            return;
        };
        let Some(mut mutation) = state.in_flight.remove(&self.entity_id) else {
            return;
        };

        restore(&self.collection, &self.entity_id, &mutation.prior_snapshot);
        log::error!("Rolled back {:?} on {}: {}", mutation.kind, self.entity_id, error);
        mutation.status = MutationStatus::RolledBack;
        mutation.error = Some(error);
        state.record_settled(mutation);
    }
}

impl<T: Identified + Clone> Drop for InFlight<T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;

        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        let Some(mut mutation) = state.in_flight.remove(&self.entity_id) else {
            return;
        };
        let error = SyncError::MutationAbandoned {
            entity: self.entity_id.to_string(),
        };
        log::warn!("{}", error);

        restore(&self.collection, &self.entity_id, &mutation.prior_snapshot);
        mutation.status = MutationStatus::RolledBack;
        mutation.error = Some(error.to_string());
        state.record_settled(mutation);
    }
}

fn snapshot_of<T: Identified + Clone>(collection: &SharedCollection<T>, entity_id: &T::Id) -> Snapshot<T> {
    collection.with(|items| {
        items
            .iter()
            .position(|item| &item.id() == entity_id)
            .map(|index| Snapshot::Present {
                index,
                item: items[index].clone(),
            })
            .unwrap_or(Snapshot::Absent)
    })
}

/// Put the entity back exactly as `prior` recorded it
fn restore<T: Identified + Clone>(collection: &SharedCollection<T>, entity_id: &T::Id, prior: &Snapshot<T>) {
    restore_owned(collection, entity_id, prior.clone());
}

fn restore_owned<T: Identified>(collection: &SharedCollection<T>, entity_id: &T::Id, prior: Snapshot<T>) {
    collection.update(|items| {
        let current = items.iter().position(|item| &item.id() == entity_id);
        match (prior, current) {
            (Snapshot::Absent, Some(index)) => {
                items.remove(index);
            }
            (Snapshot::Absent, None) => {}
            (Snapshot::Present { index, item }, Some(current)) if index == current => {
                items[current] = item;
            }
            (Snapshot::Present { index, item }, Some(current)) => {
                items.remove(current);
                let index = index.min(items.len());
                items.insert(index, item);
            }
            (Snapshot::Present { index, item }, None) => {
                let index = index.min(items.len());
                items.insert(index, item);
            }
        }
    });
}

/// Reconcile step for toggles: the server copy replaces the optimistic one
pub fn replace_entity<T: Identified>(items: &mut Vec<T>, entity_id: &T::Id, server_item: T) {
    if let Some(item) = items.iter_mut().find(|item| &item.id() == entity_id) {
        *item = server_item;
    }
}

/// Reconcile step for creates
pub fn reconcile_created<T: Identified>(items: &mut Vec<T>, local_id: &T::Id, server_item: T) {
    let server_id = server_item.id();
    let local_pos = items.iter().position(|item| &item.id() == local_id);
    let server_pos = items.iter().position(|item| item.id() == server_id);

    match (local_pos, server_pos) {
        (Some(local), Some(server)) if local != server => {
            items[server] = server_item;
            items.remove(local);
        }
        (Some(local), _) => items[local] = server_item,
        (None, Some(server)) => items[server] = server_item,
        (None, None) => {
            log::debug!("Placeholder {} was cleared before the server confirmed it", local_id);
        }
    }
}
