//! use_optimistic_mutation hook - status tracking for coordinator mutations
//!
//! The coordinator has already applied the optimistic change by the time a
//! mutation future reaches this hook; the hook re-renders the list right away,
//! reports Pending/Success/Error, and re-renders again once the server
//! answered (reconciled or rolled back). Unmounting drops the spawned task,
//! which rolls the mutation back.

use dioxus::prelude::*;
use futures::future::LocalBoxFuture;
use std::time::Duration;

use crate::stores::errors::SyncError;
use crate::utils::runtime::sleep;

/// State of the mutation action
#[derive(Clone, Debug, PartialEq)]
pub enum MutationState {
    /// No action in progress
    Idle,
    /// Waiting for the server
    Pending,
    /// Server confirmed
    Success,
    /// Server rejected; the change was rolled back
    Error(String),
}

/// Return type for the use_optimistic_mutation hook
#[derive(Clone, Copy)]
pub struct UseOptimisticMutation {
    pub state: Signal<MutationState>,
    on_change: Callback<()>,
}

impl PartialEq for UseOptimisticMutation {
    fn eq(&self, other: &Self) -> bool {
        *self.state.read() == *other.state.read()
    }
}

impl UseOptimisticMutation {
    /// Track a mutation returned by `MutationCoordinator::{toggle,create,delete,mutate}`
    pub fn track<T: 'static>(&self, mutation: LocalBoxFuture<'static, Result<T, SyncError>>) {
        let mut state = self.state;
        let on_change = self.on_change;

        let previous = state.peek().clone();
        state.set(MutationState::Pending);
        on_change.call(());

        spawn(async move {
            match mutation.await {
                Ok(_) => {
                    state.set(MutationState::Success);
                    on_change.call(());

                    // Reset to Idle after a short delay
                    sleep(Duration::from_millis(500)).await;
                    if *state.peek() == MutationState::Success {
                        state.set(MutationState::Idle);
                    }
                }
                Err(SyncError::MutationInProgress { entity }) => {
                    log::debug!("Ignoring repeated tap on {}", entity);
                    state.set(previous);
                }
                Err(e) => {
                    log::error!("Mutation failed: {}", e);
                    state.set(MutationState::Error(e.to_string()));
                    on_change.call(());
                }
            }
        });
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.state.read(), MutationState::Pending)
    }
}

/// Hook for running optimistic mutations from a screen
///
/// `on_change` runs whenever the collection may have changed (optimistic
/// apply, reconcile, rollback); list screens pass their `sync` callback.
///
/// # Example
/// ```rust,ignore
/// let list = use_paginated_list(move || WindowedList::new(groups.clone(), config));
/// let join = use_optimistic_mutation(move |_| list.sync.call(()));
///
/// button {
///     disabled: join.is_pending(),
///     onclick: move |_| join.track(coordinator.toggle(id.clone(), Intent::Join, |g| g.toggle_bool("joined"))),
///     "Join"
/// }
/// ```
pub fn use_optimistic_mutation(on_change: impl FnMut(()) + 'static) -> UseOptimisticMutation {
    let state = use_signal(|| MutationState::Idle);
    let on_change = use_callback(on_change);

    UseOptimisticMutation { state, on_change }
}
