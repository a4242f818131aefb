//! Seams to the networking layer
//!
//! The list core never sees HTTP status codes, auth headers or JSON shapes;
//! implementations translate those into items or an error before returning.
//! Implementations that need credentials are constructed with a
//! `SessionContext` instead of reading global state.

use async_trait::async_trait;

use crate::utils::identity::Identified;

/// Supplies pages of server truth
#[async_trait(?Send)]
pub trait PageSource<T> {
    /// Up to `limit` items starting at `offset`, in server order. A page
    /// shorter than `limit` means the source is exhausted.
    async fn fetch_page(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<T>>;
}

/// Performs state changes server side and returns the authoritative entity
#[async_trait(?Send)]
pub trait MutationSink<T: Identified> {
    /// What the server is asked to do (join, follow, like, create, delete...)
    type Intent: 'static;

    async fn submit(&self, entity_id: &T::Id, intent: Self::Intent) -> anyhow::Result<T>;
}
