//! Interfaces of the external systems the engine calls into.
//!
//! The engine never owns item storage, catalogs, or settings. Hosts
//! implement these traits; [`crate::memory`] has in-memory versions.

use async_trait::async_trait;
use serde_json::Value;
use wb_core::{ActorId, DocumentRef, IndexEntry, ItemData, ItemId};

use crate::consequence::{ActorChange, ItemUpdate};
use crate::error::CollaboratorError;

/// Predicate applied to index entries during a search.
pub type IndexFilter<'a> = &'a (dyn Fn(&IndexEntry) -> bool + Send + Sync);

/// Searches one or more named item indexes.
#[async_trait]
pub trait ItemIndexSearch: Send + Sync {
    /// Return the entries of the named pools that satisfy `filter`.
    async fn search(
        &self,
        pools: &[String],
        filter: IndexFilter<'_>,
    ) -> Result<Vec<IndexEntry>, CollaboratorError>;
}

/// Fetches full item definitions by catalog address.
#[async_trait]
pub trait ItemDefinitionFetch: Send + Sync {
    /// The definition stored at `id`, or `None` if nothing is there.
    async fn fetch(&self, id: &DocumentRef) -> Result<Option<ItemData>, CollaboratorError>;
}

/// Applies consequences to an actor's documents. Each call may fail
/// independently and must leave already-applied calls in place.
#[async_trait]
pub trait DocumentPersistence: Send + Sync {
    /// Create items in the actor's inventory and return their new IDs.
    async fn create_items(
        &self,
        actor: ActorId,
        items: &[ItemData],
    ) -> Result<Vec<ItemId>, CollaboratorError>;

    /// Apply item updates.
    async fn update_items(
        &self,
        actor: ActorId,
        updates: &[ItemUpdate],
    ) -> Result<(), CollaboratorError>;

    /// Delete items from the actor's inventory.
    async fn delete_items(&self, actor: ActorId, items: &[ItemId])
    -> Result<(), CollaboratorError>;

    /// Apply changes to the actor itself.
    async fn update_actor(
        &self,
        actor: ActorId,
        changes: &[ActorChange],
    ) -> Result<(), CollaboratorError>;
}

/// Read-only access to settings. Values may change between calls.
pub trait ConfigurationProvider: Send + Sync {
    /// The value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;
}
