//! Actor-scoped cache of resolved formula targets.

use std::collections::HashMap;

use wb_core::{ActorId, DocumentRef, FormulaEntry, ItemData};

use crate::collaborators::ItemDefinitionFetch;
use crate::error::EngineResult;

/// Memoized catalog lookups, keyed by actor and catalog address.
///
/// Owned by the session that renders an actor's formula book. Call
/// [`FormulaCache::clear`] or [`FormulaCache::invalidate_actor`] whenever
/// that view is rebuilt.
#[derive(Debug, Default)]
pub struct FormulaCache {
    entries: HashMap<(ActorId, DocumentRef), Option<ItemData>>,
}

impl FormulaCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The definition at `target`, fetched once per actor.
    ///
    /// Misses are cached too, so an unresolvable address is only fetched once.
    pub async fn definition(
        &mut self,
        actor: ActorId,
        target: &DocumentRef,
        fetch: &dyn ItemDefinitionFetch,
    ) -> EngineResult<Option<ItemData>> {
        let key = (actor, target.clone());
        if let Some(cached) = self.entries.get(&key) {
            tracing::trace!(%actor, %target, "formula cache hit");
            return Ok(cached.clone());
        }
        let fetched = fetch.fetch(target).await?;
        self.entries.insert(key, fetched.clone());
        Ok(fetched)
    }

    /// A formula entry for the item at `target`, or `None` if it cannot be
    /// resolved.
    pub async fn resolve(
        &mut self,
        actor: ActorId,
        target: &DocumentRef,
        fetch: &dyn ItemDefinitionFetch,
    ) -> EngineResult<Option<FormulaEntry>> {
        Ok(self
            .definition(actor, target, fetch)
            .await?
            .map(|data| FormulaEntry {
                target: target.clone(),
                name: data.name,
                level: data.level,
            }))
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop one actor's entries.
    pub fn invalidate_actor(&mut self, actor: ActorId) {
        self.entries.retain(|(owner, _), _| *owner != actor);
    }

    /// Number of cached lookups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
