//! In-memory collaborators.
//!
//! Useful for hosts without their own storage (the `wb` CLI) and for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use wb_core::{ActorId, DocumentRef, IndexEntry, ItemData, ItemId};

use crate::collaborators::{
    ConfigurationProvider, DocumentPersistence, IndexFilter, ItemDefinitionFetch, ItemIndexSearch,
};
use crate::consequence::{ActorChange, ItemUpdate};
use crate::error::{CollaboratorError, Stage};

/// Named pools of item definitions.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    pools: BTreeMap<String, Vec<DocumentRef>>,
    definitions: HashMap<DocumentRef, ItemData>,
}

impl MemoryCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition to `pool` under `id`.
    pub fn insert(&mut self, pool: &str, id: DocumentRef, data: ItemData) {
        self.pools.entry(pool.to_string()).or_default().push(id.clone());
        self.definitions.insert(id, data);
    }

    /// Builder form of [`MemoryCatalog::insert`].
    pub fn with(mut self, pool: &str, id: &str, data: ItemData) -> Self {
        self.insert(pool, DocumentRef::new(id), data);
        self
    }

    /// Number of definitions across all pools.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the catalog holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[async_trait]
impl ItemIndexSearch for MemoryCatalog {
    async fn search(
        &self,
        pools: &[String],
        filter: IndexFilter<'_>,
    ) -> Result<Vec<IndexEntry>, CollaboratorError> {
        let mut entries = Vec::new();
        for pool in pools {
            let Some(ids) = self.pools.get(pool) else {
                continue;
            };
            for id in ids {
                if let Some(data) = self.definitions.get(id) {
                    let entry = IndexEntry::for_definition(id.clone(), data);
                    if filter(&entry) {
                        entries.push(entry);
                    }
                }
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl ItemDefinitionFetch for MemoryCatalog {
    async fn fetch(&self, id: &DocumentRef) -> Result<Option<ItemData>, CollaboratorError> {
        Ok(self.definitions.get(id).cloned())
    }
}

/// Settings held in a map.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    values: HashMap<String, Value>,
}

impl MemoryConfig {
    /// An empty settings map; every key falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings from a JSON object whose keys are setting names.
    pub fn from_json(value: Value) -> Result<Self, CollaboratorError> {
        match value {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            other => Err(CollaboratorError(format!(
                "settings must be a JSON object, got {other}"
            ))),
        }
    }

    /// Store a setting.
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// Builder form of [`MemoryConfig::set`].
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }
}

impl ConfigurationProvider for MemoryConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// A persistence call recorded by [`MemoryPersistence`].
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceCall {
    /// Items created.
    Create(ActorId, Vec<ItemData>),
    /// Items updated.
    Update(ActorId, Vec<ItemUpdate>),
    /// Items deleted.
    Delete(ActorId, Vec<ItemId>),
    /// Actor changed.
    Actor(ActorId, Vec<ActorChange>),
}

/// Records persistence calls, optionally rejecting one stage.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    calls: Mutex<Vec<PersistenceCall>>,
    fail_on: Option<Stage>,
}

impl MemoryPersistence {
    /// A store that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every call of `stage`.
    pub fn failing_on(mut self, stage: Stage) -> Self {
        self.fail_on = Some(stage);
        self
    }

    /// Calls accepted so far.
    pub fn calls(&self) -> Vec<PersistenceCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, stage: Stage, call: PersistenceCall) -> Result<(), CollaboratorError> {
        if self.fail_on == Some(stage) {
            return Err(CollaboratorError(format!("{stage} rejected")));
        }
        self.calls
            .lock()
            .map_err(|_| CollaboratorError("store lock poisoned".to_string()))?
            .push(call);
        Ok(())
    }
}

#[async_trait]
impl DocumentPersistence for MemoryPersistence {
    async fn create_items(
        &self,
        actor: ActorId,
        items: &[ItemData],
    ) -> Result<Vec<ItemId>, CollaboratorError> {
        self.record(Stage::Create, PersistenceCall::Create(actor, items.to_vec()))?;
        Ok(items.iter().map(|_| ItemId::new()).collect())
    }

    async fn update_items(
        &self,
        actor: ActorId,
        updates: &[ItemUpdate],
    ) -> Result<(), CollaboratorError> {
        self.record(Stage::Update, PersistenceCall::Update(actor, updates.to_vec()))
    }

    async fn delete_items(
        &self,
        actor: ActorId,
        items: &[ItemId],
    ) -> Result<(), CollaboratorError> {
        self.record(Stage::Delete, PersistenceCall::Delete(actor, items.to_vec()))
    }

    async fn update_actor(
        &self,
        actor: ActorId,
        changes: &[ActorChange],
    ) -> Result<(), CollaboratorError> {
        self.record(Stage::Actor, PersistenceCall::Actor(actor, changes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wb_core::ItemKind;

    use super::*;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with(
                "equipment",
                "eq.longsword",
                ItemData::new("Longsword", ItemKind::Weapon).with_level(0),
            )
            .with(
                "equipment",
                "eq.rope",
                ItemData::new("Rope", ItemKind::Equipment),
            )
            .with(
                "homebrew",
                "hb.blade",
                ItemData::new("Sun Blade", ItemKind::Weapon).with_level(6),
            )
    }

    #[tokio::test]
    async fn search_respects_pools_and_filter() {
        let c = catalog();
        let weapons = |e: &IndexEntry| e.kind == ItemKind::Weapon;
        let found = c
            .search(&["equipment".to_string()], &weapons)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Longsword");

        let both = c
            .search(
                &["equipment".to_string(), "homebrew".to_string(), "missing".to_string()],
                &weapons,
            )
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn fetch_by_ref() {
        let c = catalog();
        let found = c.fetch(&DocumentRef::new("eq.rope")).await.unwrap();
        assert_eq!(found.map(|d| d.name), Some("Rope".to_string()));
        assert!(c.fetch(&DocumentRef::new("nope")).await.unwrap().is_none());
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn config_from_json_object() {
        let config = MemoryConfig::from_json(json!({"consumption.chance": 0.3})).unwrap();
        assert_eq!(config.get("consumption.chance"), Some(json!(0.3)));
        assert!(config.get("dc.table").is_none());
        assert!(MemoryConfig::from_json(json!([1, 2])).is_err());
    }
}
