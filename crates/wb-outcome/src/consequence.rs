//! Consequence descriptors and their application.
//!
//! A resolver never mutates documents. It returns a [`ConsequenceDescriptor`]
//! listing what to create, update, and delete; [`apply_consequence`] hands
//! those lists to the persistence layer one stage at a time.

use serde::{Deserialize, Serialize};
use wb_core::{ActorId, FormulaEntry, IdentificationState, ItemData, ItemId, RetryMarker, RuneState};

use crate::collaborators::DocumentPersistence;
use crate::consumption::ConsumptionResult;
use crate::degree::DegreeOfSuccess;
use crate::error::{EngineError, EngineResult, Stage};

/// One change to an existing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field", content = "value")]
pub enum ItemChange {
    /// Set the stack size.
    Quantity(u32),
    /// Replace the identification state.
    Identification(IdentificationState),
    /// Replace the rune configuration.
    Runes(RuneState),
}

/// Changes to one existing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    /// The item to change.
    pub item: ItemId,
    /// Changes, applied in order.
    pub changes: Vec<ItemChange>,
}

/// One change to the acting actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field", content = "value")]
pub enum ActorChange {
    /// Replace the known formula list (already in book order).
    KnownFormulas(Vec<FormulaEntry>),
}

/// The complete result of a resolution, ready for persistence and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceDescriptor {
    /// The degree of success that was actually applied (after any downgrade).
    pub degree: DegreeOfSuccess,
    /// Items to add to the actor's inventory.
    pub items_to_create: Vec<ItemData>,
    /// Changes to existing items.
    pub items_to_update: Vec<ItemUpdate>,
    /// Items to remove.
    pub items_to_delete: Vec<ItemId>,
    /// Changes to the actor.
    pub actor_changes: Vec<ActorChange>,
    /// Retry lockout recorded by a failed identification.
    pub retry_lockout: Option<RetryMarker>,
    /// Player-facing description of what happened.
    pub narrative: String,
    /// Game-master-only description, when the player must not see the truth.
    pub gm_narrative: Option<String>,
}

impl ConsequenceDescriptor {
    /// An empty consequence for `degree`.
    pub fn new(degree: DegreeOfSuccess) -> Self {
        Self {
            degree,
            items_to_create: Vec::new(),
            items_to_update: Vec::new(),
            items_to_delete: Vec::new(),
            actor_changes: Vec::new(),
            retry_lockout: None,
            narrative: String::new(),
            gm_narrative: None,
        }
    }

    /// Returns true if applying this consequence would change nothing.
    pub fn is_noop(&self) -> bool {
        self.items_to_create.is_empty()
            && self.items_to_update.is_empty()
            && self.items_to_delete.is_empty()
            && self.actor_changes.is_empty()
    }

    /// Queue a new item.
    pub fn create(&mut self, item: ItemData) {
        self.items_to_create.push(item);
    }

    /// Queue a change to `item`, merging with earlier changes to the same item.
    pub fn update(&mut self, item: ItemId, change: ItemChange) {
        match self.items_to_update.iter_mut().find(|u| u.item == item) {
            Some(update) => update.changes.push(change),
            None => self.items_to_update.push(ItemUpdate {
                item,
                changes: vec![change],
            }),
        }
    }

    /// Queue a deletion. Drops any pending updates to the same item.
    pub fn delete(&mut self, item: ItemId) {
        self.items_to_update.retain(|u| u.item != item);
        if !self.items_to_delete.contains(&item) {
            self.items_to_delete.push(item);
        }
    }

    /// Use up one unit of a stack of `quantity`: decrement, or delete the last one.
    pub fn use_one(&mut self, item: ItemId, quantity: u32) {
        if quantity > 1 {
            self.update(item, ItemChange::Quantity(quantity - 1));
        } else {
            self.delete(item);
        }
    }

    /// Queue the inventory changes for consumed materials: the rest of the
    /// stack, or a deletion once it is empty.
    pub fn apply_consumption(&mut self, consumption: &ConsumptionResult) {
        for used in &consumption.per_material {
            if used.is_exhausted() {
                self.delete(used.item);
            } else if used.consumed > 0 {
                self.update(used.item, ItemChange::Quantity(used.remaining()));
            }
        }
    }

    /// Append a sentence to the player-facing narrative.
    pub fn narrate(&mut self, sentence: impl AsRef<str>) {
        if !self.narrative.is_empty() {
            self.narrative.push(' ');
        }
        self.narrative.push_str(sentence.as_ref());
    }
}

/// A stage that the persistence layer rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    /// The stage.
    pub stage: Stage,
    /// The collaborator's message.
    pub message: String,
}

/// What happened when a consequence was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// IDs of items created.
    pub created: Vec<ItemId>,
    /// Stages that completed.
    pub applied: Vec<Stage>,
    /// The stage that failed, if any.
    pub failed: Option<StageFailure>,
    /// Stages not attempted because an earlier one failed.
    pub skipped: Vec<Stage>,
}

impl ApplyReport {
    /// Returns true if every non-empty stage completed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }

    /// `Ok` with the created IDs, or the failed stage as [`EngineError::Persistence`].
    pub fn into_result(self) -> EngineResult<Vec<ItemId>> {
        match self.failed {
            None => Ok(self.created),
            Some(StageFailure { stage, message }) => {
                Err(EngineError::Persistence { stage, message })
            }
        }
    }
}

/// Apply `consequence` for `actor`: create, then update, then delete, then
/// actor changes. Empty stages are skipped. The first failing stage stops
/// the sequence; earlier stages stay applied and later ones are reported
/// as skipped.
pub async fn apply_consequence(
    persistence: &dyn DocumentPersistence,
    actor: ActorId,
    consequence: &ConsequenceDescriptor,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut pending = Vec::new();
    if !consequence.items_to_create.is_empty() {
        pending.push(Stage::Create);
    }
    if !consequence.items_to_update.is_empty() {
        pending.push(Stage::Update);
    }
    if !consequence.items_to_delete.is_empty() {
        pending.push(Stage::Delete);
    }
    if !consequence.actor_changes.is_empty() {
        pending.push(Stage::Actor);
    }

    let mut stages = pending.into_iter();
    for stage in stages.by_ref() {
        let outcome = match stage {
            Stage::Create => persistence
                .create_items(actor, &consequence.items_to_create)
                .await
                .map(|ids| report.created = ids),
            Stage::Update => {
                persistence
                    .update_items(actor, &consequence.items_to_update)
                    .await
            }
            Stage::Delete => {
                persistence
                    .delete_items(actor, &consequence.items_to_delete)
                    .await
            }
            Stage::Actor => {
                persistence
                    .update_actor(actor, &consequence.actor_changes)
                    .await
            }
        };
        match outcome {
            Ok(()) => report.applied.push(stage),
            Err(e) => {
                tracing::warn!(%actor, %stage, error = %e, "persistence stage failed");
                report.failed = Some(StageFailure {
                    stage,
                    message: e.to_string(),
                });
                break;
            }
        }
    }
    report.skipped = stages.collect();
    report
}

#[cfg(test)]
mod tests {
    use wb_core::ItemKind;

    use super::*;
    use crate::consumption::MaterialUse;
    use crate::memory::MemoryPersistence;

    fn sample() -> ConsequenceDescriptor {
        let mut c = ConsequenceDescriptor::new(DegreeOfSuccess::Success);
        c.create(ItemData::new("Healing Potion", ItemKind::Consumable));
        c.update(ItemId::new(), ItemChange::Quantity(2));
        c.delete(ItemId::new());
        c
    }

    #[test]
    fn update_merges_changes_per_item() {
        let id = ItemId::new();
        let mut c = ConsequenceDescriptor::new(DegreeOfSuccess::Success);
        c.update(id, ItemChange::Quantity(3));
        c.update(id, ItemChange::Runes(RuneState::default()));
        assert_eq!(c.items_to_update.len(), 1);
        assert_eq!(c.items_to_update[0].changes.len(), 2);
    }

    #[test]
    fn delete_supersedes_update() {
        let id = ItemId::new();
        let mut c = ConsequenceDescriptor::new(DegreeOfSuccess::Failure);
        c.update(id, ItemChange::Quantity(3));
        c.delete(id);
        c.delete(id);
        assert!(c.items_to_update.is_empty());
        assert_eq!(c.items_to_delete, vec![id]);
    }

    #[test]
    fn use_one_decrements_or_deletes() {
        let stack = ItemId::new();
        let single = ItemId::new();
        let mut c = ConsequenceDescriptor::new(DegreeOfSuccess::Success);
        c.use_one(stack, 3);
        c.use_one(single, 1);
        assert_eq!(c.items_to_update[0].changes, vec![ItemChange::Quantity(2)]);
        assert_eq!(c.items_to_delete, vec![single]);
    }

    #[test]
    fn consumption_becomes_updates_and_deletes() {
        let gone = ItemId::new();
        let partial = ItemId::new();
        let untouched = ItemId::new();
        let consumption = ConsumptionResult {
            per_material: vec![
                MaterialUse { item: gone, quantity: 2, stack: 2, consumed: 2 },
                MaterialUse { item: partial, quantity: 5, stack: 5, consumed: 3 },
                MaterialUse { item: untouched, quantity: 4, stack: 4, consumed: 0 },
            ],
            total_consumed: 5,
            total_saved: 6,
        };
        let mut c = ConsequenceDescriptor::new(DegreeOfSuccess::Failure);
        c.apply_consumption(&consumption);
        assert_eq!(c.items_to_delete, vec![gone]);
        assert_eq!(c.items_to_update.len(), 1);
        assert_eq!(c.items_to_update[0].item, partial);
        assert_eq!(c.items_to_update[0].changes, vec![ItemChange::Quantity(2)]);
    }

    #[test]
    fn consumption_from_part_of_a_stack_keeps_the_rest() {
        let drawn = ItemId::new();
        let emptied = ItemId::new();
        let consumption = ConsumptionResult {
            per_material: vec![
                MaterialUse { item: drawn, quantity: 4, stack: 10, consumed: 4 },
                MaterialUse { item: emptied, quantity: 3, stack: 3, consumed: 3 },
            ],
            total_consumed: 7,
            total_saved: 0,
        };
        let mut c = ConsequenceDescriptor::new(DegreeOfSuccess::Success);
        c.apply_consumption(&consumption);
        assert_eq!(c.items_to_delete, vec![emptied]);
        assert_eq!(c.items_to_update[0].item, drawn);
        assert_eq!(c.items_to_update[0].changes, vec![ItemChange::Quantity(6)]);
    }

    #[test]
    fn narrate_joins_sentences() {
        let mut c = ConsequenceDescriptor::new(DegreeOfSuccess::Success);
        c.narrate("First.");
        c.narrate("Second.");
        assert_eq!(c.narrative, "First. Second.");
    }

    #[tokio::test]
    async fn apply_runs_all_stages() {
        let store = MemoryPersistence::new();
        let actor = ActorId::new();
        let report = apply_consequence(&store, actor, &sample()).await;
        assert!(report.is_complete());
        assert_eq!(report.applied, vec![Stage::Create, Stage::Update, Stage::Delete]);
        assert_eq!(report.created.len(), 1);
        assert_eq!(store.calls().len(), 3);
    }

    #[tokio::test]
    async fn failing_stage_stops_later_stages() {
        let store = MemoryPersistence::new().failing_on(Stage::Update);
        let report = apply_consequence(&store, ActorId::new(), &sample()).await;
        assert_eq!(report.applied, vec![Stage::Create]);
        assert_eq!(report.failed.as_ref().map(|f| f.stage), Some(Stage::Update));
        assert_eq!(report.skipped, vec![Stage::Delete]);
        assert!(matches!(
            report.into_result(),
            Err(EngineError::Persistence { stage: Stage::Update, .. })
        ));
    }

    #[tokio::test]
    async fn empty_consequence_touches_nothing() {
        let store = MemoryPersistence::new();
        let c = ConsequenceDescriptor::new(DegreeOfSuccess::Success);
        assert!(c.is_noop());
        let report = apply_consequence(&store, ActorId::new(), &c).await;
        assert!(report.applied.is_empty());
        assert!(store.calls().is_empty());
    }
}
