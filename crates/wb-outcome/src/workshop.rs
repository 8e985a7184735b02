//! A session facade over the resolvers.
//!
//! `Workshop` owns the catalog, the settings source, a seeded RNG, and the
//! formula cache. Settings are re-read on every call so hosts can change
//! them between resolutions. Methods take `&mut self`, which serializes
//! resolutions within one session.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wb_core::{ActorView, InventoryItem, ItemData};

use crate::collaborators::{ConfigurationProvider, ItemDefinitionFetch, ItemIndexSearch};
use crate::config::EngineConfig;
use crate::degree::DegreeOfSuccess;
use crate::difficulty::{DifficultyCalculator, DifficultyRequest};
use crate::error::EngineResult;
use crate::feats::Capabilities;
use crate::formula_cache::FormulaCache;
use crate::resolve::{
    CraftingRequest, EtchingRequest, IdentificationPlan, IdentificationRequest,
    ReverseEngineeringRequest, Resolution, plan_identification, resolve_crafting, resolve_etching,
    resolve_identification, resolve_reverse_engineering,
};

/// Resolves downtime actions for one table.
pub struct Workshop<C, P> {
    catalog: C,
    settings: P,
    rng: StdRng,
    formulas: FormulaCache,
}

impl<C, P> Workshop<C, P>
where
    C: ItemIndexSearch + ItemDefinitionFetch,
    P: ConfigurationProvider,
{
    /// Create a workshop whose random draws are seeded with `seed`.
    pub fn new(catalog: C, settings: P, seed: u64) -> Self {
        Self {
            catalog,
            settings,
            rng: StdRng::seed_from_u64(seed),
            formulas: FormulaCache::new(),
        }
    }

    /// The item catalog.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// The current settings.
    pub fn config(&self) -> EngineResult<EngineConfig> {
        EngineConfig::from_provider(&self.settings)
    }

    /// The formula cache.
    pub fn formulas(&self) -> &FormulaCache {
        &self.formulas
    }

    /// Empty the formula cache, e.g. when a formula book is redrawn.
    pub fn clear_formula_cache(&mut self) {
        self.formulas.clear();
    }

    /// The DC for `request` under the current settings.
    pub fn difficulty(&self, request: &DifficultyRequest) -> EngineResult<u32> {
        let config = self.config()?;
        DifficultyCalculator::from_config(&config).calculate(request)
    }

    /// DC, skills, and modifiers for identifying `item`.
    pub fn plan_identification(
        &self,
        item: &ItemData,
        actor: &ActorView,
    ) -> EngineResult<IdentificationPlan> {
        let config = self.config()?;
        let capabilities = Capabilities::for_actor(actor, &config.feats);
        plan_identification(item, actor, &capabilities, &config)
    }

    /// Resolve a crafting attempt.
    pub async fn craft(
        &mut self,
        degree: DegreeOfSuccess,
        request: &CraftingRequest<'_>,
    ) -> EngineResult<Resolution> {
        let config = self.config()?;
        let resolution =
            resolve_crafting(degree, request, config.consumption_chance, &mut self.rng)?;
        log_resolution("craft", request.actor, &resolution);
        Ok(resolution)
    }

    /// Resolve an identification attempt.
    pub async fn identify(
        &mut self,
        degree: DegreeOfSuccess,
        actor: &ActorView,
        item: &InventoryItem,
    ) -> EngineResult<Resolution> {
        let config = self.config()?;
        let capabilities = Capabilities::for_actor(actor, &config.feats);
        let request = IdentificationRequest {
            actor,
            item,
            capabilities: &capabilities,
        };
        let resolution = resolve_identification(
            degree,
            &request,
            &self.catalog,
            &self.catalog,
            &config.replacement,
            &mut self.rng,
            Utc::now(),
        )
        .await;
        log_resolution("identify", actor, &resolution);
        Ok(resolution)
    }

    /// Resolve a reverse engineering attempt, looking up the item's origin
    /// through the formula cache.
    pub async fn reverse_engineer(
        &mut self,
        degree: DegreeOfSuccess,
        actor: &ActorView,
        item: &InventoryItem,
    ) -> EngineResult<Resolution> {
        let formula = match &item.data.origin {
            Some(origin) => {
                self.formulas
                    .resolve(actor.id, origin, &self.catalog)
                    .await?
            }
            None => None,
        };
        let request = ReverseEngineeringRequest {
            actor,
            item,
            formula: formula.as_ref(),
        };
        let resolution = resolve_reverse_engineering(degree, &request);
        log_resolution("reverse engineer", actor, &resolution);
        Ok(resolution)
    }

    /// Resolve a rune etching attempt.
    pub async fn etch_rune(
        &mut self,
        degree: DegreeOfSuccess,
        request: &EtchingRequest<'_>,
    ) -> EngineResult<Resolution> {
        let config = self.config()?;
        let resolution =
            resolve_etching(degree, request, config.consumption_chance, &mut self.rng)?;
        log_resolution("etch", request.actor, &resolution);
        Ok(resolution)
    }
}

fn log_resolution(action: &str, actor: &ActorView, resolution: &Resolution) {
    let c = &resolution.consequence;
    tracing::info!(
        action,
        actor = %actor.name,
        degree = %c.degree,
        created = c.items_to_create.len(),
        updated = c.items_to_update.len(),
        deleted = c.items_to_delete.len(),
        "resolved"
    );
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wb_core::{DocumentRef, FormulaEntry, ItemId, ItemKind, Price, Rarity};

    use super::*;
    use crate::consequence::{ActorChange, apply_consequence};
    use crate::consumption::MaterialLine;
    use crate::error::EngineError;
    use crate::memory::{MemoryCatalog, MemoryConfig, MemoryPersistence, PersistenceCall};

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with(
                "equipment",
                "eq.lantern",
                ItemData::new("Lantern", ItemKind::Equipment).with_level(1),
            )
            .with(
                "equipment",
                "eq.rope",
                ItemData::new("Rope", ItemKind::Equipment).with_level(0),
            )
    }

    fn workshop(settings: MemoryConfig) -> Workshop<MemoryCatalog, MemoryConfig> {
        Workshop::new(catalog(), settings, 17)
    }

    #[test]
    fn difficulty_reads_settings() {
        let shop = workshop(MemoryConfig::new().with("dc.table", json!([10, 12, 14])));
        let request = DifficultyRequest {
            level: 9,
            rarity: Rarity::Rare,
            explicit_override: None,
        };
        assert_eq!(shop.difficulty(&request).unwrap(), 19);
    }

    #[test]
    fn invalid_settings_abort() {
        let shop = workshop(MemoryConfig::new().with("dc.table", json!([])));
        let err = shop.difficulty(&DifficultyRequest {
            level: 1,
            rarity: Rarity::Common,
            explicit_override: None,
        });
        assert!(matches!(err, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn oversized_dc_table_is_a_configuration_error() {
        let shop = workshop(MemoryConfig::new().with("dc.table", json!([u32::MAX])));
        let err = shop.difficulty(&DifficultyRequest {
            level: 0,
            rarity: Rarity::Uncommon,
            explicit_override: None,
        });
        assert!(matches!(err, Err(EngineError::Configuration(_))));
    }

    #[tokio::test]
    async fn reverse_engineering_uses_formula_cache() {
        let mut shop = workshop(MemoryConfig::new());
        let actor = ActorView::new("Brom", 2);
        let item = InventoryItem::new(
            ItemData::new("Lantern", ItemKind::Equipment)
                .with_origin(DocumentRef::new("eq.lantern")),
        );
        let resolution = shop
            .reverse_engineer(DegreeOfSuccess::CriticalSuccess, &actor, &item)
            .await
            .unwrap();
        assert_eq!(
            resolution.consequence.actor_changes,
            vec![ActorChange::KnownFormulas(vec![FormulaEntry {
                target: DocumentRef::new("eq.lantern"),
                name: "Lantern".to_string(),
                level: 1,
            }])]
        );
        assert_eq!(shop.formulas().len(), 1);
        shop.clear_formula_cache();
        assert!(shop.formulas().is_empty());
    }

    #[tokio::test]
    async fn unknown_origin_teaches_nothing() {
        let mut shop = workshop(MemoryConfig::new());
        let actor = ActorView::new("Brom", 2);
        let item = InventoryItem::new(
            ItemData::new("Odd Gadget", ItemKind::Equipment)
                .with_origin(DocumentRef::new("eq.missing")),
        );
        let resolution = shop
            .reverse_engineer(DegreeOfSuccess::CriticalSuccess, &actor, &item)
            .await
            .unwrap();
        assert!(resolution.consequence.is_noop());
    }

    #[tokio::test]
    async fn crafted_items_reach_persistence() {
        let mut shop = workshop(MemoryConfig::new().with("consumption.chance", json!(1.0)));
        let actor = ActorView::new("Ilse", 3);
        let target =
            ItemData::new("Rope", ItemKind::Equipment).with_price(Price::from_coins(0, 5, 0));
        let materials = vec![MaterialLine::whole_stack(
            ItemId::new(),
            4,
            Price::from_coins(0, 5, 0),
        )];
        let request = CraftingRequest {
            actor: &actor,
            target: &target,
            materials: &materials,
        };
        let resolution = shop
            .craft(DegreeOfSuccess::CriticalSuccess, &request)
            .await
            .unwrap();
        assert_eq!(resolution.consumption.as_ref().unwrap().total_consumed, 4);

        let persistence = MemoryPersistence::new();
        let report = apply_consequence(&persistence, actor.id, &resolution.consequence).await;
        assert!(report.is_complete());
        assert_eq!(report.created.len(), 1);
        let calls = persistence.calls();
        assert!(matches!(&calls[0], PersistenceCall::Create(_, items) if items[0].quantity == 4));
        assert_eq!(
            calls[1],
            PersistenceCall::Delete(actor.id, vec![materials[0].item])
        );
    }

    #[tokio::test]
    async fn identify_applies_feats_from_settings() {
        let mut shop = workshop(MemoryConfig::new());
        let actor = ActorView::new("Ilse", 1).with_feat("assured-identification");
        let item = InventoryItem::new(
            ItemData::new("Lantern", ItemKind::Equipment).unidentified("Odd Lamp"),
        );
        let resolution = shop
            .identify(DegreeOfSuccess::CriticalFailure, &actor, &item)
            .await
            .unwrap();
        assert_eq!(resolution.consequence.degree, DegreeOfSuccess::Failure);
        assert!(resolution.consequence.retry_lockout.is_some());
    }
}
