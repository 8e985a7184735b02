//! Crafting resolution.
//!
//! Critical outcomes spare materials relative to their ordinary counterpart:
//!
//! | Degree           | Items made                | Materials |
//! |------------------|---------------------------|-----------|
//! | Critical Success | max(1, value / unit cost) | chance    |
//! | Success          | max(1, value / unit cost) | all       |
//! | Failure          | none                      | chance    |
//! | Critical Failure | none                      | all       |

use rand::rngs::StdRng;
use wb_core::{ActorView, IdentificationState, ItemData, Price};

use super::Resolution;
use crate::consequence::ConsequenceDescriptor;
use crate::consumption::{ConsumptionMode, MaterialLine, consume};
use crate::degree::DegreeOfSuccess;
use crate::error::{EngineError, EngineResult};

/// A fully resolved crafting selection.
#[derive(Debug, Clone, Copy)]
pub struct CraftingRequest<'a> {
    /// The crafter.
    pub actor: &'a ActorView,
    /// Definition of the item being made. Its price is the per-unit cost.
    pub target: &'a ItemData,
    /// Materials committed to the attempt.
    pub materials: &'a [MaterialLine],
}

impl CraftingRequest<'_> {
    /// Total value of the committed materials.
    ///
    /// Fails with [`EngineError::InvalidInput`] when the total does not fit.
    pub fn committed_value(&self) -> EngineResult<Price> {
        let values = self
            .materials
            .iter()
            .map(MaterialLine::value)
            .collect::<EngineResult<Vec<_>>>()?;
        Price::checked_sum(values).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "materials committed to {} exceed the coin range",
                self.target.name
            ))
        })
    }
}

/// Number of items produced for `degree`.
///
/// Fails with [`EngineError::InvalidInput`] for a zero unit cost; callers
/// may pass [`Price::at_least_nominal`] instead.
pub fn crafted_quantity(
    degree: DegreeOfSuccess,
    committed: Price,
    unit_cost: Price,
) -> EngineResult<u32> {
    if unit_cost.is_zero() {
        return Err(EngineError::InvalidInput(
            "crafting target has no price to divide by".to_string(),
        ));
    }
    if !degree.is_success() {
        return Ok(0);
    }
    let units = committed.copper() / unit_cost.copper();
    Ok(u32::try_from(units).unwrap_or(u32::MAX).max(1))
}

/// `description` with a "Crafted by" line for `actor`, added at most once.
pub fn provenance_tag(description: &str, actor: &str) -> String {
    let tag = format!("Crafted by {actor}.");
    if description.contains(&tag) {
        description.to_string()
    } else if description.is_empty() {
        tag
    } else {
        format!("{description}\n{tag}")
    }
}

/// Resolve a crafting attempt.
///
/// `chance` is the per-unit consumption probability for chance mode.
pub fn resolve_crafting(
    degree: DegreeOfSuccess,
    request: &CraftingRequest<'_>,
    chance: f64,
    rng: &mut StdRng,
) -> EngineResult<Resolution> {
    if request.materials.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "no materials committed to crafting {}",
            request.target.name
        )));
    }
    let committed = request.committed_value()?;
    let quantity = crafted_quantity(degree, committed, request.target.price)?;
    let mode = ConsumptionMode::for_degree(degree);
    let consumption = consume(request.materials, mode, chance, rng)?;

    tracing::debug!(
        actor = %request.actor.name,
        target = %request.target.name,
        %committed,
        quantity,
        %mode,
        "crafting resolved"
    );

    let mut consequence = ConsequenceDescriptor::new(degree);
    consequence.apply_consumption(&consumption);
    if quantity > 0 {
        consequence.create(crafted_item(request, quantity));
        consequence.narrate(format!(
            "{} crafts {} \u{d7} {}.",
            request.actor.name, quantity, request.target.name
        ));
    } else {
        consequence.narrate(format!(
            "{} fails to craft {}.",
            request.actor.name, request.target.name
        ));
    }
    consequence.narrate(format!(
        "{} of {} material units used up.",
        consumption.total_consumed,
        consumption.total_consumed + consumption.total_saved
    ));

    Ok(Resolution::with_consumption(consequence, consumption))
}

fn crafted_item(request: &CraftingRequest<'_>, quantity: u32) -> ItemData {
    let target = request.target;
    ItemData {
        quantity,
        description: provenance_tag(&target.description, &request.actor.name),
        identification: IdentificationState::default(),
        gm_description: None,
        ..target.clone()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use wb_core::{ItemId, ItemKind};

    use super::*;
    use crate::consequence::ItemChange;

    fn potion() -> ItemData {
        ItemData::new("Healing Potion", ItemKind::Consumable)
            .with_level(1)
            .with_price(Price::from_coins(5, 0, 0))
            .with_description("Restores 1d8 HP.")
    }

    fn materials(gp: u64, quantity: u32) -> Vec<MaterialLine> {
        vec![MaterialLine::whole_stack(
            ItemId::new(),
            quantity,
            Price::from_coins(gp, 0, 0),
        )]
    }

    fn run(
        degree: DegreeOfSuccess,
        target: &ItemData,
        materials: &[MaterialLine],
    ) -> EngineResult<Resolution> {
        let actor = ActorView::new("Ilse", 3);
        let request = CraftingRequest {
            actor: &actor,
            target,
            materials,
        };
        let mut rng = StdRng::seed_from_u64(11);
        resolve_crafting(degree, &request, 0.5, &mut rng)
    }

    #[test]
    fn quantity_from_value_and_cost() {
        let value = Price::from_coins(23, 0, 0);
        let cost = Price::from_coins(5, 0, 0);
        for degree in [DegreeOfSuccess::Success, DegreeOfSuccess::CriticalSuccess] {
            assert_eq!(crafted_quantity(degree, value, cost).unwrap(), 4);
        }
        for degree in [DegreeOfSuccess::Failure, DegreeOfSuccess::CriticalFailure] {
            assert_eq!(crafted_quantity(degree, value, cost).unwrap(), 0);
        }
    }

    #[test]
    fn success_makes_at_least_one() {
        let quantity = crafted_quantity(
            DegreeOfSuccess::Success,
            Price::from_coins(1, 0, 0),
            Price::from_coins(5, 0, 0),
        )
        .unwrap();
        assert_eq!(quantity, 1);
    }

    #[test]
    fn zero_cost_is_invalid() {
        let free = potion().with_price(Price::default());
        let err = run(DegreeOfSuccess::Success, &free, &materials(1, 1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert_eq!(
            crafted_quantity(
                DegreeOfSuccess::Success,
                Price::from_coins(1, 0, 0),
                Price::default().at_least_nominal()
            )
            .unwrap(),
            100
        );
    }

    #[test]
    fn empty_materials_are_invalid() {
        let err = run(DegreeOfSuccess::Success, &potion(), &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn success_creates_tagged_stack_and_uses_everything() {
        let mats = materials(23, 1);
        let resolution = run(DegreeOfSuccess::Success, &potion(), &mats).unwrap();
        let c = &resolution.consequence;
        assert_eq!(c.items_to_create.len(), 1);
        let made = &c.items_to_create[0];
        assert_eq!(made.quantity, 4);
        assert_eq!(made.description, "Restores 1d8 HP.\nCrafted by Ilse.");
        assert_eq!(c.items_to_delete, vec![mats[0].item]);
        assert_eq!(resolution.consumption.unwrap().total_consumed, 1);
    }

    #[test]
    fn critical_success_rolls_for_materials() {
        let mats = materials(1, 200);
        let resolution = run(DegreeOfSuccess::CriticalSuccess, &potion(), &mats).unwrap();
        assert_eq!(resolution.consequence.items_to_create[0].quantity, 40);
        let used = resolution.consumption.unwrap();
        assert!(used.total_consumed > 0 && used.total_saved > 0);
        assert_eq!(
            resolution.consequence.items_to_update[0].changes,
            vec![ItemChange::Quantity(used.per_material[0].remaining())]
        );
    }

    #[test]
    fn failures_create_nothing() {
        let mats = materials(1, 200);
        let fail = run(DegreeOfSuccess::Failure, &potion(), &mats).unwrap();
        assert!(fail.consequence.items_to_create.is_empty());
        assert!(fail.consumption.unwrap().total_saved > 0);

        let crit = run(DegreeOfSuccess::CriticalFailure, &potion(), &mats).unwrap();
        assert!(crit.consequence.items_to_create.is_empty());
        assert_eq!(crit.consumption.unwrap().total_saved, 0);
        assert_eq!(crit.consequence.items_to_delete, vec![mats[0].item]);
    }

    #[test]
    fn success_draws_only_the_committed_part_of_a_stack() {
        let oil = ItemId::new();
        let mats = [MaterialLine::new(oil, 4, 10, Price::from_coins(5, 0, 0))];
        let resolution = run(DegreeOfSuccess::Success, &potion(), &mats).unwrap();
        let c = &resolution.consequence;
        assert_eq!(c.items_to_create[0].quantity, 4);
        assert!(c.items_to_delete.is_empty());
        assert_eq!(c.items_to_update[0].item, oil);
        assert_eq!(c.items_to_update[0].changes, vec![ItemChange::Quantity(6)]);
    }

    #[test]
    fn overflowing_material_value_is_invalid() {
        let huge = [MaterialLine::whole_stack(ItemId::new(), 3, Price::from_copper(u64::MAX / 2))];
        let err = run(DegreeOfSuccess::Success, &potion(), &huge).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let halves = [
            MaterialLine::whole_stack(ItemId::new(), 1, Price::from_copper(u64::MAX / 2 + 1)),
            MaterialLine::whole_stack(ItemId::new(), 1, Price::from_copper(u64::MAX / 2 + 1)),
        ];
        let err = run(DegreeOfSuccess::Success, &potion(), &halves).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn provenance_is_idempotent() {
        let once = provenance_tag("A sturdy rope.", "Ilse");
        assert_eq!(provenance_tag(&once, "Ilse"), once);
        assert_eq!(provenance_tag("", "Ilse"), "Crafted by Ilse.");
        let twice = provenance_tag(&once, "Brom");
        assert!(twice.ends_with("Crafted by Brom."));
    }
}
