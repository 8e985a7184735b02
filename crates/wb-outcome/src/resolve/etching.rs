//! Rune etching resolution.
//!
//! | Degree           | Rune etched | Runestone  | Materials |
//! |------------------|-------------|------------|-----------|
//! | Critical Success | yes         | used       | chance    |
//! | Success          | yes         | used       | all       |
//! | Failure          | no          | kept       | chance    |
//! | Critical Failure | no          | destroyed  | all       |

use rand::rngs::StdRng;
use wb_core::{ActorView, InventoryItem, RuneDefinition};

use super::Resolution;
use crate::consequence::{ConsequenceDescriptor, ItemChange};
use crate::consumption::{ConsumptionMode, MaterialLine, consume};
use crate::degree::DegreeOfSuccess;
use crate::error::{EngineError, EngineResult};
use crate::runes::{RuneMatcher, SlotKey};

/// A fully resolved etching selection.
#[derive(Debug, Clone, Copy)]
pub struct EtchingRequest<'a> {
    /// The etcher.
    pub actor: &'a ActorView,
    /// The weapon, armor, or shield receiving the rune.
    pub base: &'a InventoryItem,
    /// The runestone carrying the rune.
    pub runestone: &'a InventoryItem,
    /// The rune on the runestone.
    pub rune: &'a RuneDefinition,
    /// Where to etch it.
    pub slot: SlotKey,
    /// Additional materials committed. May be empty.
    pub materials: &'a [MaterialLine],
}

/// Resolve an etching attempt.
///
/// Fails with [`EngineError::InvalidInput`] if the base item cannot carry
/// runes, lacks the slot, or the rune does not fit it. Nothing is consumed
/// in that case. The base item and the runestone must be distinct and
/// must not also be committed as materials.
pub fn resolve_etching(
    degree: DegreeOfSuccess,
    request: &EtchingRequest<'_>,
    chance: f64,
    rng: &mut StdRng,
) -> EngineResult<Resolution> {
    let base = request.base;
    let rune = request.rune;
    check_distinct_items(request)?;
    let matcher = RuneMatcher::for_item(&base.data)?;
    let slot = matcher.slot(request.slot).ok_or_else(|| {
        EngineError::InvalidInput(format!("{} has no {} slot", base.data.name, request.slot))
    })?;
    matcher
        .check(rune, &slot)
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;

    let consumption = consume(
        request.materials,
        ConsumptionMode::for_degree(degree),
        chance,
        rng,
    )?;

    let mut consequence = ConsequenceDescriptor::new(degree);
    consequence.apply_consumption(&consumption);
    let runestone = request.runestone;
    match degree {
        DegreeOfSuccess::CriticalSuccess | DegreeOfSuccess::Success => {
            consequence.update(base.id, ItemChange::Runes(matcher.etched(rune, &slot)));
            consequence.use_one(runestone.id, runestone.data.quantity);
            consequence.narrate(format!(
                "{} etches {} into the {} slot of {}.",
                request.actor.name, rune.name, slot.key, base.data.name
            ));
        }
        DegreeOfSuccess::Failure => consequence.narrate(format!(
            "{} fails to etch {}; the runestone is unharmed.",
            request.actor.name, rune.name
        )),
        DegreeOfSuccess::CriticalFailure => {
            consequence.use_one(runestone.id, runestone.data.quantity);
            consequence.narrate(format!(
                "{} fails to etch {} and the runestone shatters.",
                request.actor.name, rune.name
            ));
        }
    }

    tracing::debug!(
        actor = %request.actor.name,
        base = %base.id,
        rune = %rune.slug,
        slot = %slot.key,
        %degree,
        "etching resolved"
    );
    Ok(Resolution::with_consumption(consequence, consumption))
}

fn check_distinct_items(request: &EtchingRequest<'_>) -> EngineResult<()> {
    if request.base.id == request.runestone.id {
        return Err(EngineError::InvalidInput(format!(
            "{} cannot be its own runestone",
            request.base.data.name
        )));
    }
    for (role, item) in [("base item", request.base), ("runestone", request.runestone)] {
        if request.materials.iter().any(|m| m.item == item.id) {
            return Err(EngineError::InvalidInput(format!(
                "{} is the {role} and cannot also be committed as material",
                item.data.name
            )));
        }
    }
    Ok(())
}
