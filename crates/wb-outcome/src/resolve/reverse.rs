//! Reverse engineering resolution.
//!
//! Learning the formula and losing the item are decided separately: any
//! success with a resolvable, unknown formula teaches it, and only a
//! critical success leaves the item intact.

use wb_core::{ActorView, FormulaEntry, InventoryItem};

use super::Resolution;
use crate::consequence::{ActorChange, ConsequenceDescriptor};
use crate::degree::DegreeOfSuccess;

/// A fully resolved reverse engineering selection.
#[derive(Debug, Clone, Copy)]
pub struct ReverseEngineeringRequest<'a> {
    /// The engineer.
    pub actor: &'a ActorView,
    /// The item taken apart.
    pub item: &'a InventoryItem,
    /// The formula the item's origin resolves to, or `None` if it has no
    /// origin or the origin cannot be found.
    pub formula: Option<&'a FormulaEntry>,
}

/// Resolve a reverse engineering attempt.
pub fn resolve_reverse_engineering(
    degree: DegreeOfSuccess,
    request: &ReverseEngineeringRequest<'_>,
) -> Resolution {
    let actor = request.actor;
    let item = request.item;
    let mut consequence = ConsequenceDescriptor::new(degree);

    let learnable = request
        .formula
        .filter(|formula| !actor.knows_formula(&formula.target));
    match (degree.is_success(), request.formula, learnable) {
        (true, _, Some(formula)) => {
            consequence
                .actor_changes
                .push(ActorChange::KnownFormulas(actor.formulas_with(formula.clone())));
            consequence.narrate(format!(
                "{} learns the formula for {}.",
                actor.name, formula.name
            ));
        }
        (true, Some(formula), None) => consequence.narrate(format!(
            "{} already knows the formula for {}.",
            actor.name, formula.name
        )),
        (true, None, None) => consequence.narrate(format!(
            "{} cannot trace {} back to a known design.",
            actor.name, item.data.name
        )),
        (false, _, _) => consequence.narrate(format!(
            "{} learns nothing from {}.",
            actor.name, item.data.name
        )),
    }

    if degree == DegreeOfSuccess::CriticalSuccess {
        consequence.narrate(format!("{} survives intact.", item.data.name));
    } else {
        consequence.use_one(item.id, item.data.quantity);
        consequence.narrate(format!("{} is destroyed.", item.data.name));
    }

    tracing::debug!(
        actor = %actor.name,
        item = %item.id,
        %degree,
        learned = !consequence.actor_changes.is_empty(),
        "reverse engineering resolved"
    );
    Resolution::new(consequence)
}
