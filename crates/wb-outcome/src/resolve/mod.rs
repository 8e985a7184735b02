//! Outcome resolvers, one per downtime action.
//!
//! Each resolver maps a [`DegreeOfSuccess`](crate::degree::DegreeOfSuccess)
//! and a fully resolved selection (actor, items, materials) to a
//! [`ConsequenceDescriptor`]. Resolvers never touch storage; they only
//! describe what should change.

use serde::{Deserialize, Serialize};

use crate::consequence::ConsequenceDescriptor;
use crate::consumption::ConsumptionResult;

/// Crafting new items from materials.
pub mod crafting;
/// Rune etching.
pub mod etching;
/// Identifying unknown items.
pub mod identification;
/// Learning formulas by taking items apart.
pub mod reverse;

pub use crafting::{CraftingRequest, crafted_quantity, provenance_tag, resolve_crafting};
pub use etching::{EtchingRequest, resolve_etching};
pub use identification::{
    IdentificationPlan, IdentificationRequest, effective_degree, plan_identification,
    resolve_identification, settle_identification,
};
pub use reverse::{ReverseEngineeringRequest, resolve_reverse_engineering};

/// What a resolver decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Changes to apply.
    pub consequence: ConsequenceDescriptor,
    /// How committed materials were used, for actions that take materials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption: Option<ConsumptionResult>,
}

impl Resolution {
    /// A resolution that used no materials.
    pub fn new(consequence: ConsequenceDescriptor) -> Self {
        Self {
            consequence,
            consumption: None,
        }
    }

    /// A resolution that used materials.
    pub fn with_consumption(
        consequence: ConsequenceDescriptor,
        consumption: ConsumptionResult,
    ) -> Self {
        Self {
            consequence,
            consumption: Some(consumption),
        }
    }
}
