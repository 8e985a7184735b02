//! Material consumption.
//!
//! In "all" mode every committed unit is used up. In "chance" mode each unit
//! is rolled for independently, so a stack of N units loses a binomially
//! distributed number of them rather than a fixed share.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use wb_core::{ItemId, Price};

use crate::degree::DegreeOfSuccess;
use crate::error::{EngineError, EngineResult};

/// How committed materials are used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionMode {
    /// Every unit is consumed.
    All,
    /// Each unit is consumed independently with the configured probability.
    Chance,
}

impl ConsumptionMode {
    /// The mode for a crafting-style check: critical outcomes lose less
    /// than their ordinary counterpart.
    pub fn for_degree(degree: DegreeOfSuccess) -> Self {
        match degree {
            DegreeOfSuccess::CriticalSuccess | DegreeOfSuccess::Failure => Self::Chance,
            DegreeOfSuccess::Success | DegreeOfSuccess::CriticalFailure => Self::All,
        }
    }
}

impl fmt::Display for ConsumptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Chance => write!(f, "chance"),
        }
    }
}

impl FromStr for ConsumptionMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "chance" => Ok(Self::Chance),
            other => Err(EngineError::InvalidInput(format!(
                "unknown consumption mode: {other} (expected all or chance)"
            ))),
        }
    }
}

/// Material committed from one inventory stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialLine {
    /// The inventory item holding the material.
    pub item: ItemId,
    /// Units committed. Must be positive.
    pub quantity: u32,
    /// Units the stack holds. Must be at least `quantity`.
    pub stack: u32,
    /// Value of one unit.
    #[serde(default)]
    pub unit_value: Price,
}

impl MaterialLine {
    /// Commit `quantity` units from a stack of `stack`.
    pub fn new(item: ItemId, quantity: u32, stack: u32, unit_value: Price) -> Self {
        Self {
            item,
            quantity,
            stack,
            unit_value,
        }
    }

    /// Commit a whole stack of `quantity` units.
    pub fn whole_stack(item: ItemId, quantity: u32, unit_value: Price) -> Self {
        Self::new(item, quantity, quantity, unit_value)
    }

    /// Total value of the committed units.
    ///
    /// Fails with [`EngineError::InvalidInput`] when the total does not fit.
    pub fn value(&self) -> EngineResult<Price> {
        self.unit_value.checked_mul(self.quantity).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "material {}: {} units at {} overflow the coin range",
                self.item, self.quantity, self.unit_value
            ))
        })
    }
}

/// What happened to one material line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialUse {
    /// The inventory item.
    pub item: ItemId,
    /// Units committed.
    pub quantity: u32,
    /// Units the stack held before consumption.
    pub stack: u32,
    /// Units used up.
    pub consumed: u32,
}

impl MaterialUse {
    /// Committed units kept.
    pub fn saved(&self) -> u32 {
        self.quantity - self.consumed
    }

    /// Units left in the stack afterwards.
    pub fn remaining(&self) -> u32 {
        self.stack - self.consumed
    }

    /// Returns true if the stack is empty, so the item should be deleted.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

/// Per-line and total consumption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionResult {
    /// One entry per material line, in input order.
    pub per_material: Vec<MaterialUse>,
    /// Units consumed across all lines.
    pub total_consumed: u64,
    /// Units kept across all lines.
    pub total_saved: u64,
}

/// Decide how many units of each line are consumed.
///
/// `chance` is the per-unit probability used in [`ConsumptionMode::Chance`].
pub fn consume(
    materials: &[MaterialLine],
    mode: ConsumptionMode,
    chance: f64,
    rng: &mut StdRng,
) -> EngineResult<ConsumptionResult> {
    if !(0.0..=1.0).contains(&chance) {
        return Err(EngineError::Configuration(format!(
            "consumption chance {chance} is not a probability"
        )));
    }
    if let Some(line) = materials.iter().find(|m| m.quantity == 0) {
        return Err(EngineError::InvalidInput(format!(
            "material {} committed with zero quantity",
            line.item
        )));
    }
    if let Some(line) = materials.iter().find(|m| m.quantity > m.stack) {
        return Err(EngineError::InvalidInput(format!(
            "material {} commits {} units from a stack of {}",
            line.item, line.quantity, line.stack
        )));
    }

    let mut result = ConsumptionResult::default();
    for line in materials {
        let consumed = match mode {
            ConsumptionMode::All => line.quantity,
            ConsumptionMode::Chance => {
                (0..line.quantity).filter(|_| rng.random_bool(chance)).count() as u32
            }
        };
        let used = MaterialUse {
            item: line.item,
            quantity: line.quantity,
            stack: line.stack,
            consumed,
        };
        result.total_consumed += u64::from(used.consumed);
        result.total_saved += u64::from(used.saved());
        result.per_material.push(used);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;

    fn line(quantity: u32) -> MaterialLine {
        MaterialLine::whole_stack(ItemId::new(), quantity, Price::from_coins(1, 0, 0))
    }

    #[test]
    fn mode_parse() {
        assert_eq!("ALL".parse::<ConsumptionMode>().unwrap(), ConsumptionMode::All);
        assert_eq!("chance".parse::<ConsumptionMode>().unwrap(), ConsumptionMode::Chance);
        assert!("half".parse::<ConsumptionMode>().is_err());
    }

    #[test]
    fn all_mode_consumes_everything() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = consume(&[line(3), line(7)], ConsumptionMode::All, 0.5, &mut rng).unwrap();
        assert_eq!(result.total_consumed, 10);
        assert_eq!(result.total_saved, 0);
        assert!(result.per_material.iter().all(MaterialUse::is_exhausted));
    }

    #[test]
    fn chance_mode_is_deterministic_with_seed() {
        let lines = [line(50), line(20)];
        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);
        let a = consume(&lines, ConsumptionMode::Chance, 0.5, &mut rng1).unwrap();
        let b = consume(&lines, ConsumptionMode::Chance, 0.5, &mut rng2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chance_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let none = consume(&[line(100)], ConsumptionMode::Chance, 0.0, &mut rng).unwrap();
        assert_eq!(none.total_consumed, 0);
        let all = consume(&[line(100)], ConsumptionMode::Chance, 1.0, &mut rng).unwrap();
        assert_eq!(all.total_consumed, 100);
    }

    #[test]
    fn chance_mode_expectation() {
        let mut rng = StdRng::seed_from_u64(2024);
        let stack = [line(1_000)];
        let trials = 10_000;
        let mut consumed = 0u64;
        for _ in 0..trials {
            consumed += consume(&stack, ConsumptionMode::Chance, 0.5, &mut rng)
                .unwrap()
                .total_consumed;
        }
        let fraction = consumed as f64 / (trials as f64 * 1_000.0);
        assert!((0.45..=0.55).contains(&fraction), "fraction {fraction}");
    }

    #[test]
    fn single_units_show_variance() {
        // A one-unit stack is either kept or lost; both must occur.
        let mut rng = StdRng::seed_from_u64(9);
        let outcomes: Vec<u64> = (0..100)
            .map(|_| {
                consume(&[line(1)], ConsumptionMode::Chance, 0.5, &mut rng)
                    .unwrap()
                    .total_consumed
            })
            .collect();
        assert!(outcomes.contains(&0));
        assert!(outcomes.contains(&1));
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            consume(&[line(0)], ConsumptionMode::All, 0.5, &mut rng),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn partial_commitment_leaves_rest_of_stack() {
        let mut rng = StdRng::seed_from_u64(1);
        let partial = MaterialLine::new(ItemId::new(), 4, 10, Price::from_coins(1, 0, 0));
        let result = consume(&[partial], ConsumptionMode::All, 0.5, &mut rng).unwrap();
        let used = result.per_material[0];
        assert_eq!(used.consumed, 4);
        assert_eq!(used.saved(), 0);
        assert_eq!(used.remaining(), 6);
        assert!(!used.is_exhausted());
    }

    #[test]
    fn commitment_larger_than_stack_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let greedy = MaterialLine::new(ItemId::new(), 5, 3, Price::default());
        assert!(matches!(
            consume(&[greedy], ConsumptionMode::All, 0.5, &mut rng),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn overflowing_value_is_invalid() {
        let pricey = MaterialLine::whole_stack(ItemId::new(), 3, Price::from_copper(u64::MAX / 2));
        assert!(matches!(pricey.value(), Err(EngineError::InvalidInput(_))));
        assert_eq!(line(3).value().unwrap(), Price::from_coins(3, 0, 0));
    }

    #[test]
    fn invalid_chance_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            consume(&[line(1)], ConsumptionMode::Chance, 2.0, &mut rng),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn mode_for_degree() {
        assert_eq!(
            ConsumptionMode::for_degree(DegreeOfSuccess::CriticalSuccess),
            ConsumptionMode::Chance
        );
        assert_eq!(
            ConsumptionMode::for_degree(DegreeOfSuccess::Success),
            ConsumptionMode::All
        );
        assert_eq!(
            ConsumptionMode::for_degree(DegreeOfSuccess::Failure),
            ConsumptionMode::Chance
        );
        assert_eq!(
            ConsumptionMode::for_degree(DegreeOfSuccess::CriticalFailure),
            ConsumptionMode::All
        );
    }

    proptest! {
        #[test]
        fn consumed_plus_saved_is_quantity(
            quantities in prop::collection::vec(1u32..200, 1..8),
            seed in any::<u64>(),
            chance_mode in any::<bool>(),
        ) {
            let lines: Vec<MaterialLine> = quantities.iter().map(|q| line(*q)).collect();
            let mode = if chance_mode { ConsumptionMode::Chance } else { ConsumptionMode::All };
            let mut rng = StdRng::seed_from_u64(seed);
            let result = consume(&lines, mode, 0.5, &mut rng).unwrap();
            for (used, original) in result.per_material.iter().zip(&lines) {
                prop_assert_eq!(used.consumed + used.saved(), original.quantity);
                prop_assert_eq!(used.item, original.item);
            }
            let total: u64 = quantities.iter().map(|q| u64::from(*q)).sum();
            prop_assert_eq!(result.total_consumed + result.total_saved, total);
        }
    }
}
