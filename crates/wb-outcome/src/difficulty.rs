//! Difficulty class computation.
//!
//! The DC of a crafting, identification, or etching check is the level-based
//! DC of the item plus a rarity adjustment. An explicit DC recorded on the
//! item always wins.

use serde::{Deserialize, Serialize};
use wb_core::{ItemData, Rarity};

use crate::config::{EngineConfig, RarityAdjustments};
use crate::error::{EngineError, EngineResult};

/// Inputs to a DC calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRequest {
    /// Item level.
    pub level: u32,
    /// Item rarity.
    pub rarity: Rarity,
    /// An explicit DC; used unchanged when positive.
    pub explicit_override: Option<u32>,
}

impl DifficultyRequest {
    /// A request for an item's level and rarity.
    pub fn for_item(item: &ItemData) -> Self {
        Self {
            level: item.level,
            rarity: item.rarity,
            explicit_override: None,
        }
    }

    /// Attach an explicit DC.
    pub fn with_override(mut self, dc: Option<u32>) -> Self {
        self.explicit_override = dc;
        self
    }
}

/// Looks up DCs from a level table and rarity adjustments.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyCalculator<'a> {
    table: &'a [u32],
    rarity: &'a RarityAdjustments,
}

impl<'a> DifficultyCalculator<'a> {
    /// A calculator over an explicit table.
    pub fn new(table: &'a [u32], rarity: &'a RarityAdjustments) -> Self {
        Self { table, rarity }
    }

    /// A calculator over the configured table.
    pub fn from_config(config: &'a EngineConfig) -> Self {
        Self::new(&config.dc_table, &config.rarity)
    }

    /// The DC for `request`.
    pub fn calculate(&self, request: &DifficultyRequest) -> EngineResult<u32> {
        if let Some(dc) = request.explicit_override.filter(|dc| *dc > 0) {
            tracing::debug!(dc, "explicit DC override");
            return Ok(dc);
        }

        let base = self.level_dc(request.level)?;
        let floor = self.table[0];
        let adjustment = self.rarity.for_rarity(request.rarity);
        let dc = base
            .checked_add(adjustment)
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "DC {base} plus {} adjustment {adjustment} exceeds the DC range",
                    request.rarity
                ))
            })?
            .max(floor);
        tracing::debug!(
            level = request.level,
            rarity = %request.rarity,
            base,
            dc,
            "computed DC"
        );
        Ok(dc)
    }

    /// The table entry for `level`, clamped to the last defined level.
    pub fn level_dc(&self, level: u32) -> EngineResult<u32> {
        let last = self.table.len().checked_sub(1).ok_or_else(|| {
            EngineError::Configuration("DC table has no entries".to_string())
        })?;
        let index = usize::try_from(level).unwrap_or(usize::MAX).min(last);
        Ok(self.table[index])
    }
}
