//! Engine configuration.
//!
//! [`EngineConfig`] is built fresh from a [`ConfigurationProvider`] at the
//! start of every resolution, so settings changed between calls take effect
//! on the next attempt. Absent keys fall back to the ruleset defaults.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wb_core::Rarity;

use crate::collaborators::ConfigurationProvider;
use crate::error::{EngineError, EngineResult};
use crate::feats::FeatCatalog;

/// DC by item level, levels 0 through 25.
pub const DEFAULT_DC_TABLE: [u32; 26] = [
    14, 15, 16, 18, 19, 20, 22, 23, 24, 26, 27, 28, 30, 31, 32, 34, 35, 36, 38, 39, 40, 42, 44,
    46, 48, 50,
];

/// DC increase per rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityAdjustments {
    /// Adjustment for common items.
    pub common: u32,
    /// Adjustment for uncommon items.
    pub uncommon: u32,
    /// Adjustment for rare items.
    pub rare: u32,
    /// Adjustment for unique items.
    pub unique: u32,
}

impl Default for RarityAdjustments {
    fn default() -> Self {
        Self {
            common: 0,
            uncommon: 2,
            rare: 5,
            unique: 10,
        }
    }
}

impl RarityAdjustments {
    /// The adjustment for `rarity`.
    pub fn for_rarity(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Unique => self.unique,
        }
    }

    /// Rarer items must never be easier.
    pub fn validate(&self) -> EngineResult<()> {
        if self.common <= self.uncommon && self.uncommon <= self.rare && self.rare <= self.unique {
            Ok(())
        } else {
            Err(EngineError::Configuration(format!(
                "rarity adjustments must be non-decreasing, got {}/{}/{}/{}",
                self.common, self.uncommon, self.rare, self.unique
            )))
        }
    }
}

/// How a deceptive replacement is named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "style")]
pub enum ReplacementNaming {
    /// Append `(Id by <actor>)`.
    Suffix,
    /// Put `marker` in front of the name.
    Prefix {
        /// The marker text, e.g. `"\u{2731}"`.
        marker: String,
    },
}

/// Settings for deceptive replacement selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementConfig {
    /// How many levels below the actor a candidate may be.
    pub levels_below: u32,
    /// How many levels above the actor a candidate may be.
    pub levels_above: u32,
    /// Names of the item indexes to search.
    pub pools: Vec<String>,
    /// Naming style for the replacement.
    pub naming: ReplacementNaming,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self {
            levels_below: 2,
            levels_above: 3,
            pools: vec!["equipment".to_string()],
            naming: ReplacementNaming::Suffix,
        }
    }
}

/// Everything the resolvers read from settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// DC by item level; index = level.
    pub dc_table: Vec<u32>,
    /// DC increase per rarity.
    pub rarity: RarityAdjustments,
    /// Probability that one unit is consumed in "chance" mode.
    pub consumption_chance: f64,
    /// Deceptive replacement settings.
    pub replacement: ReplacementConfig,
    /// Feat slug to capability mapping.
    pub feats: FeatCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dc_table: DEFAULT_DC_TABLE.to_vec(),
            rarity: RarityAdjustments::default(),
            consumption_chance: 0.5,
            replacement: ReplacementConfig::default(),
            feats: FeatCatalog::default(),
        }
    }
}

impl EngineConfig {
    /// Replace the DC table.
    pub fn with_dc_table(mut self, table: Vec<u32>) -> Self {
        self.dc_table = table;
        self
    }

    /// Replace the rarity adjustments.
    pub fn with_rarity(mut self, rarity: RarityAdjustments) -> Self {
        self.rarity = rarity;
        self
    }

    /// Set the per-unit consumption probability.
    pub fn with_consumption_chance(mut self, chance: f64) -> Self {
        self.consumption_chance = chance;
        self
    }

    /// Replace the replacement settings.
    pub fn with_replacement(mut self, replacement: ReplacementConfig) -> Self {
        self.replacement = replacement;
        self
    }

    /// Replace the feat catalog.
    pub fn with_feats(mut self, feats: FeatCatalog) -> Self {
        self.feats = feats;
        self
    }

    /// Read settings from a provider, falling back to defaults for absent keys.
    ///
    /// Recognized keys: `dc.table`, `dc.rarity`, `consumption.chance`,
    /// `replacement.levels_below`, `replacement.levels_above`,
    /// `replacement.pools`, `replacement.naming`, `feats`.
    pub fn from_provider(provider: &dyn ConfigurationProvider) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(table) = read(provider, "dc.table")? {
            config.dc_table = table;
        }
        if let Some(rarity) = read(provider, "dc.rarity")? {
            config.rarity = rarity;
        }
        if let Some(chance) = read(provider, "consumption.chance")? {
            config.consumption_chance = chance;
        }
        if let Some(below) = read(provider, "replacement.levels_below")? {
            config.replacement.levels_below = below;
        }
        if let Some(above) = read(provider, "replacement.levels_above")? {
            config.replacement.levels_above = above;
        }
        if let Some(pools) = read(provider, "replacement.pools")? {
            config.replacement.pools = pools;
        }
        if let Some(naming) = read(provider, "replacement.naming")? {
            config.replacement.naming = naming;
        }
        if let Some(feats) = read(provider, "feats")? {
            config.feats = feats;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the resolvers rely on.
    pub fn validate(&self) -> EngineResult<()> {
        if self.dc_table.is_empty() {
            return Err(EngineError::Configuration(
                "DC table has no entries".to_string(),
            ));
        }
        if let Some(level) = self.dc_table.windows(2).position(|w| w[1] < w[0]) {
            return Err(EngineError::Configuration(format!(
                "DC table decreases between level {level} and {}",
                level + 1
            )));
        }
        self.rarity.validate()?;
        if !(0.0..=1.0).contains(&self.consumption_chance) {
            return Err(EngineError::Configuration(format!(
                "consumption chance {} is not a probability",
                self.consumption_chance
            )));
        }
        if self.replacement.pools.is_empty() {
            return Err(EngineError::Configuration(
                "no item pools configured for replacement".to_string(),
            ));
        }
        Ok(())
    }
}

fn read<T: DeserializeOwned>(
    provider: &dyn ConfigurationProvider,
    key: &str,
) -> EngineResult<Option<T>> {
    provider
        .get(key)
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| EngineError::Configuration(format!("setting '{key}': {e}")))
        })
        .transpose()
}
