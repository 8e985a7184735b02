//! Rune definitions and base-item rune configurations.
//!
//! A weapon, armor, or shield carries two fundamental runes (potency plus
//! striking or resilient, each tier 0..=3) and a number of property runes
//! bounded by its potency tier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::price::Price;

/// Highest tier a fundamental rune can reach.
pub const MAX_FUNDAMENTAL_TIER: u8 = 3;

/// Upper bound on property rune slots, regardless of potency.
pub const MAX_PROPERTY_SLOTS: usize = 4;

/// Which kind of base item a rune is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuneUsage {
    /// Etched onto weapons.
    Weapon,
    /// Etched onto armor.
    Armor,
    /// Etched onto shields.
    Shield,
}

impl fmt::Display for RuneUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Shield => write!(f, "shield"),
        }
    }
}

/// What a rune does once etched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RuneKind {
    /// Fundamental potency rune (+1 to +3).
    Potency {
        /// Tier granted, 1..=3.
        tier: u8,
    },
    /// Fundamental weapon damage rune (striking, greater, major).
    Striking {
        /// Tier granted, 1..=3.
        tier: u8,
    },
    /// Fundamental armor save rune (resilient, greater, major).
    Resilient {
        /// Tier granted, 1..=3.
        tier: u8,
    },
    /// A property rune occupying one property slot.
    Property {
        /// Slug of the lesser rune this one replaces in place, if any.
        #[serde(default)]
        upgrades_from: Option<String>,
    },
}

impl RuneKind {
    /// Returns true for potency, striking, and resilient runes.
    pub fn is_fundamental(&self) -> bool {
        !matches!(self, Self::Property { .. })
    }

    /// The tier of a fundamental rune.
    pub fn tier(&self) -> Option<u8> {
        match self {
            Self::Potency { tier } | Self::Striking { tier } | Self::Resilient { tier } => {
                Some(*tier)
            }
            Self::Property { .. } => None,
        }
    }
}

/// A rune that may be etched onto a base item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneDefinition {
    /// Unique slug (e.g. `flaming`, `greater-striking`).
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Item level of the rune.
    #[serde(default)]
    pub level: u32,
    /// Base item domain the rune is made for.
    pub usage: RuneUsage,
    /// Fundamental or property behavior.
    pub kind: RuneKind,
    /// Price of the rune.
    #[serde(default)]
    pub price: Price,
}

/// The runes currently etched onto a base item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneState {
    /// Potency tier, 0..=3.
    #[serde(default)]
    pub potency: u8,
    /// Striking (weapons) or resilient (armor) tier, 0..=3.
    #[serde(default)]
    pub secondary: u8,
    /// Property rune slugs, in slot order.
    #[serde(default)]
    pub property: Vec<Option<String>>,
}

impl RuneState {
    /// Build a validated rune state.
    pub fn new(potency: u8, secondary: u8, property: Vec<Option<String>>) -> CoreResult<Self> {
        let state = Self {
            potency,
            secondary,
            property,
        };
        state.validate()?;
        Ok(state)
    }

    /// Check tiers and the property slot bound.
    pub fn validate(&self) -> CoreResult<()> {
        if self.potency > MAX_FUNDAMENTAL_TIER {
            return Err(CoreError::InvalidRuneTier(format!(
                "potency tier {} exceeds {MAX_FUNDAMENTAL_TIER}",
                self.potency
            )));
        }
        if self.secondary > MAX_FUNDAMENTAL_TIER {
            return Err(CoreError::InvalidRuneTier(format!(
                "secondary tier {} exceeds {MAX_FUNDAMENTAL_TIER}",
                self.secondary
            )));
        }
        let etched = self.property.iter().flatten().count();
        if etched > self.property_slot_count() {
            return Err(CoreError::InvalidRuneTier(format!(
                "{etched} property runes on an item with {} property slots",
                self.property_slot_count()
            )));
        }
        Ok(())
    }

    /// How many property slots the current potency tier opens.
    pub fn property_slot_count(&self) -> usize {
        usize::from(self.potency).min(MAX_PROPERTY_SLOTS)
    }

    /// The rune in property slot `index`, if any.
    pub fn property_at(&self, index: usize) -> Option<&str> {
        self.property.get(index).and_then(|s| s.as_deref())
    }

    /// Returns true if `slug` is etched in any property slot.
    pub fn has_property(&self, slug: &str) -> bool {
        self.property.iter().flatten().any(|s| s == slug)
    }

    /// Etch `slug` into property slot `index`, growing the slot list as needed.
    pub fn set_property(&mut self, index: usize, slug: &str) {
        if self.property.len() <= index {
            self.property.resize(index + 1, None);
        }
        self.property[index] = Some(slug.to_string());
    }
}
