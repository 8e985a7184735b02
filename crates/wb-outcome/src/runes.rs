//! Rune slot derivation and compatibility.
//!
//! Slots are recomputed from the base item's current [`RuneState`] on every
//! call; nothing here is cached. A candidate rune fits a slot only if its
//! usage domain suits the base item and it is exactly the next tier (for
//! fundamental slots) or a new, unique property rune (for property slots).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wb_core::rune::MAX_FUNDAMENTAL_TIER;
use wb_core::{ItemData, RuneDefinition, RuneKind, RuneState, RuneUsage};

use crate::error::{EngineError, EngineResult};

/// Names a slot on a base item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    /// The potency slot.
    Potency,
    /// The striking (weapon) or resilient (armor) slot.
    Secondary,
    /// A property slot, zero-based.
    Property(usize),
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Potency => write!(f, "potency"),
            Self::Secondary => write!(f, "secondary"),
            Self::Property(i) => write!(f, "property-{}", i + 1),
        }
    }
}

impl FromStr for SlotKey {
    type Err = EngineError;

    /// Parse `potency`, `secondary`, or `property-N` (one-based).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "potency" => Ok(Self::Potency),
            "secondary" | "striking" | "resilient" => Ok(Self::Secondary),
            other => other
                .strip_prefix("property-")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .map(|n| Self::Property(n - 1))
                .ok_or_else(|| EngineError::InvalidInput(format!("unknown rune slot: {other}"))),
        }
    }
}

/// What a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Potency rune.
    Potency,
    /// Striking or resilient rune.
    Secondary,
    /// Property rune.
    Property,
}

/// A slot on a base item, derived from its current runes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneSlot {
    /// Which slot.
    pub key: SlotKey,
    /// What it holds.
    pub kind: SlotKind,
    /// Tier of the fundamental rune here; 0 for property slots.
    pub current_tier: u8,
    /// The property rune etched here.
    pub occupant: Option<String>,
    /// Returns true if nothing is etched here.
    pub is_empty: bool,
    /// Returns true if a higher-tier or greater rune could replace the current one.
    pub can_upgrade: bool,
}

/// Why a rune does not fit a slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Incompatibility {
    /// The rune's usage domain does not suit the base item.
    #[error("a {rune} rune cannot be etched onto a {base} in the {slot} slot")]
    WrongUsage {
        /// Rune usage.
        rune: RuneUsage,
        /// Base item usage.
        base: RuneUsage,
        /// Target slot.
        slot: SlotKey,
    },
    /// The rune's kind does not belong in the slot.
    #[error("this rune does not belong in the {0} slot")]
    WrongSlotKind(SlotKey),
    /// A fundamental rune skipped or repeated a tier.
    #[error("slot {slot} is at tier {current}; only tier {} can be etched, not {offered}", .current + 1)]
    WrongTier {
        /// Target slot.
        slot: SlotKey,
        /// Tier currently etched.
        current: u8,
        /// Tier offered.
        offered: u8,
    },
    /// The fundamental slot is already at the top tier.
    #[error("slot {0} is already at the highest tier")]
    MaxTier(SlotKey),
    /// The same property rune is etched elsewhere on the item.
    #[error("{0} is already etched on this item")]
    Duplicate(String),
    /// The property slot holds a rune the candidate does not upgrade.
    #[error("slot {slot} already holds {occupant}")]
    Occupied {
        /// Target slot.
        slot: SlotKey,
        /// Rune in the slot.
        occupant: String,
    },
}

/// Answers slot questions for one base item.
#[derive(Debug, Clone, Copy)]
pub struct RuneMatcher<'a> {
    usage: RuneUsage,
    runes: &'a RuneState,
}

static NO_RUNES: RuneState = RuneState {
    potency: 0,
    secondary: 0,
    property: Vec::new(),
};

impl<'a> RuneMatcher<'a> {
    /// A matcher for a base item with the given usage and runes.
    pub fn new(usage: RuneUsage, runes: &'a RuneState) -> Self {
        Self { usage, runes }
    }

    /// A matcher for a weapon, armor, or shield. Items without a recorded
    /// rune state are treated as unrune'd.
    pub fn for_item(item: &'a ItemData) -> EngineResult<Self> {
        let usage = item.kind.rune_usage().ok_or_else(|| {
            EngineError::InvalidInput(format!("{} ({}) cannot carry runes", item.name, item.kind))
        })?;
        let runes = item.runes.as_ref().unwrap_or(&NO_RUNES);
        runes.validate()?;
        Ok(Self::new(usage, runes))
    }

    /// The base item's usage domain.
    pub fn usage(&self) -> RuneUsage {
        self.usage
    }

    /// All slots of the base item: potency, secondary, then one property
    /// slot per potency tier.
    pub fn available_slots(&self) -> Vec<RuneSlot> {
        let mut slots = vec![
            fundamental_slot(SlotKey::Potency, SlotKind::Potency, self.runes.potency),
            fundamental_slot(SlotKey::Secondary, SlotKind::Secondary, self.runes.secondary),
        ];
        for index in 0..self.runes.property_slot_count() {
            let occupant = self.runes.property_at(index).map(str::to_string);
            slots.push(RuneSlot {
                key: SlotKey::Property(index),
                kind: SlotKind::Property,
                current_tier: 0,
                is_empty: occupant.is_none(),
                can_upgrade: occupant.is_some(),
                occupant,
            });
        }
        slots
    }

    /// The slot named `key`, if the base item has it.
    pub fn slot(&self, key: SlotKey) -> Option<RuneSlot> {
        self.available_slots().into_iter().find(|s| s.key == key)
    }

    /// Returns true if `candidate` may be etched into `slot`.
    pub fn is_compatible(&self, candidate: &RuneDefinition, slot: &RuneSlot) -> bool {
        self.check(candidate, slot).is_ok()
    }

    /// Slots `candidate` could be etched into.
    pub fn compatible_slots(&self, candidate: &RuneDefinition) -> Vec<RuneSlot> {
        self.available_slots()
            .into_iter()
            .filter(|slot| self.is_compatible(candidate, slot))
            .collect()
    }

    /// Check `candidate` against `slot`, explaining any mismatch.
    pub fn check(
        &self,
        candidate: &RuneDefinition,
        slot: &RuneSlot,
    ) -> Result<(), Incompatibility> {
        let fundamental_slot = slot.kind != SlotKind::Property;
        if !self.usage_allows(candidate.usage, fundamental_slot) {
            return Err(Incompatibility::WrongUsage {
                rune: candidate.usage,
                base: self.usage,
                slot: slot.key,
            });
        }

        match (slot.kind, &candidate.kind) {
            (SlotKind::Potency, RuneKind::Potency { tier }) => next_tier(slot, *tier),
            (SlotKind::Secondary, RuneKind::Striking { tier })
                if self.secondary_accepts_striking() =>
            {
                next_tier(slot, *tier)
            }
            (SlotKind::Secondary, RuneKind::Resilient { tier })
                if self.secondary_accepts_resilient() =>
            {
                next_tier(slot, *tier)
            }
            (SlotKind::Property, RuneKind::Property { upgrades_from }) => {
                self.check_property(candidate, slot, upgrades_from.as_deref())
            }
            _ => Err(Incompatibility::WrongSlotKind(slot.key)),
        }
    }

    /// The rune state after etching `candidate` into `slot`. Does not re-check compatibility.
    pub fn etched(&self, candidate: &RuneDefinition, slot: &RuneSlot) -> RuneState {
        let mut next = self.runes.clone();
        match (slot.key, candidate.kind.tier()) {
            (SlotKey::Potency, Some(tier)) => next.potency = tier,
            (SlotKey::Secondary, Some(tier)) => next.secondary = tier,
            (SlotKey::Property(index), _) => next.set_property(index, &candidate.slug),
            _ => {}
        }
        next
    }

    fn check_property(
        &self,
        candidate: &RuneDefinition,
        slot: &RuneSlot,
        upgrades_from: Option<&str>,
    ) -> Result<(), Incompatibility> {
        if slot.occupant.as_deref() == Some(candidate.slug.as_str()) {
            return Err(Incompatibility::Duplicate(candidate.slug.clone()));
        }
        if self.runes.has_property(&candidate.slug) {
            return Err(Incompatibility::Duplicate(candidate.slug.clone()));
        }
        match &slot.occupant {
            None => Ok(()),
            Some(occupant) if upgrades_from == Some(occupant.as_str()) => Ok(()),
            Some(occupant) => Err(Incompatibility::Occupied {
                slot: slot.key,
                occupant: occupant.clone(),
            }),
        }
    }

    /// Shields take shield and armor runes anywhere, and weapon runes only
    /// in fundamental slots.
    fn usage_allows(&self, rune: RuneUsage, fundamental_slot: bool) -> bool {
        match self.usage {
            RuneUsage::Weapon => rune == RuneUsage::Weapon,
            RuneUsage::Armor => rune == RuneUsage::Armor,
            RuneUsage::Shield => match rune {
                RuneUsage::Shield | RuneUsage::Armor => true,
                RuneUsage::Weapon => fundamental_slot,
            },
        }
    }

    fn secondary_accepts_striking(&self) -> bool {
        matches!(self.usage, RuneUsage::Weapon | RuneUsage::Shield)
    }

    fn secondary_accepts_resilient(&self) -> bool {
        matches!(self.usage, RuneUsage::Armor | RuneUsage::Shield)
    }
}

fn fundamental_slot(key: SlotKey, kind: SlotKind, tier: u8) -> RuneSlot {
    RuneSlot {
        key,
        kind,
        current_tier: tier,
        occupant: None,
        is_empty: tier == 0,
        can_upgrade: tier < MAX_FUNDAMENTAL_TIER,
    }
}

fn next_tier(slot: &RuneSlot, offered: u8) -> Result<(), Incompatibility> {
    if slot.current_tier >= MAX_FUNDAMENTAL_TIER {
        return Err(Incompatibility::MaxTier(slot.key));
    }
    if offered == slot.current_tier + 1 {
        Ok(())
    } else {
        Err(Incompatibility::WrongTier {
            slot: slot.key,
            current: slot.current_tier,
            offered,
        })
    }
}
