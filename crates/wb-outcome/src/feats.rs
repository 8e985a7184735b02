//! Typed feat capabilities.
//!
//! Feats are configured by slug, but each slug is resolved once into a
//! closed set of [`FeatCapability`] values. Resolvers ask a [`Capabilities`]
//! value questions instead of comparing slug strings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use wb_core::{ActorView, TraitSet};

/// A skill usable for crafting-adjacent checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Arcane magic.
    Arcana,
    /// Making and repairing items.
    Crafting,
    /// Primal magic.
    Nature,
    /// Occult magic.
    Occultism,
    /// Divine magic.
    Religion,
    /// Civilizations and history.
    Society,
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arcana => write!(f, "Arcana"),
            Self::Crafting => write!(f, "Crafting"),
            Self::Nature => write!(f, "Nature"),
            Self::Occultism => write!(f, "Occultism"),
            Self::Religion => write!(f, "Religion"),
            Self::Society => write!(f, "Society"),
        }
    }
}

/// An effect a feat has on how an outcome is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeEffect {
    /// Identification critical failures count as failures.
    AssuredIdentification,
}

/// How long an activity takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTime {
    /// A number of actions within one round.
    Actions(u8),
    /// Minutes.
    Minutes(u32),
    /// Hours.
    Hours(u32),
    /// Days of downtime.
    Days(u32),
}

impl fmt::Display for ActivityTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, unit) = match *self {
            Self::Actions(n) => (u32::from(n), "action"),
            Self::Minutes(n) => (n, "minute"),
            Self::Hours(n) => (n, "hour"),
            Self::Days(n) => (n, "day"),
        };
        write!(f, "{n} {unit}{}", if n == 1 { "" } else { "s" })
    }
}

/// When a roll modifier applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "when")]
pub enum RollCondition {
    /// Always.
    Always,
    /// When the item has at least one of the traits.
    AnyTrait {
        /// Trait slugs.
        traits: Vec<String>,
    },
}

impl RollCondition {
    /// Returns true if the condition holds for an item with `traits`.
    pub fn holds(&self, traits: &TraitSet) -> bool {
        match self {
            Self::Always => true,
            Self::AnyTrait { traits: wanted } => wanted.iter().any(|t| traits.contains(t)),
        }
    }
}

/// What a feat lets its owner do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "capability")]
pub enum FeatCapability {
    /// Use `skill` in place of the usual skill.
    SkillSubstitution {
        /// The substitute skill.
        skill: Skill,
    },
    /// Change how a degree of success is interpreted.
    OutcomeModifier {
        /// The effect.
        effect: OutcomeEffect,
    },
    /// Replace the activity's duration.
    TimeModifier {
        /// The new duration.
        time: ActivityTime,
    },
    /// Add a bonus to the check when `condition` holds.
    RollModifier {
        /// Circumstance bonus.
        bonus: i32,
        /// When the bonus applies.
        condition: RollCondition,
    },
}

/// Maps feat slugs to their capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatCatalog(BTreeMap<String, Vec<FeatCapability>>);

impl Default for FeatCatalog {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(
            "assured-identification".to_string(),
            vec![FeatCapability::OutcomeModifier {
                effect: OutcomeEffect::AssuredIdentification,
            }],
        );
        map.insert(
            "quick-identification".to_string(),
            vec![FeatCapability::TimeModifier {
                time: ActivityTime::Minutes(1),
            }],
        );
        map.insert(
            "crafters-appraisal".to_string(),
            vec![FeatCapability::SkillSubstitution {
                skill: Skill::Crafting,
            }],
        );
        map.insert(
            "scholastic-identification".to_string(),
            vec![FeatCapability::SkillSubstitution {
                skill: Skill::Society,
            }],
        );
        map.insert(
            "oddity-identification".to_string(),
            vec![FeatCapability::RollModifier {
                bonus: 2,
                condition: RollCondition::AnyTrait {
                    traits: ["mental", "possession", "prediction", "scrying"]
                        .map(String::from)
                        .to_vec(),
                },
            }],
        );
        Self(map)
    }
}

impl FeatCatalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Register capabilities for a feat slug, replacing any existing entry.
    pub fn insert(&mut self, slug: &str, capabilities: Vec<FeatCapability>) {
        self.0.insert(slug.to_string(), capabilities);
    }

    /// Capabilities granted by one feat.
    pub fn get(&self, slug: &str) -> &[FeatCapability] {
        self.0.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The resolved capabilities of one actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(Vec<FeatCapability>);

impl Capabilities {
    /// Resolve an actor's feats through the catalog. Unknown slugs grant nothing.
    pub fn for_actor(actor: &ActorView, catalog: &FeatCatalog) -> Self {
        Self(
            actor
                .feats
                .iter()
                .flat_map(|slug| catalog.get(slug).iter().cloned())
                .collect(),
        )
    }

    /// Build from an explicit list.
    pub fn from_list(capabilities: Vec<FeatCapability>) -> Self {
        Self(capabilities)
    }

    /// Returns true if any feat grants `effect`.
    pub fn has_effect(&self, effect: OutcomeEffect) -> bool {
        self.0
            .iter()
            .any(|c| matches!(c, FeatCapability::OutcomeModifier { effect: e } if *e == effect))
    }

    /// Skills granted as substitutes.
    pub fn substitute_skills(&self) -> impl Iterator<Item = Skill> + '_ {
        self.0.iter().filter_map(|c| match c {
            FeatCapability::SkillSubstitution { skill } => Some(*skill),
            _ => None,
        })
    }

    /// The shortest duration any time modifier grants.
    pub fn time_override(&self) -> Option<ActivityTime> {
        self.0
            .iter()
            .filter_map(|c| match c {
                FeatCapability::TimeModifier { time } => Some(*time),
                _ => None,
            })
            .min_by_key(|t| minutes_of(*t))
    }

    /// Total bonus from roll modifiers whose condition holds for `traits`.
    pub fn roll_bonus(&self, traits: &TraitSet) -> i32 {
        self.0
            .iter()
            .filter_map(|c| match c {
                FeatCapability::RollModifier { bonus, condition } if condition.holds(traits) => {
                    Some(*bonus)
                }
                _ => None,
            })
            .sum()
    }
}

/// Rough duration in minutes, for comparing time modifiers. A round is 6 seconds.
fn minutes_of(time: ActivityTime) -> u32 {
    match time {
        ActivityTime::Actions(_) => 0,
        ActivityTime::Minutes(n) => n,
        ActivityTime::Hours(n) => n * 60,
        ActivityTime::Days(n) => n * 60 * 8,
    }
}
