use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{ActorId, DocumentRef, ItemId};
use crate::price::Price;
use crate::rune::{RuneState, RuneUsage};

/// Item rarity. Ordered from most to least available.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Freely available.
    #[default]
    Common,
    /// Restricted to certain regions or groups.
    Uncommon,
    /// Few copies exist.
    Rare,
    /// One of a kind.
    Unique,
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "common"),
            Self::Uncommon => write!(f, "uncommon"),
            Self::Rare => write!(f, "rare"),
            Self::Unique => write!(f, "unique"),
        }
    }
}

impl FromStr for Rarity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "uncommon" => Ok(Self::Uncommon),
            "rare" => Ok(Self::Rare),
            "unique" => Ok(Self::Unique),
            _ => Err(CoreError::UnknownRarity(s.to_string())),
        }
    }
}

/// The coarse document type of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A weapon.
    Weapon,
    /// Worn armor.
    Armor,
    /// A shield.
    Shield,
    /// Worn or held gear (wands and staves included).
    Equipment,
    /// Potions, scrolls, elixirs, talismans, ammunition.
    Consumable,
    /// Coins, gems, art objects.
    Treasure,
    /// A container.
    Backpack,
    /// A book.
    Book,
    /// A formula record. Not a physical item.
    Formula,
    /// A feat. Not a physical item.
    Feat,
    /// A spell. Not a physical item.
    Spell,
    /// A host-defined type not covered above. Treated as non-physical.
    Custom(String),
}

impl ItemKind {
    /// Returns true for kinds that exist as objects in an inventory.
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            Self::Weapon
                | Self::Armor
                | Self::Shield
                | Self::Equipment
                | Self::Consumable
                | Self::Treasure
                | Self::Backpack
                | Self::Book
        )
    }

    /// The rune usage domain of this kind, if it can carry runes.
    pub fn rune_usage(&self) -> Option<RuneUsage> {
        match self {
            Self::Weapon => Some(RuneUsage::Weapon),
            Self::Armor => Some(RuneUsage::Armor),
            Self::Shield => Some(RuneUsage::Shield),
            _ => None,
        }
    }

    /// Parse a kind from its document type name.
    pub fn parse(s: &str) -> Self {
        match s {
            "weapon" => Self::Weapon,
            "armor" => Self::Armor,
            "shield" => Self::Shield,
            "equipment" => Self::Equipment,
            "consumable" => Self::Consumable,
            "treasure" => Self::Treasure,
            "backpack" => Self::Backpack,
            "book" => Self::Book,
            "formula" => Self::Formula,
            "feat" => Self::Feat,
            "spell" => Self::Spell,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Shield => write!(f, "shield"),
            Self::Equipment => write!(f, "equipment"),
            Self::Consumable => write!(f, "consumable"),
            Self::Treasure => write!(f, "treasure"),
            Self::Backpack => write!(f, "backpack"),
            Self::Book => write!(f, "book"),
            Self::Formula => write!(f, "formula"),
            Self::Feat => write!(f, "feat"),
            Self::Spell => write!(f, "spell"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// A set of lowercase trait slugs (e.g. `magical`, `arcane`, `potion`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TraitSet(BTreeSet<String>);

impl TraitSet {
    /// Create an empty trait set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the trait is present (case-insensitive).
    pub fn contains(&self, slug: &str) -> bool {
        self.0.contains(&slug.to_lowercase())
    }

    /// Returns the first of `candidates` present in this set.
    pub fn first_of<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.contains(c))
    }

    /// Add a trait.
    pub fn insert(&mut self, slug: &str) {
        self.0.insert(slug.to_lowercase());
    }

    /// Iterate over the traits in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of traits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no traits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TraitSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.as_ref().to_lowercase()).collect())
    }
}

impl From<Vec<String>> for TraitSet {
    fn from(slugs: Vec<String>) -> Self {
        slugs.into_iter().collect()
    }
}

impl From<TraitSet> for Vec<String> {
    fn from(traits: TraitSet) -> Self {
        traits.0.into_iter().collect()
    }
}

/// Whether the owner knows what an item is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationStatus {
    /// The item's true name and properties are known.
    #[default]
    Identified,
    /// The item is shown under a generic name.
    Unidentified,
}

/// A failed identification attempt. The actor may not retry on this item
/// until their level exceeds `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryMarker {
    /// The actor who failed.
    pub actor: ActorId,
    /// The actor's level at the time of the attempt.
    pub level: u32,
}

/// Identification bookkeeping carried on an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationState {
    /// Current status.
    #[serde(default)]
    pub status: IdentificationStatus,
    /// Generic name shown while unidentified.
    #[serde(default)]
    pub unidentified_name: Option<String>,
    /// The most recent failed attempt, if any.
    #[serde(default)]
    pub failed_attempt: Option<RetryMarker>,
}

impl IdentificationState {
    /// An unidentified item shown under `generic_name`.
    pub fn unidentified(generic_name: impl Into<String>) -> Self {
        Self {
            status: IdentificationStatus::Unidentified,
            unidentified_name: Some(generic_name.into()),
            failed_attempt: None,
        }
    }

    /// Returns true if the item is identified.
    pub fn is_identified(&self) -> bool {
        self.status == IdentificationStatus::Identified
    }

    /// Returns true if `actor` failed on this item at `level` or higher
    /// and therefore may not retry yet.
    pub fn is_locked_out(&self, actor: ActorId, level: u32) -> bool {
        self.failed_attempt
            .is_some_and(|m| m.actor == actor && m.level >= level)
    }
}

/// The data of an item document, independent of who owns it.
///
/// This is both what catalogs return for a definition and what the
/// persistence layer receives when a new item is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    /// Catalog address this item was created from.
    #[serde(default)]
    pub origin: Option<DocumentRef>,
    /// Display name.
    pub name: String,
    /// Coarse document type.
    pub kind: ItemKind,
    /// Item level.
    #[serde(default)]
    pub level: u32,
    /// Rarity.
    #[serde(default)]
    pub rarity: Rarity,
    /// Trait slugs.
    #[serde(default)]
    pub traits: TraitSet,
    /// Stack size.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Price of one unit.
    #[serde(default)]
    pub price: Price,
    /// Weapon or armor group (e.g. `sword`, `plate`).
    #[serde(default)]
    pub group: Option<String>,
    /// Weapon or armor category (e.g. `martial`, `heavy`).
    #[serde(default)]
    pub category: Option<String>,
    /// Player-visible description.
    #[serde(default)]
    pub description: String,
    /// Description visible only to the game master.
    #[serde(default)]
    pub gm_description: Option<String>,
    /// Identification bookkeeping.
    #[serde(default)]
    pub identification: IdentificationState,
    /// Rune configuration, for weapons, armor, and shields.
    #[serde(default)]
    pub runes: Option<RuneState>,
}

fn default_quantity() -> u32 {
    1
}

impl ItemData {
    /// Create minimal item data of the given kind.
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            origin: None,
            name: name.into(),
            kind,
            level: 0,
            rarity: Rarity::Common,
            traits: TraitSet::new(),
            quantity: 1,
            price: Price::default(),
            group: None,
            category: None,
            description: String::new(),
            gm_description: None,
            identification: IdentificationState::default(),
            runes: None,
        }
    }

    /// Set the catalog origin.
    pub fn with_origin(mut self, origin: DocumentRef) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the item level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Set the rarity.
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    /// Set the traits.
    pub fn with_traits<S: AsRef<str>>(mut self, traits: impl IntoIterator<Item = S>) -> Self {
        self.traits = traits.into_iter().collect();
        self
    }

    /// Set the unit price.
    pub fn with_price(mut self, price: Price) -> Self {
        self.price = price;
        self
    }

    /// Set the stack size.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the weapon or armor group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the weapon or armor category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the rune configuration.
    pub fn with_runes(mut self, runes: RuneState) -> Self {
        self.runes = Some(runes);
        self
    }

    /// Set the player-visible description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the item unidentified under a generic name.
    pub fn unidentified(mut self, generic_name: impl Into<String>) -> Self {
        self.identification = IdentificationState::unidentified(generic_name);
        self
    }
}

/// An item owned by an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Inventory identifier.
    #[serde(default)]
    pub id: ItemId,
    /// The item's document data.
    #[serde(flatten)]
    pub data: ItemData,
}

impl InventoryItem {
    /// Put item data into an inventory under a fresh ID.
    pub fn new(data: ItemData) -> Self {
        Self {
            id: ItemId::new(),
            data,
        }
    }
}

/// A lightweight entry returned by a catalog index search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Catalog address of the full definition.
    pub id: DocumentRef,
    /// Display name.
    pub name: String,
    /// Coarse document type.
    pub kind: ItemKind,
    /// Item level.
    #[serde(default)]
    pub level: u32,
    /// Trait slugs.
    #[serde(default)]
    pub traits: TraitSet,
    /// Weapon or armor group.
    #[serde(default)]
    pub group: Option<String>,
    /// Weapon or armor category.
    #[serde(default)]
    pub category: Option<String>,
}

impl IndexEntry {
    /// Build the index entry for a definition stored at `id`.
    pub fn for_definition(id: DocumentRef, data: &ItemData) -> Self {
        Self {
            id,
            name: data.name.clone(),
            kind: data.kind.clone(),
            level: data.level,
            traits: data.traits.clone(),
            group: data.group.clone(),
            category: data.category.clone(),
        }
    }
}
