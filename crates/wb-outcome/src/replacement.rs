//! Deceptive replacement selection.
//!
//! When an identification critically fails, the true item is swapped for a
//! plausible substitute that the player believes they identified. Candidates
//! come from the configured item indexes, restricted to physical items near
//! the actor's level, and are narrowed by how closely they resemble the
//! original before one is picked at random.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use wb_core::{ActorView, IdentificationState, IndexEntry, ItemData, ItemKind};

use crate::collaborators::{ItemDefinitionFetch, ItemIndexSearch};
use crate::config::{ReplacementConfig, ReplacementNaming};
use crate::error::{EngineError, EngineResult};

/// Consumable traits distinctive enough to match on.
const SALIENT_CONSUMABLE_TRAITS: &[&str] =
    &["potion", "scroll", "elixir", "talisman", "oil", "poison"];

/// Equipment traits distinctive enough to match on.
const SALIENT_EQUIPMENT_TRAITS: &[&str] = &["wand", "staff"];

/// How closely the chosen candidate resembles the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTier {
    /// Same weapon/armor group, consumable trait, or wand/staff trait.
    Specific,
    /// Same coarse item type.
    SameKind,
    /// Anything in the level window.
    Any,
}

impl fmt::Display for SelectionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Specific => write!(f, "specific"),
            Self::SameKind => write!(f, "same kind"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// A chosen substitute, ready to be created in place of the original.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    /// The index entry that was picked.
    pub selected: IndexEntry,
    /// Which narrowing tier produced it.
    pub tier: SelectionTier,
    /// Item data for the new inventory item.
    pub data: ItemData,
}

/// Select and materialize a substitute for `original`.
///
/// Fails with [`EngineError::NoReplacementAvailable`] if no tier yields a
/// candidate or the fetched definition is not a physical item.
pub async fn select_replacement(
    index: &dyn ItemIndexSearch,
    fetch: &dyn ItemDefinitionFetch,
    original: &ItemData,
    actor: &ActorView,
    config: &ReplacementConfig,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> EngineResult<Replacement> {
    let min_level = actor.level.saturating_sub(config.levels_below);
    let max_level = actor.level.saturating_add(config.levels_above);
    let eligible = |entry: &IndexEntry| {
        entry.kind.is_physical()
            && entry.kind != ItemKind::Formula
            && !is_original(entry, original)
            && (min_level..=max_level).contains(&entry.level)
    };

    let mut pool = index.search(&config.pools, &eligible).await?;
    pool.retain(eligible);

    let (tier, candidates) = narrow(&pool, original);
    tracing::debug!(
        pool = pool.len(),
        candidates = candidates.len(),
        %tier,
        min_level,
        max_level,
        "replacement candidates"
    );
    if candidates.is_empty() {
        return Err(EngineError::NoReplacementAvailable(format!(
            "no physical items between level {min_level} and {max_level} in {:?}",
            config.pools
        )));
    }

    let selected = candidates[rng.random_range(0..candidates.len())].clone();
    let definition = fetch.fetch(&selected.id).await?.ok_or_else(|| {
        EngineError::NoReplacementAvailable(format!("{} could not be fetched", selected.id))
    })?;
    if !definition.kind.is_physical() {
        return Err(EngineError::NoReplacementAvailable(format!(
            "{} is a {}, not a physical item",
            selected.id, definition.kind
        )));
    }

    let data = build_replacement(&selected, definition, original, actor, &config.naming, now);
    Ok(Replacement {
        selected,
        tier,
        data,
    })
}

fn is_original(entry: &IndexEntry, original: &ItemData) -> bool {
    match &original.origin {
        Some(origin) => &entry.id == origin,
        None => entry.name == original.name,
    }
}

/// Narrow the pool tier by tier, returning the first non-empty one.
fn narrow<'p>(pool: &'p [IndexEntry], original: &ItemData) -> (SelectionTier, Vec<&'p IndexEntry>) {
    let specific = specific_matches(pool, original);
    if !specific.is_empty() {
        return (SelectionTier::Specific, specific);
    }
    let same_kind: Vec<&IndexEntry> = pool.iter().filter(|e| e.kind == original.kind).collect();
    if !same_kind.is_empty() {
        return (SelectionTier::SameKind, same_kind);
    }
    (SelectionTier::Any, pool.iter().collect())
}

fn specific_matches<'p>(pool: &'p [IndexEntry], original: &ItemData) -> Vec<&'p IndexEntry> {
    let same_kind = |e: &&IndexEntry| e.kind == original.kind;
    match (&original.kind, original.group.as_deref()) {
        (ItemKind::Weapon, Some(group)) => pool
            .iter()
            .filter(same_kind)
            .filter(|e| e.group.as_deref() == Some(group))
            .collect(),
        (ItemKind::Armor, Some(group)) => {
            let same_group: Vec<&IndexEntry> = pool
                .iter()
                .filter(same_kind)
                .filter(|e| e.group.as_deref() == Some(group))
                .collect();
            let same_category: Vec<&IndexEntry> = same_group
                .iter()
                .copied()
                .filter(|e| original.category.is_some() && e.category == original.category)
                .collect();
            if same_category.is_empty() {
                same_group
            } else {
                same_category
            }
        }
        (ItemKind::Consumable, _) => trait_matches(pool, original, SALIENT_CONSUMABLE_TRAITS),
        (ItemKind::Equipment, _) => trait_matches(pool, original, SALIENT_EQUIPMENT_TRAITS),
        _ => Vec::new(),
    }
}

fn trait_matches<'p>(
    pool: &'p [IndexEntry],
    original: &ItemData,
    salient: &[&str],
) -> Vec<&'p IndexEntry> {
    match original.traits.first_of(salient) {
        Some(t) => pool
            .iter()
            .filter(|e| e.kind == original.kind && e.traits.contains(t))
            .collect(),
        None => Vec::new(),
    }
}

/// `name` without a trailing "(Id by ...)" marker.
fn strip_identifier_suffix(name: &str) -> &str {
    match name.rfind(" (Id by ") {
        Some(start) if name.ends_with(')') => name[..start].trim_end(),
        _ => name,
    }
}

/// The name a wrongly identified item is shown under.
pub fn replacement_name(base: &str, actor: &str, naming: &ReplacementNaming) -> String {
    match naming {
        ReplacementNaming::Suffix => {
            format!("{} (Id by {actor})", strip_identifier_suffix(base))
        }
        ReplacementNaming::Prefix { marker } => {
            if base.starts_with(marker.as_str()) {
                base.to_string()
            } else {
                format!("{marker} {base}")
            }
        }
    }
}

fn build_replacement(
    selected: &IndexEntry,
    definition: ItemData,
    original: &ItemData,
    actor: &ActorView,
    naming: &ReplacementNaming,
    now: DateTime<Utc>,
) -> ItemData {
    let name = replacement_name(&definition.name, &actor.name, naming);
    let gm_note = format!(
        "Misidentified on {} by {}. The true item, {} ({}, level {}), was discarded. \
         The player does not know.",
        now.format("%Y-%m-%d %H:%M UTC"),
        actor.name,
        original.name,
        original.kind,
        original.level,
    );
    ItemData {
        origin: Some(selected.id.clone()),
        name,
        quantity: 1,
        gm_description: Some(gm_note),
        identification: IdentificationState::default(),
        ..definition
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use wb_core::DocumentRef;

    use super::*;
    use crate::memory::MemoryCatalog;

    fn weapon(name: &str, level: u32, group: &str) -> ItemData {
        ItemData::new(name, ItemKind::Weapon)
            .with_level(level)
            .with_group(group)
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with("equipment", "eq.longsword", weapon("Longsword", 2, "sword"))
            .with("equipment", "eq.scimitar", weapon("Scimitar", 3, "sword"))
            .with("equipment", "eq.warhammer", weapon("Warhammer", 3, "hammer"))
            .with(
                "equipment",
                "eq.full-plate",
                ItemData::new("Full Plate", ItemKind::Armor)
                    .with_level(2)
                    .with_group("plate")
                    .with_category("heavy"),
            )
            .with(
                "equipment",
                "eq.half-plate",
                ItemData::new("Half Plate", ItemKind::Armor)
                    .with_level(2)
                    .with_group("plate")
                    .with_category("heavy"),
            )
            .with(
                "equipment",
                "eq.healing-potion",
                ItemData::new("Healing Potion", ItemKind::Consumable)
                    .with_level(3)
                    .with_traits(["potion", "healing"]),
            )
            .with(
                "equipment",
                "eq.fire-scroll",
                ItemData::new("Scroll of Fire", ItemKind::Consumable)
                    .with_level(3)
                    .with_traits(["scroll"]),
            )
            .with(
                "equipment",
                "eq.formula",
                ItemData::new("Formula: Longsword", ItemKind::Formula).with_level(2),
            )
            .with(
                "equipment",
                "eq.ancient-blade",
                weapon("Ancient Blade", 15, "sword"),
            )
    }

    fn original_longsword() -> ItemData {
        weapon("Longsword", 2, "sword")
            .with_origin(DocumentRef::new("eq.longsword"))
            .unidentified("Strange Sword")
    }

    async fn select(
        original: &ItemData,
        actor: &ActorView,
        seed: u64,
    ) -> EngineResult<Replacement> {
        let c = catalog();
        let mut rng = StdRng::seed_from_u64(seed);
        select_replacement(
            &c,
            &c,
            original,
            actor,
            &ReplacementConfig::default(),
            &mut rng,
            Utc::now(),
        )
        .await
    }

    #[tokio::test]
    async fn weapon_replaced_by_same_group() {
        let actor = ActorView::new("Ilse", 2);
        let r = select(&original_longsword(), &actor, 1).await.unwrap();
        assert_eq!(r.tier, SelectionTier::Specific);
        assert_eq!(r.selected.id, DocumentRef::new("eq.scimitar"));
        assert_eq!(r.data.name, "Scimitar (Id by Ilse)");
        assert_eq!(r.data.quantity, 1);
        assert!(r.data.identification.is_identified());
        let note = r.data.gm_description.unwrap();
        assert!(note.contains("Longsword"));
        assert!(note.contains("Ilse"));
        assert!(note.contains("level 2"));
    }

    #[tokio::test]
    async fn never_selects_original() {
        let actor = ActorView::new("Ilse", 2);
        let original = original_longsword();
        for seed in 0..50 {
            let r = select(&original, &actor, seed).await.unwrap();
            assert_ne!(Some(&r.selected.id), original.origin.as_ref());
            assert_ne!(r.selected.kind, ItemKind::Formula);
        }
    }

    #[tokio::test]
    async fn armor_narrows_by_category() {
        let actor = ActorView::new("Ilse", 2);
        let original = ItemData::new("Full Plate", ItemKind::Armor)
            .with_level(2)
            .with_group("plate")
            .with_category("heavy")
            .with_origin(DocumentRef::new("eq.full-plate"));
        let r = select(&original, &actor, 3).await.unwrap();
        assert_eq!(r.tier, SelectionTier::Specific);
        assert_eq!(r.data.name, "Half Plate (Id by Ilse)");
    }

    #[tokio::test]
    async fn consumable_matches_salient_trait() {
        let actor = ActorView::new("Ilse", 2);
        let original = ItemData::new("Elixir of Life", ItemKind::Consumable)
            .with_level(2)
            .with_traits(["potion"]);
        for seed in 0..10 {
            let r = select(&original, &actor, seed).await.unwrap();
            assert_eq!(r.selected.name, "Healing Potion");
        }
    }

    #[tokio::test]
    async fn falls_back_to_same_kind_then_any() {
        let actor = ActorView::new("Ilse", 2);
        let club = weapon("Club", 0, "club");
        let r = select(&club, &actor, 5).await.unwrap();
        assert_eq!(r.tier, SelectionTier::SameKind);
        assert_eq!(r.selected.kind, ItemKind::Weapon);

        let shield = ItemData::new("Buckler", ItemKind::Shield).with_level(1);
        let r = select(&shield, &actor, 5).await.unwrap();
        assert_eq!(r.tier, SelectionTier::Any);
    }

    #[tokio::test]
    async fn level_window_excludes_distant_items() {
        let actor = ActorView::new("Ilse", 2);
        for seed in 0..30 {
            let r = select(&original_longsword(), &actor, seed).await.unwrap();
            assert!(r.selected.level <= 5);
        }
    }

    #[tokio::test]
    async fn empty_window_is_no_replacement() {
        let actor = ActorView::new("Ilse", 9);
        let result = select(&original_longsword(), &actor, 1).await;
        assert!(matches!(result, Err(EngineError::NoReplacementAvailable(_))));
    }

    #[test]
    fn suffix_is_not_duplicated() {
        let named = replacement_name("Scimitar", "Ilse", &ReplacementNaming::Suffix);
        assert_eq!(named, "Scimitar (Id by Ilse)");
        assert_eq!(
            replacement_name(&named, "Ilse", &ReplacementNaming::Suffix),
            named
        );
    }

    #[test]
    fn earlier_identifier_suffix_is_replaced() {
        let naming = ReplacementNaming::Suffix;
        assert_eq!(
            replacement_name("Scimitar (Id by Brom)", "Ilse", &naming),
            "Scimitar (Id by Ilse)"
        );
        assert_eq!(
            replacement_name("Potion (Minor)", "Ilse", &naming),
            "Potion (Minor) (Id by Ilse)"
        );
    }

    #[tokio::test]
    async fn huge_level_window_does_not_overflow() {
        let c = catalog();
        let actor = ActorView::new("Ilse", u32::MAX - 1);
        let config = ReplacementConfig {
            levels_below: u32::MAX,
            levels_above: u32::MAX,
            ..ReplacementConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let r = select_replacement(
            &c,
            &c,
            &original_longsword(),
            &actor,
            &config,
            &mut rng,
            Utc::now(),
        )
        .await
        .unwrap();
        assert_ne!(r.selected.id, DocumentRef::new("eq.longsword"));
    }

    #[test]
    fn prefix_marker() {
        let naming = ReplacementNaming::Prefix {
            marker: "\u{2731}".to_string(),
        };
        let named = replacement_name("Scimitar", "Ilse", &naming);
        assert_eq!(named, "\u{2731} Scimitar");
        assert_eq!(replacement_name(&named, "Ilse", &naming), named);
    }
}
