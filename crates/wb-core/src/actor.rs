use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{ActorId, DocumentRef};

/// A formula an actor knows, entitling them to craft its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaEntry {
    /// Catalog address of the item the formula produces.
    pub target: DocumentRef,
    /// Name of the target item.
    pub name: String,
    /// Level of the target item.
    #[serde(default)]
    pub level: u32,
}

impl FormulaEntry {
    /// Formula book order: by level, then by name.
    pub fn book_order(a: &Self, b: &Self) -> Ordering {
        a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name))
    }
}

/// The parts of an actor the outcome engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorView {
    /// Actor identifier.
    #[serde(default)]
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Character level.
    #[serde(default)]
    pub level: u32,
    /// Feat slugs the actor has taken.
    #[serde(default)]
    pub feats: BTreeSet<String>,
    /// Known formulas.
    #[serde(default)]
    pub known_formulas: Vec<FormulaEntry>,
}

impl ActorView {
    /// Create an actor with no feats or formulas.
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            level,
            feats: BTreeSet::new(),
            known_formulas: Vec::new(),
        }
    }

    /// Add a feat slug.
    pub fn with_feat(mut self, slug: &str) -> Self {
        self.feats.insert(slug.to_string());
        self
    }

    /// Add a known formula.
    pub fn with_formula(mut self, formula: FormulaEntry) -> Self {
        self.known_formulas.push(formula);
        self
    }

    /// Returns true if the actor already knows a formula for `target`.
    pub fn knows_formula(&self, target: &DocumentRef) -> bool {
        self.known_formulas.iter().any(|f| &f.target == target)
    }

    /// The formula book with `formula` added, in book order.
    /// Returns the book unchanged if the formula is already known.
    pub fn formulas_with(&self, formula: FormulaEntry) -> Vec<FormulaEntry> {
        let mut book = self.known_formulas.clone();
        if !self.knows_formula(&formula.target) {
            book.push(formula);
        }
        book.sort_by(FormulaEntry::book_order);
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(name: &str, level: u32) -> FormulaEntry {
        FormulaEntry {
            target: DocumentRef::new(format!("Compendium.equipment.Item.{name}")),
            name: name.to_string(),
            level,
        }
    }

    #[test]
    fn formulas_sorted_by_level_then_name() {
        let actor = ActorView::new("Mira", 5)
            .with_formula(formula("rope", 0))
            .with_formula(formula("lantern", 3))
            .with_formula(formula("caltrops", 3));
        let book = actor.formulas_with(formula("antidote", 1));
        let names: Vec<&str> = book.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["rope", "antidote", "caltrops", "lantern"]);
    }

    #[test]
    fn known_formula_not_duplicated() {
        let actor = ActorView::new("Mira", 5).with_formula(formula("rope", 0));
        let book = actor.formulas_with(formula("rope", 0));
        assert_eq!(book.len(), 1);
        assert!(actor.knows_formula(&formula("rope", 0).target));
    }
}
