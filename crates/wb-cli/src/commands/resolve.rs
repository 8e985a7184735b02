use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use serde::Deserialize;
use serde_json::Value;
use wb_core::{ActorView, DocumentRef, InventoryItem, ItemData, ItemId, RuneDefinition};
use wb_outcome::resolve::{CraftingRequest, EtchingRequest};
use wb_outcome::{
    ActorChange, DegreeOfSuccess, ItemChange, MaterialLine, MemoryCatalog, MemoryConfig,
    Resolution, SlotKey, Workshop,
};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Action {
    Craft,
    Identify,
    Reverse,
    Etch,
}

/// An inventory stack offered as material.
#[derive(Debug, Deserialize)]
struct Material {
    #[serde(flatten)]
    stack: InventoryItem,
    /// Units committed; the whole stack when absent.
    committed: Option<u32>,
}

/// A resolution scenario: who acts, on what, with which materials.
#[derive(Debug, Deserialize)]
struct Scenario {
    action: Action,
    actor: ActorView,
    /// Item identified, reverse engineered, or etched.
    item: Option<InventoryItem>,
    /// Definition to craft.
    target: Option<ItemData>,
    #[serde(default)]
    materials: Vec<Material>,
    runestone: Option<InventoryItem>,
    rune: Option<RuneDefinition>,
    slot: Option<String>,
    /// Pool name to catalog address to definition.
    #[serde(default)]
    catalog: BTreeMap<String, BTreeMap<String, ItemData>>,
    config: Option<Value>,
}

impl Scenario {
    fn require<'a, T>(value: &'a Option<T>, field: &str, action: &str) -> Result<&'a T, String> {
        value
            .as_ref()
            .ok_or_else(|| format!("scenario for {action} needs '{field}'"))
    }

    fn material_lines(&self) -> Vec<MaterialLine> {
        self.materials
            .iter()
            .map(|m| {
                let held = m.stack.data.quantity;
                MaterialLine::new(
                    m.stack.id,
                    m.committed.unwrap_or(held),
                    held,
                    m.stack.data.price,
                )
            })
            .collect()
    }

    fn item_names(&self) -> HashMap<ItemId, String> {
        self.item
            .iter()
            .chain(self.materials.iter().map(|m| &m.stack))
            .chain(&self.runestone)
            .map(|i| (i.id, i.data.name.clone()))
            .collect()
    }
}

pub async fn run(path: &Path, degree: &str, seed: u64, json: bool) -> Result<(), String> {
    let degree: DegreeOfSuccess = degree
        .parse()
        .map_err(|e: wb_outcome::EngineError| e.to_string())?;
    let scenario: Scenario = super::read_json(path)?;

    let mut catalog = MemoryCatalog::new();
    for (pool, entries) in &scenario.catalog {
        for (id, data) in entries {
            catalog.insert(pool, DocumentRef::new(id.as_str()), data.clone());
        }
    }
    let settings = match &scenario.config {
        Some(value) => MemoryConfig::from_json(value.clone()).map_err(|e| e.to_string())?,
        None => MemoryConfig::new(),
    };
    let mut workshop = Workshop::new(catalog, settings, seed);

    let actor = &scenario.actor;
    let resolution = match scenario.action {
        Action::Craft => {
            let target = Scenario::require(&scenario.target, "target", "craft")?;
            let materials = scenario.material_lines();
            let request = CraftingRequest {
                actor,
                target,
                materials: &materials,
            };
            workshop.craft(degree, &request).await
        }
        Action::Identify => {
            let item = Scenario::require(&scenario.item, "item", "identify")?;
            workshop.identify(degree, actor, item).await
        }
        Action::Reverse => {
            let item = Scenario::require(&scenario.item, "item", "reverse")?;
            workshop.reverse_engineer(degree, actor, item).await
        }
        Action::Etch => {
            let base = Scenario::require(&scenario.item, "item", "etch")?;
            let runestone = Scenario::require(&scenario.runestone, "runestone", "etch")?;
            let rune = Scenario::require(&scenario.rune, "rune", "etch")?;
            let slot: SlotKey = Scenario::require(&scenario.slot, "slot", "etch")?
                .parse()
                .map_err(|e: wb_outcome::EngineError| e.to_string())?;
            let materials = scenario.material_lines();
            let request = EtchingRequest {
                actor,
                base,
                runestone,
                rune,
                slot,
                materials: &materials,
            };
            workshop.etch_rune(degree, &request).await
        }
    }
    .map_err(|e| e.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&resolution).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        print_resolution(&resolution, &scenario.item_names());
    }
    Ok(())
}

fn print_resolution(resolution: &Resolution, names: &HashMap<ItemId, String>) {
    let c = &resolution.consequence;
    println!("  {}", super::colorize_degree(c.degree));
    println!();
    if !c.narrative.is_empty() {
        println!("  {}", c.narrative);
    }
    if let Some(gm) = &c.gm_narrative {
        println!("  {} {}", "GM:".magenta().bold(), gm.dimmed());
    }

    if c.is_noop() {
        println!();
        println!("  No changes.");
        return;
    }

    let name_of = |id: &ItemId| names.get(id).cloned().unwrap_or_else(|| id.to_string());
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Change", "Item", "Detail"]);
    for item in &c.items_to_create {
        table.add_row(vec![
            "create".to_string(),
            item.name.clone(),
            format!("quantity {}", item.quantity),
        ]);
    }
    for update in &c.items_to_update {
        for change in &update.changes {
            table.add_row(vec!["update".to_string(), name_of(&update.item), describe(change)]);
        }
    }
    for id in &c.items_to_delete {
        table.add_row(vec!["delete".to_string(), name_of(id), String::new()]);
    }
    for change in &c.actor_changes {
        let ActorChange::KnownFormulas(book) = change;
        table.add_row(vec![
            "actor".to_string(),
            "formula book".to_string(),
            format!("{} formulas", book.len()),
        ]);
    }

    println!();
    println!("{table}");
    if let Some(marker) = &c.retry_lockout {
        println!();
        println!("  {} until level {}", "Retry locked".yellow(), marker.level + 1);
    }
}

fn describe(change: &ItemChange) -> String {
    match change {
        ItemChange::Quantity(n) => format!("quantity {n}"),
        ItemChange::Identification(state) if state.is_identified() => "identified".to_string(),
        ItemChange::Identification(_) => "still unidentified".to_string(),
        ItemChange::Runes(runes) => {
            let properties: Vec<&str> =
                runes.property.iter().flatten().map(String::as_str).collect();
            format!(
                "potency {}, secondary {}, property [{}]",
                runes.potency,
                runes.secondary,
                properties.join(", ")
            )
        }
    }
}
