use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use wb_core::{ItemData, RuneDefinition};
use wb_outcome::RuneMatcher;

pub fn run(item: &Path, rune: Option<&Path>) -> Result<(), String> {
    let item: ItemData = super::read_json(item)?;
    let rune: Option<RuneDefinition> = rune.map(super::read_json::<RuneDefinition>).transpose()?;
    let matcher = RuneMatcher::for_item(&item).map_err(|e| e.to_string())?;

    println!("  {} [{}]", item.name.bold(), matcher.usage().to_string().dimmed());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec!["Slot", "Tier", "Rune", "Upgradable"];
    if rune.is_some() {
        header.push("Fits");
    }
    table.set_header(header);

    for slot in matcher.available_slots() {
        let mut row = vec![
            slot.key.to_string(),
            slot.current_tier.to_string(),
            slot.occupant.clone().unwrap_or_else(|| "-".to_string()),
            if slot.can_upgrade { "yes" } else { "no" }.to_string(),
        ];
        if let Some(rune) = &rune {
            row.push(match matcher.check(rune, &slot) {
                Ok(()) => "yes".to_string(),
                Err(reason) => reason.to_string(),
            });
        }
        table.add_row(row);
    }

    println!("{table}");
    Ok(())
}
