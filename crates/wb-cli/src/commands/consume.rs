use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rand::SeedableRng;
use rand::rngs::StdRng;
use wb_core::{ItemId, Price};
use wb_outcome::{ConsumptionMode, MaterialLine, consume};

pub fn run(mode: &str, materials: &[String], chance: f64, seed: u64) -> Result<(), String> {
    let mode: ConsumptionMode = mode.parse().map_err(|e: wb_outcome::EngineError| e.to_string())?;

    let mut names = Vec::with_capacity(materials.len());
    let mut lines = Vec::with_capacity(materials.len());
    for entry in materials {
        let (name, quantity) = parse_material(entry)?;
        names.push(name);
        lines.push(MaterialLine::whole_stack(ItemId::new(), quantity, Price::default()));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let result = consume(&lines, mode, chance, &mut rng).map_err(|e| e.to_string())?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Material", "Committed", "Consumed", "Saved"]);
    for (name, used) in names.iter().zip(&result.per_material) {
        table.add_row(vec![
            name.clone(),
            used.quantity.to_string(),
            used.consumed.to_string(),
            used.saved().to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  mode {}: {} consumed, {} saved",
        mode.to_string().bold(),
        result.total_consumed.to_string().red(),
        result.total_saved.to_string().green()
    );

    Ok(())
}

fn parse_material(entry: &str) -> Result<(String, u32), String> {
    let (name, quantity) = entry
        .rsplit_once(':')
        .ok_or_else(|| format!("material '{entry}' must be name:quantity"))?;
    let quantity: u32 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("material '{entry}' has an invalid quantity"))?;
    if name.trim().is_empty() {
        return Err(format!("material '{entry}' has no name"));
    }
    Ok((name.trim().to_string(), quantity))
}
