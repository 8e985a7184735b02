use std::path::Path;

use colored::Colorize;
use wb_core::Rarity;
use wb_outcome::{DifficultyCalculator, DifficultyRequest, EngineConfig};

pub fn run(
    level: u32,
    rarity: &str,
    explicit: Option<u32>,
    config: Option<&Path>,
) -> Result<(), String> {
    let rarity: Rarity = rarity.parse().map_err(|e: wb_core::CoreError| e.to_string())?;
    let settings = super::load_settings(config)?;
    let config = EngineConfig::from_provider(&settings).map_err(|e| e.to_string())?;
    let calculator = DifficultyCalculator::from_config(&config);

    let request = DifficultyRequest {
        level,
        rarity,
        explicit_override: explicit,
    };
    let dc = calculator.calculate(&request).map_err(|e| e.to_string())?;

    println!("  DC {}", dc.to_string().bold());
    match explicit.filter(|dc| *dc > 0) {
        Some(_) => println!("  {}", "explicit override".dimmed()),
        None => {
            let base = calculator.level_dc(level).map_err(|e| e.to_string())?;
            println!(
                "  {}",
                format!(
                    "level {level} base {base}, {rarity} +{}",
                    config.rarity.for_rarity(rarity)
                )
                .dimmed()
            );
        }
    }

    Ok(())
}
