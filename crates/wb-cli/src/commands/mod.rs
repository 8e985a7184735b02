pub mod consume;
pub mod dc;
pub mod resolve;
pub mod slots;

use std::fs;
use std::path::Path;

use colored::Colorize;
use serde::de::DeserializeOwned;
use wb_outcome::{DegreeOfSuccess, MemoryConfig};

/// Read and parse a JSON file.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {}: {e}", path.display()))
}

/// Settings from an optional JSON file; defaults when absent.
fn load_settings(path: Option<&Path>) -> Result<MemoryConfig, String> {
    match path {
        Some(path) => MemoryConfig::from_json(read_json(path)?).map_err(|e| e.to_string()),
        None => Ok(MemoryConfig::new()),
    }
}

fn colorize_degree(degree: DegreeOfSuccess) -> colored::ColoredString {
    let label = degree.to_string();
    match degree {
        DegreeOfSuccess::CriticalSuccess => label.green().bold(),
        DegreeOfSuccess::Success => label.green(),
        DegreeOfSuccess::Failure => label.yellow(),
        DegreeOfSuccess::CriticalFailure => label.red().bold(),
    }
}
