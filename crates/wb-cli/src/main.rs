//! CLI frontend for the Werkbank outcome engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "wb",
    about = "Werkbank: outcome resolution for crafting, identification, and rune etching",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the DC for an item level and rarity
    Dc {
        /// Item level
        #[arg(short, long)]
        level: u32,

        /// Rarity: common, uncommon, rare, unique
        #[arg(short, long, default_value = "common")]
        rarity: String,

        /// Explicit DC recorded on the item; wins when positive
        #[arg(long = "override")]
        explicit: Option<u32>,

        /// JSON settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Roll how much of each committed material is used up
    Consume {
        /// Consumption mode: all or chance
        #[arg(short, long, default_value = "chance")]
        mode: String,

        /// Material as name:quantity (repeatable)
        #[arg(short = 'M', long = "material", required = true)]
        materials: Vec<String>,

        /// Per-unit consumption probability in chance mode
        #[arg(long, default_value = "0.5")]
        chance: f64,

        /// RNG seed for deterministic rolls
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// List the rune slots of a weapon, armor, or shield
    Slots {
        /// Item JSON file
        item: PathBuf,

        /// Rune JSON file to check against every slot
        #[arg(short, long)]
        rune: Option<PathBuf>,
    },

    /// Resolve a scenario file for a given degree of success
    Resolve {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Degree of success: crit-fail, fail, success, crit-success
        #[arg(short, long)]
        degree: String,

        /// RNG seed for deterministic rolls
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Dc {
            level,
            rarity,
            explicit,
            config,
        } => commands::dc::run(level, &rarity, explicit, config.as_deref()),
        Commands::Consume {
            mode,
            materials,
            chance,
            seed,
        } => commands::consume::run(&mode, &materials, chance, seed),
        Commands::Slots { item, rune } => commands::slots::run(&item, rune.as_deref()),
        Commands::Resolve {
            scenario,
            degree,
            seed,
            json,
        } => commands::resolve::run(&scenario, &degree, seed, json).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
