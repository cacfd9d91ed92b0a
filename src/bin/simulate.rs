//! Progression balance simulator CLI.
//!
//! Runs seeded actors through kill XP and death penalties to analyze how fast
//! a curve levels.
//!
//! Usage:
//!   cargo run --bin simulate -- [OPTIONS]
//!
//! Examples:
//!   cargo run --bin simulate                       # Default: 100 actors, 2000 kills
//!   cargo run --bin simulate -- -n 20 -k 500       # 20 actors, 500 kills each
//!   cargo run --bin simulate -- --seed 42          # Reproducible run
//!   cargo run --bin simulate -- --config leveling.toml
//!   cargo run --bin simulate -- --home-config      # ~/.leveling/leveling.toml

use leveling::core::config::LevelingConfig;
use leveling::core::constants::CONFIG_FILE;
use leveling::formula::FormulaDescriptor;
use leveling::simulator::{run_simulation, SimConfig};
use leveling::utils::data_dir;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let (config, show_level_curve) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║              LEVELING PROGRESSION SIMULATOR                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Configuration:");
    println!("  Actors:         {}", config.num_actors);
    println!("  Kills/Actor:    {}", config.kills_per_actor);
    println!("  Death Chance:   {:.1}%", config.death_chance * 100.0);
    if let Some(seed) = config.seed {
        println!("  Seed:           {}", seed);
    }
    println!();
    println!("Running simulation...");
    println!();

    let report = match run_simulation(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", report.to_text());

    if show_level_curve {
        println!("{}", report.level_curve_text());
    }

    if args.iter().any(|a| a == "--json") {
        let filename = format!(
            "sim_report_{}.json",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        );
        match std::fs::write(&filename, report.to_json()) {
            Ok(()) => println!("JSON report saved to: {}", filename),
            Err(e) => eprintln!("Failed to write JSON report: {}", e),
        }
    }
}

fn parse_args(args: &[String]) -> Result<(SimConfig, bool), String> {
    let mut config = SimConfig::default();
    let mut show_level_curve = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--actors" => {
                if i + 1 < args.len() {
                    config.num_actors = args[i + 1].parse().unwrap_or(100);
                    i += 1;
                }
            }
            "-k" | "--kills" => {
                if i + 1 < args.len() {
                    config.kills_per_actor = args[i + 1].parse().unwrap_or(2_000);
                    i += 1;
                }
            }
            "-d" | "--death-chance" => {
                if i + 1 < args.len() {
                    config.death_chance = args[i + 1].parse().unwrap_or(0.01);
                    i += 1;
                }
            }
            "-s" | "--seed" => {
                if i + 1 < args.len() {
                    config.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "-c" | "--config" => {
                if i + 1 < args.len() {
                    apply_config_file(&mut config, Path::new(&args[i + 1]))?;
                    i += 1;
                }
            }
            "--home-config" => {
                let dir = data_dir().map_err(|e| e.to_string())?;
                apply_config_file(&mut config, &dir.join(CONFIG_FILE))?;
            }
            "--linear" => {
                if i + 1 < args.len() {
                    if let Ok(per_level) = args[i + 1].parse::<u64>() {
                        config.formula = SimConfig::linear(per_level).formula;
                        i += 1;
                    }
                }
            }
            "--level-curve" => {
                show_level_curve = true;
            }
            "-v" | "--verbose" => {
                config.verbosity = 2;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "--quick" => {
                config = SimConfig::quick();
            }
            "--hardcore" => {
                config = SimConfig::hardcore();
            }
            _ => {}
        }
        i += 1;
    }

    Ok((config, show_level_curve))
}

/// Take formula, kill XP and death settings from a `leveling.toml`. Table
/// files are resolved next to the config file.
fn apply_config_file(config: &mut SimConfig, path: &Path) -> Result<(), String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let leveling = LevelingConfig::from_toml_str(&text).map_err(|e| e.to_string())?;
    let data_dir = path.parent().unwrap_or_else(|| Path::new("."));

    config.formula =
        FormulaDescriptor::from_config(&leveling.formula, data_dir).map_err(|e| e.to_string())?;
    config.kill_xp = leveling.kill_xp;
    config.death = leveling.death;
    Ok(())
}

fn print_help() {
    println!("Leveling Progression Simulator");
    println!();
    println!("USAGE:");
    println!("    cargo run --bin simulate -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -n, --actors <N>        Number of simulated actors (default: 100)");
    println!("    -k, --kills <K>         Kills per actor (default: 2000)");
    println!("    -d, --death-chance <P>  Chance of dying after each kill (default: 0.01)");
    println!("    -s, --seed <S>          Random seed for reproducibility");
    println!("    -c, --config <FILE>     Use formula and penalties from a leveling.toml");
    println!("    --home-config           Use ~/.leveling/leveling.toml");
    println!("    --linear <XP>           Linear curve with XP per level");
    println!("    --level-curve           Show the XP curve");
    println!("    -v, --verbose           Per-actor output");
    println!("    --json                  Save JSON report");
    println!("    --quick                 Quick run (20 actors, 500 kills)");
    println!("    --hardcore              Deaths remove 20% XP and may drop levels");
    println!("    -h, --help              Show this help");
    println!();
    println!("Set RUST_LOG=leveling=debug for engine logs.");
}
