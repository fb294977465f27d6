//! # Delve Command Line
//!
//! Generates a dungeon layout from a level file (or the built-in demo level)
//! and prints the placed rooms.

use clap::Parser;
use delve::generation::utils::create_rng;
use delve::{DelveError, DelveResult, DungeonBuilder, DungeonLevel, GenerationConfig, Room};
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Command line arguments for the Delve dungeon generator.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Lay out a room-graph dungeon and print the placed rooms")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON level file; the built-in demo level is used when omitted
    #[arg(short, long, value_name = "FILE")]
    level: Option<PathBuf>,

    /// Number of room-node graphs drawn before giving up
    #[arg(long)]
    max_build_attempts: Option<u32>,

    /// Number of layouts tried for each drawn graph
    #[arg(long)]
    max_rebuild_attempts: Option<u32>,

    /// Write the demo level as JSON to FILE and exit
    #[arg(long, value_name = "FILE")]
    export_level: Option<PathBuf>,

    /// Print the room dictionary as JSON
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> DelveResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    info!("Starting Delve v{}", delve::VERSION);

    if let Some(path) = &args.export_level {
        DungeonLevel::demo().save_to_file(path)?;
        info!("Wrote demo level to {}", path.display());
        return Ok(());
    }

    let level = match &args.level {
        Some(path) => DungeonLevel::load_from_file(path)?,
        None => DungeonLevel::demo(),
    };

    let config = build_config(&args);
    info!("Generating level {} with seed {}", level.name, config.seed);

    let mut rng = create_rng(&config);
    let mut builder = DungeonBuilder::new(config);
    if !builder.generate_dungeon(&level, &mut rng) {
        let stats = builder.stats();
        return Err(DelveError::GenerationFailed(format!(
            "level {} could not be laid out after {} build and {} layout attempts",
            level.name, stats.build_attempts, stats.rebuild_attempts
        )));
    }

    let rooms: BTreeMap<&str, &Room> = builder
        .rooms()
        .iter()
        .map(|(id, room)| (id.as_str(), room))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rooms)?);
    } else {
        print_rooms(&rooms);
    }

    Ok(())
}

/// Initializes env_logger with `log_level` as the fallback filter.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

fn build_config(args: &Args) -> GenerationConfig {
    let mut config = GenerationConfig::new(args.seed.unwrap_or_else(rand::random));
    if let Some(attempts) = args.max_build_attempts {
        config.max_dungeon_build_attempts = attempts;
    }
    if let Some(attempts) = args.max_rebuild_attempts {
        config.max_dungeon_rebuild_attempts_for_room_graph = attempts;
    }
    config
}

fn print_rooms(rooms: &BTreeMap<&str, &Room>) {
    println!("{:<14} {:<12} {:>20} {:>20}  doorways", "room", "type", "lower", "upper");
    for (id, room) in rooms {
        let doorways: Vec<String> = room
            .doorways
            .iter()
            .map(|doorway| {
                let state = if doorway.is_connected { "open" } else { "sealed" };
                format!("{:?}:{}", doorway.orientation, state)
            })
            .collect();
        println!(
            "{:<14} {:<12} {:>20} {:>20}  {}",
            id,
            room.room_type.to_string(),
            room.lower_bounds.to_string(),
            room.upper_bounds.to_string(),
            doorways.join(" ")
        );
    }
}
