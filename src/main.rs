//! tilecascade: plays a match-three level headlessly and prints each turn.

mod app;
mod text;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tilecascade::Level;
use tilecascade::spawner::DEFAULT_MAX_RETRIES;
use tracing::Level as LogLevel;

/// Options derived from CLI that drive the autoplay loop.
#[derive(Debug, Clone)]
pub struct PlayConfig {
    pub strategy: Strategy,
    pub max_turns: u32,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut level = match args.level.as_deref() {
        Some(path) => {
            Level::load(path).with_context(|| format!("loading level {}", path.display()))?
        }
        None => Level::default(),
    };
    // Explicit sizes only apply to levels without an authored layout.
    if level.rows.is_empty() {
        level.width = args.width.unwrap_or(level.width);
        level.height = args.height.unwrap_or(level.height);
    }
    level.moves = args.moves.unwrap_or(level.moves);
    level.special_chance = args.special_chance.unwrap_or(level.special_chance);

    let config = PlayConfig {
        strategy: args.strategy,
        max_turns: args.max_turns,
        quiet: args.quiet,
    };
    let settings = level.spawn_settings(args.spawn_retries, args.seed);
    let mut app = App::new(&level, &settings, config)?;
    app.run();
    Ok(())
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        LogLevel::DEBUG.max(args.log_level)
    } else {
        args.log_level
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Match-three cascade engine, played by a simple bot.
#[derive(Debug, Parser)]
#[command(
    name = "tilecascade",
    version,
    about = "Plays a match-three level headlessly: swap, match, pop, drop, spawn, repeat.",
    long_about = "tilecascade loads a level (or a default 6x6 board), then lets a bot pick a \
        legal swap each turn and runs the full cascade until the board is stable.\n\n\
        The board is printed after every turn. Use --level to load a file of \
        level[key]=\"value\" lines (width, height, moves, goal, items, specials, affinity, \
        special_chance, row)."
)]
pub struct Args {
    /// Level file (`level[key]="value"` lines). Uses a random 6x6 board if not set.
    #[arg(short, long, value_name = "FILE")]
    pub level: Option<PathBuf>,

    /// Board width in tiles. Ignored when the level authors its rows.
    #[arg(long, value_name = "COLS")]
    pub width: Option<usize>,

    /// Board height in tiles. Ignored when the level authors its rows.
    #[arg(long, value_name = "ROWS")]
    pub height: Option<usize>,

    /// Move budget. Overrides the level's.
    #[arg(short, long, value_name = "N")]
    pub moves: Option<u32>,

    /// Seed for the spawner; random if not set.
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Chance (0..=1) that a spawned item is special. Overrides the level's.
    #[arg(long, value_name = "P", value_parser = parse_chance)]
    pub special_chance: Option<f64>,

    /// Redraws of an unsolvable spawn before a legal move is forced.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, value_name = "N")]
    pub spawn_retries: u32,

    /// Stop after this many turns even if the level is not over.
    #[arg(long, default_value = "200", value_name = "N")]
    pub max_turns: u32,

    /// How the bot picks its swap.
    #[arg(long, default_value = "greedy")]
    pub strategy: Strategy,

    /// Only print the final summary.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level for engine events on stderr (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    pub log_level: LogLevel,

    /// Raise logging to at least debug.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// First legal swap in top-left scan order.
    First,
    /// Swap whose first match is largest.
    #[default]
    Greedy,
}

fn parse_chance(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{p} is not between 0 and 1"))
    }
}
