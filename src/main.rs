//! Weiqi-Rules: a Go rules engine.
//!
//! ## Usage
//!
//! - `weiqi-rules` - Show a demo
//! - `weiqi-rules gtp` - Start GTP server for GUI integration
//! - `weiqi-rules demo` - Play a random game and score it
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use weiqi_rules::board::{BoardSize, Color, Point};
use weiqi_rules::constants::{DEFAULT_KOMI, SUGGEST_TIMEOUT};
use weiqi_rules::game::{GameConfig, GameSession, Phase};
use weiqi_rules::gtp::GtpEngine;
use weiqi_rules::playout::{RandomSuggester, playout};
use weiqi_rules::rules::attempt_move;
use weiqi_rules::suggest::FallbackChain;

/// Weiqi-Rules: a Go rules engine
#[derive(Parser)]
#[command(name = "weiqi-rules")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    game: GameArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GameArgs {
    /// Board size (9, 13 or 19)
    #[arg(long, global = true, default_value = "9", value_parser = parse_size)]
    size: BoardSize,

    /// Compensation points for White
    #[arg(long, global = true, default_value_t = DEFAULT_KOMI)]
    komi: f64,

    /// Seed for the random move generator
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Deadline for each generated move, in milliseconds
    #[arg(long, global = true, default_value_t = SUGGEST_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GUI applications
    Gtp,
    /// Play a random game and print the scored result
    Demo,
}

fn parse_size(s: &str) -> Result<BoardSize, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = GameConfig {
        size: cli.game.size,
        komi: cli.game.komi,
    };

    match cli.command {
        Some(Commands::Gtp) => {
            let suggester = match cli.game.seed {
                Some(seed) => RandomSuggester::with_seed(seed),
                None => RandomSuggester::new(),
            };
            let chain = FallbackChain::new()
                .context("starting suggestion runtime")?
                .with_tier(Arc::new(suggester), Duration::from_millis(cli.game.timeout_ms));
            let mut engine = GtpEngine::with_chain(config, chain);
            engine.run().context("GTP session failed")
        }
        Some(Commands::Demo) | None => run_demo(config, cli.game.seed),
    }
}

fn run_demo(config: GameConfig, seed: Option<u64>) -> anyhow::Result<()> {
    println!("Weiqi-Rules: Go rules engine\n");

    // Demo 1: A capture in the corner
    println!("=== Capture Demo ===");
    let mut game = GameSession::new(config);
    game.play(Point::new(1, 0))?;
    game.play(Point::new(0, 0))?;
    let captured = game.play(Point::new(0, 1))?;
    println!("Black captures {captured} stone(s) at the corner");
    print!("{}", game.board());
    let suicide = attempt_move(game.board(), Point::new(0, 0), Color::White);
    println!("White at (0, 0): {suicide:?}\n");

    // Demo 2: A random game played to the end
    println!("=== Random Game Demo ===");
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let mut game = GameSession::new(config);
    let limit = config.size.get() * config.size.get() * 3;
    let played = playout(&mut game, &mut rng, limit);
    println!("{played} moves played");
    print!("{}", game.board());
    if game.phase() == Phase::Scoring {
        let outcome = game.finish()?;
        let score = outcome.score();
        println!(
            "Black: {} territory + {} captures = {}",
            score.black.territory, score.black.captures, score.black.total
        );
        println!(
            "White: {} territory + {} captures + {} komi = {}",
            score.white.territory, score.white.captures, score.white.komi, score.white.total
        );
        println!("Result: {outcome}");
    } else {
        println!("Game stopped after {limit} moves without two passes");
    }
    Ok(())
}
