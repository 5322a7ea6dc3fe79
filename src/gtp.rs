//! Go Text Protocol (GTP) implementation.
//!
//! GTP is a text-based protocol for communicating with Go-playing programs.
//! This module implements GTP version 2 on top of [`GameSession`], allowing
//! the rules engine to be driven by graphical Go interfaces like Sabaki or
//! GoGui, or by scripts.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`
//! - `quit`
//! - `boardsize <size>` - 9, 13 or 19; clears the board
//! - `clear_board`
//! - `komi <value>` - applies at once on an empty board, else after `clear_board`
//! - `play <color> <vertex|pass>`
//! - `genmove <color>` - moves come from the engine's fallback chain
//! - `undo`
//!
//! GTP has no scoring phase: after two passes `play`, `genmove` and `undo`
//! continue the game as if play had never stopped.
//! - `showboard`
//! - `final_score`
//!
//! ## Example
//!
//! ```ignore
//! use weiqi_rules::gtp::GtpEngine;
//! let mut engine = GtpEngine::new()?;
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::board::{BoardSize, Color, format_vertex, parse_vertex};
use crate::constants::SUGGEST_TIMEOUT;
use crate::game::{GameConfig, GameSession, Move, Phase};
use crate::playout::RandomSuggester;
use crate::suggest::FallbackChain;

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "final_score",
    "genmove",
    "known_command",
    "komi",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "showboard",
    "undo",
    "version",
];

/// GTP engine state.
pub struct GtpEngine {
    /// Current game
    session: GameSession,
    /// Settings for the next cleared board
    config: GameConfig,
    /// Move source for `genmove`
    chain: FallbackChain,
}

impl GtpEngine {
    /// Create a GTP engine answering `genmove` with random legal moves.
    pub fn new() -> io::Result<Self> {
        let chain =
            FallbackChain::new()?.with_tier(Arc::new(RandomSuggester::new()), SUGGEST_TIMEOUT);
        Ok(Self::with_chain(GameConfig::default(), chain))
    }

    /// Create a GTP engine with explicit settings and move source.
    pub fn with_chain(config: GameConfig, chain: FallbackChain) -> Self {
        Self {
            session: GameSession::new(config),
            config,
            chain,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Run the GTP command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop over arbitrary input and output streams.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("reading GTP input")?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse optional command ID
            let (id, command_line) = Self::parse_id(line);

            // Parse command and arguments
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            debug!(%command, ?args, "gtp command");
            let (success, message) = self.execute(&command, args);

            // Format and send response
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            write!(output, "{prefix}{id_str} {message}\n\n").context("writing GTP response")?;
            output.flush().context("flushing GTP response")?;

            // Quit if requested
            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Leave the scoring phase entered after two passes.
    fn continue_play(&mut self) {
        if self.session.phase() == Phase::Scoring && self.session.resume().is_ok() {
            debug!("continuing after two passes");
        }
    }

    fn clear(&mut self) {
        self.session = GameSession::new(self.config);
        info!(size = %self.config.size, komi = self.config.komi, "board cleared");
    }

    /// Execute a GTP command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "boardsize" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<BoardSize>() {
                    Ok(size) => {
                        self.config.size = size;
                        self.clear();
                        (true, String::new())
                    }
                    Err(_) => (false, "unacceptable size".to_string()),
                }
            }

            "clear_board" => {
                self.clear();
                (true, String::new())
            }

            "komi" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<f64>() {
                    Ok(komi) if komi.is_finite() => {
                        self.config.komi = komi;
                        if self.session.move_number() == 0 {
                            self.clear();
                        }
                        (true, String::new())
                    }
                    _ => (false, "syntax error".to_string()),
                }
            }

            "play" => {
                let [color, vertex, ..] = args else {
                    return (false, "missing arguments".to_string());
                };
                let Ok(color) = color.parse::<Color>() else {
                    return (false, "invalid color".to_string());
                };

                if vertex.eq_ignore_ascii_case("pass") {
                    self.continue_play();
                    return match self.session.pass_as(color) {
                        Ok(()) => (true, String::new()),
                        Err(e) => (false, e.to_string()),
                    };
                }

                let Some(pt) = parse_vertex(vertex, self.session.board().size()) else {
                    return (false, "invalid vertex".to_string());
                };
                self.continue_play();
                match self.session.play_as(color, pt) {
                    Ok(_) => (true, String::new()),
                    Err(e) => (false, format!("illegal move: {e}")),
                }
            }

            "genmove" => {
                let Some(color) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let Ok(color) = color.parse::<Color>() else {
                    return (false, "invalid color".to_string());
                };
                self.continue_play();
                if self.session.phase() != Phase::Playing {
                    return (false, format!("game is {}", self.session.phase()));
                }
                self.genmove(color)
            }

            "undo" => match self.session.undo() {
                Ok(()) => (true, String::new()),
                Err(e) => (false, format!("cannot undo: {e}")),
            },

            "showboard" => {
                let board = self.session.board().to_string();
                (true, format!("\n{}", board.trim_end_matches('\n')))
            }

            "final_score" => (true, self.session.score().to_string()),

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn genmove(&mut self, color: Color) -> (bool, String) {
        let resolved = self.chain.resolve_for(&self.session, color);
        debug!(mv = ?resolved.mv, source = ?resolved.source, "generated move");
        let size = self.session.board().size();
        let reply = match resolved.mv {
            Move::Place(p) => {
                let Some(vertex) = format_vertex(p, size) else {
                    return (false, format!("generated off-board point {p}"));
                };
                match self.session.play_as(color, p) {
                    Ok(_) => vertex,
                    Err(e) => return (false, e.to_string()),
                }
            }
            Move::Pass => match self.session.pass_as(color) {
                Ok(()) => "pass".to_string(),
                Err(e) => return (false, e.to_string()),
            },
            Move::Resign => match self.session.resign(color) {
                Ok(()) => "resign".to_string(),
                Err(e) => return (false, e.to_string()),
            },
        };
        (true, reply)
    }
}
