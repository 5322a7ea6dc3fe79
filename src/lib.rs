//! Weiqi-Rules: a Go rules engine.
//!
//! This crate decides stone placement legality, finds groups and their
//! liberties, resolves captures, rejects suicide, and scores finished games
//! by territory. Around that pure core it offers a game session with history
//! and a scoring phase, a fallback chain for moves suggested by an external
//! collaborator, and a GTP front end.
//!
//! ## Modules
//!
//! - [`constants`] - Komi, pass and resignation rules, suggestion deadline
//! - [`board`] - Board model, points, and GTP vertices
//! - [`group`] - Group and liberty analysis
//! - [`rules`] - Move evaluation (captures and suicide)
//! - [`scoring`] - Territory scoring with dead stones
//! - [`game`] - Game session: turns, passes, undo, scoring phase
//! - [`suggest`] - External move suggestion with timeouts and fallback
//! - [`playout`] - Random legal moves and random games
//! - [`gtp`] - Go Text Protocol front end
//!
//! ## Example
//!
//! ```
//! use weiqi_rules::board::{Board, BoardSize, Color, Point};
//! use weiqi_rules::rules::attempt_move;
//! use weiqi_rules::scoring::{Captures, DeadStones, calculate_final_score};
//!
//! let board = Board::new(BoardSize::Nine);
//! let placed = attempt_move(&board, Point::new(4, 4), Color::Black).unwrap();
//! assert_eq!(placed.captured, 0);
//!
//! let dead = DeadStones::new(BoardSize::Nine);
//! let score = calculate_final_score(&placed.board, &dead, Captures::default(), 6.5);
//! assert_eq!(score.black.territory, 80);
//! ```

pub mod board;
pub mod constants;
pub mod game;
pub mod group;
pub mod gtp;
pub mod playout;
pub mod rules;
pub mod scoring;
pub mod suggest;
