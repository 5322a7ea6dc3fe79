//! Constants for board geometry, scoring, and move suggestion.
//!
//! Board sizes are chosen at runtime from a fixed set (see
//! [`BoardSize`](crate::board::BoardSize)); everything here is a value the
//! engine or its callers fall back to when nothing else is configured.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// GTP column letters. `I` is skipped to avoid confusion with `J`.
pub const COLUMN_LETTERS: &[u8; 19] = b"ABCDEFGHJKLMNOPQRST";

// =============================================================================
// Scoring
// =============================================================================

/// Komi (compensation points for White).
pub const DEFAULT_KOMI: f64 = 6.5;

/// Consecutive passes that end the playing phase.
pub const PASSES_TO_END: u8 = 2;

/// Total credited to the winner of a resigned game.
pub const RESIGNATION_WIN_TOTAL: f64 = 1.0;

/// Total credited to the player who resigned.
pub const RESIGNATION_LOSS_TOTAL: f64 = 0.0;

// =============================================================================
// Move Suggestion
// =============================================================================

/// Default deadline for a single suggestion tier.
pub const SUGGEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Diagram Characters
// =============================================================================

/// Black stone.
pub const STONE_BLACK: char = 'X';

/// White stone.
pub const STONE_WHITE: char = 'O';

/// Empty point.
pub const EMPTY: char = '.';
