//! Move evaluation: legality, captures, and suicide.
//!
//! [`attempt_move`] is a pure function from a board and a candidate stone to
//! either the next board or the reason the move is illegal. The input board is
//! never touched; the stone is placed on a copy.
//!
//! Captures are resolved before the suicide check, so a move that fills its
//! own last liberty but removes an adjacent opponent group is legal.

use thiserror::Error;
use tracing::debug;

use crate::board::{Board, Color, Point};
use crate::group::find_group;

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalMove {
    /// Point is outside the board
    #[error("Point {0} is off the board")]
    OutOfBounds(Point),
    /// Point is not empty
    #[error("Point is already occupied")]
    Occupied,
    /// Move would leave its own group without liberties
    #[error("Suicide move is not allowed.")]
    Suicide,
}

/// A legal move applied to a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Board after the stone is placed and captures are removed
    pub board: Board,
    /// Number of opponent stones removed
    pub captured: usize,
}

/// Play a stone of `player` at `point`.
///
/// # Errors
/// - [`IllegalMove::OutOfBounds`] if the point is off the board
/// - [`IllegalMove::Occupied`] if the point holds a stone
/// - [`IllegalMove::Suicide`] if the stone's group has no liberties once
///   captures are removed
pub fn attempt_move(board: &Board, point: Point, player: Color) -> Result<Placement, IllegalMove> {
    if !board.contains(point) {
        debug!(%point, %player, "rejected move off the board");
        return Err(IllegalMove::OutOfBounds(point));
    }
    if board.get(point).is_some() {
        debug!(%point, %player, "rejected move on occupied point");
        return Err(IllegalMove::Occupied);
    }

    let mut next = board.clone();
    next.set(point, Some(player));

    let opp = player.opponent();
    let mut captured = 0;
    for n in board.neighbors(point) {
        // A group touching the new stone on two sides is gone after the first
        // removal, so this check also keeps it from being counted twice.
        if next.get(n) != Some(opp) {
            continue;
        }
        let group = find_group(&next, n);
        if group.is_captured() {
            for &stone in &group.stones {
                next.set(stone, None);
            }
            captured += group.len();
        }
    }

    if find_group(&next, point).is_captured() {
        debug!(%point, %player, "rejected suicide");
        return Err(IllegalMove::Suicide);
    }

    if captured > 0 {
        debug!(%point, %player, captured, "stones captured");
    }
    Ok(Placement {
        board: next,
        captured,
    })
}

/// Whether `player` may legally play at `point`.
pub fn is_legal(board: &Board, point: Point, player: Color) -> bool {
    attempt_move(board, point, player).is_ok()
}

/// First empty point in row-major order where `player` may legally play.
pub fn first_legal_point(board: &Board, player: Color) -> Option<Point> {
    board.empty_points().find(|&p| is_legal(board, p, player))
}
