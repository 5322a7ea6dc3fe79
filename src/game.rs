//! Game session: turns, passes, history, and the scoring phase.
//!
//! The session owns an append-only history of snapshots. Every committed
//! move pushes a new snapshot holding a fresh board produced by
//! [`attempt_move`]; earlier boards are never modified, so they can be
//! replayed or returned to with [`GameSession::undo`].
//!
//! A game moves through three phases:
//! - `Playing`: stones are placed, passes counted. Two consecutive passes
//!   end play.
//! - `Scoring`: groups are toggled dead and the score previewed. Play can be
//!   resumed, or the result confirmed with [`GameSession::finish`].
//! - `Finished`: the outcome is fixed.
//!
//! Resignation ends the game from either of the first two phases.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::board::{Board, BoardSize, Color, Point};
use crate::constants::{DEFAULT_KOMI, PASSES_TO_END};
use crate::group::find_group;
use crate::rules::{IllegalMove, attempt_move};
use crate::scoring::{Captures, DeadStones, ScoreResult, calculate_final_score};

/// A move by the player to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Place(Point),
    Pass,
    Resign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Playing,
    Scoring,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Playing => f.write_str("playing"),
            Phase::Scoring => f.write_str("scoring"),
            Phase::Finished => f.write_str("finished"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub size: BoardSize,
    pub komi: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            size: BoardSize::default(),
            komi: DEFAULT_KOMI,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Illegal(#[from] IllegalMove),
    #[error("not allowed while {actual} (game must be {expected})")]
    WrongPhase { expected: Phase, actual: Phase },
    #[error("no moves to undo")]
    NothingToUndo,
    #[error("no stone at {0}")]
    NoStone(Point),
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameOutcome {
    /// Both players passed and the board was counted
    Counted(ScoreResult),
    /// `loser` resigned
    Resigned { loser: Color, score: ScoreResult },
}

impl GameOutcome {
    pub fn score(&self) -> &ScoreResult {
        match self {
            GameOutcome::Counted(score) | GameOutcome::Resigned { score, .. } => score,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Counted(score) => write!(f, "{score}"),
            GameOutcome::Resigned { loser, .. } => match loser.opponent() {
                Color::Black => f.write_str("B+R"),
                Color::White => f.write_str("W+R"),
            },
        }
    }
}

/// Game state after a move.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub board: Board,
    pub captures: Captures,
    pub to_move: Color,
    pub last_move: Option<Move>,
    /// Consecutive passes ending with this snapshot
    pub passes: u8,
}

/// A game in progress.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    history: Vec<Snapshot>,
    phase: Phase,
    dead: DeadStones,
    outcome: Option<GameOutcome>,
    /// History length at the last [`GameSession::resume`]; passes up to
    /// that snapshot no longer count toward ending play.
    resumed_at: Option<usize>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl GameSession {
    /// Start a game on an empty board with Black to move.
    pub fn new(config: GameConfig) -> Self {
        let initial = Snapshot {
            board: Board::new(config.size),
            captures: Captures::default(),
            to_move: Color::Black,
            last_move: None,
            passes: 0,
        };
        Self {
            config,
            history: vec![initial],
            phase: Phase::Playing,
            dead: DeadStones::new(config.size),
            outcome: None,
            resumed_at: None,
        }
    }

    fn current(&self) -> &Snapshot {
        // history always holds the initial snapshot
        &self.history[self.history.len() - 1]
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.current().board
    }

    pub fn to_move(&self) -> Color {
        self.current().to_move
    }

    pub fn captures(&self) -> Captures {
        self.current().captures
    }

    pub fn last_move(&self) -> Option<Move> {
        self.current().last_move
    }

    pub fn consecutive_passes(&self) -> u8 {
        if self.resumed_at == Some(self.history.len()) {
            0
        } else {
            self.current().passes
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves played so far, passes included.
    pub fn move_number(&self) -> usize {
        self.history.len() - 1
    }

    /// Every snapshot from the empty board to the current position.
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    pub fn dead_stones(&self) -> &DeadStones {
        &self.dead
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Play the given move for the color to move.
    ///
    /// Returns the number of stones captured (zero for pass and resign).
    pub fn apply(&mut self, mv: Move) -> Result<usize, SessionError> {
        match mv {
            Move::Place(p) => self.play(p),
            Move::Pass => self.pass().map(|()| 0),
            Move::Resign => {
                self.resign(self.to_move())?;
                Ok(0)
            }
        }
    }

    /// Place a stone for the color to move.
    pub fn play(&mut self, point: Point) -> Result<usize, SessionError> {
        self.play_as(self.to_move(), point)
    }

    /// Place a stone of an explicit color; the opponent moves next.
    ///
    /// An illegal move leaves the session unchanged.
    pub fn play_as(&mut self, color: Color, point: Point) -> Result<usize, SessionError> {
        self.expect_phase(Phase::Playing)?;
        let placed = attempt_move(self.board(), point, color)?;

        let mut captures = self.captures();
        // capture counts never exceed the board area
        captures.add(color, placed.captured as u32);
        self.history.push(Snapshot {
            board: placed.board,
            captures,
            to_move: color.opponent(),
            last_move: Some(Move::Place(point)),
            passes: 0,
        });
        debug!(%color, %point, captured = placed.captured, n = self.move_number(), "stone played");
        Ok(placed.captured)
    }

    /// Pass for the color to move. The second consecutive pass ends play.
    pub fn pass(&mut self) -> Result<(), SessionError> {
        self.pass_as(self.to_move())
    }

    /// Pass for an explicit color; the opponent moves next.
    pub fn pass_as(&mut self, color: Color) -> Result<(), SessionError> {
        self.expect_phase(Phase::Playing)?;
        let current = self.current();
        let next = Snapshot {
            board: current.board.clone(),
            captures: current.captures,
            to_move: color.opponent(),
            last_move: Some(Move::Pass),
            passes: self.consecutive_passes() + 1,
        };
        debug!(%color, passes = next.passes, "pass");
        let ends_play = next.passes >= PASSES_TO_END;
        self.history.push(next);

        if ends_play {
            self.phase = Phase::Scoring;
            info!(n = self.move_number(), "both players passed, scoring");
        }
        Ok(())
    }

    /// `color` resigns; the opponent wins.
    pub fn resign(&mut self, color: Color) -> Result<(), SessionError> {
        if self.phase == Phase::Finished {
            return Err(SessionError::WrongPhase {
                expected: Phase::Playing,
                actual: self.phase,
            });
        }
        let outcome = GameOutcome::Resigned {
            loser: color,
            score: ScoreResult::by_resignation(color),
        };
        info!(%color, result = %outcome, "resigned");
        self.outcome = Some(outcome);
        self.phase = Phase::Finished;
        Ok(())
    }

    /// Take back the last move or pass.
    ///
    /// Undoing the pass that ended play returns the game to `Playing` and
    /// drops any dead marks.
    pub fn undo(&mut self) -> Result<(), SessionError> {
        if self.phase == Phase::Finished {
            return Err(SessionError::WrongPhase {
                expected: Phase::Playing,
                actual: self.phase,
            });
        }
        if self.history.len() <= 1 {
            return Err(SessionError::NothingToUndo);
        }
        self.history.pop();
        if self.phase == Phase::Scoring {
            self.dead.clear();
            self.phase = Phase::Playing;
            info!(n = self.move_number(), "pass undone, play continues");
        }
        Ok(())
    }

    /// Toggle the whole group at `point` between dead and alive.
    ///
    /// If any stone of the group is unmarked the whole group becomes dead,
    /// otherwise the whole group is revived. Returns whether it is now dead.
    pub fn toggle_dead(&mut self, point: Point) -> Result<bool, SessionError> {
        self.expect_phase(Phase::Scoring)?;
        let group = find_group(self.board(), point);
        if group.is_empty() {
            return Err(SessionError::NoStone(point));
        }

        let all_dead = group.stones.iter().all(|&p| self.dead.contains(p));
        for &p in &group.stones {
            if all_dead {
                self.dead.unmark(p);
            } else {
                self.dead.mark(p);
            }
        }
        debug!(%point, stones = group.len(), dead = !all_dead, "toggled group");
        Ok(!all_dead)
    }

    /// Score the current board with the current dead-stone marks.
    pub fn score(&self) -> ScoreResult {
        calculate_final_score(self.board(), &self.dead, self.captures(), self.config.komi)
    }

    /// Leave the scoring phase and continue playing. Dead marks are cleared.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.expect_phase(Phase::Scoring)?;
        self.dead.clear();
        self.resumed_at = Some(self.history.len());
        self.phase = Phase::Playing;
        info!("play resumed");
        Ok(())
    }

    /// Confirm the score and end the game.
    pub fn finish(&mut self) -> Result<&GameOutcome, SessionError> {
        self.expect_phase(Phase::Scoring)?;
        let outcome = GameOutcome::Counted(self.score());
        info!(result = %outcome, dead = self.dead.len(), "game finished");
        self.phase = Phase::Finished;
        Ok(self.outcome.insert(outcome))
    }
}
