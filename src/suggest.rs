//! Move suggestion from an external collaborator.
//!
//! A suggester (an AI service, a local engine, a human over the network)
//! receives a [`SuggestionRequest`] and answers with a [`RawSuggestion`]: a
//! coordinate, a pass, or a resignation. Answers are untrusted. They are
//! validated for shape and range, and coordinates are re-checked with
//! [`attempt_move`] exactly like any other move.
//!
//! Suggesters may be slow or fail. [`request_with_timeout`] bounds one
//! request with `tokio::time::timeout`, and [`FallbackChain`] walks an
//! ordered list of tiers before falling back to the first legal point and
//! finally to a pass, so a move is always produced.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use tracing::{debug, warn};

use crate::board::{Board, BoardSize, Color, Point};
use crate::game::{GameSession, Move};
use crate::rules::{IllegalMove, attempt_move, first_legal_point};
use crate::scoring::Captures;

/// Everything a suggester is told about the position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRequest {
    pub size: usize,
    /// Rows top to bottom, `.` empty, `X` black, `O` white
    pub board: Vec<String>,
    pub to_move: Color,
    pub captures: Captures,
    pub last_move: Option<Move>,
}

impl SuggestionRequest {
    pub fn new(board: &Board, to_move: Color, captures: Captures, last_move: Option<Move>) -> Self {
        Self {
            size: board.edge(),
            board: board.rows(),
            to_move,
            captures,
            last_move,
        }
    }

    pub fn from_session(session: &GameSession) -> Self {
        Self::new(
            session.board(),
            session.to_move(),
            session.captures(),
            session.last_move(),
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Rebuild the board from the request rows.
    pub fn parse_board(&self) -> Result<Board, crate::board::BoardError> {
        self.board.join("\n").parse()
    }
}

/// A suggester's answer as received, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSuggestion {
    #[serde(default)]
    pub x: Option<i64>,
    #[serde(default)]
    pub y: Option<i64>,
    #[serde(default)]
    pub pass: bool,
    #[serde(default)]
    pub resign: bool,
    #[serde(default, alias = "reasoning")]
    pub rationale: Option<String>,
}

/// Why a suggester's answer was rejected before legality checks.
#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("malformed suggestion: {0}")]
    Json(#[from] serde_json::Error),
    #[error("suggestion names no move")]
    Empty,
    #[error("suggestion gives only one coordinate")]
    PartialCoordinate,
    #[error("suggestion combines a coordinate, pass, or resign")]
    Conflicting,
    #[error("coordinate ({x}, {y}) is off a {size}x{size} board")]
    OutOfRange { x: i64, y: i64, size: usize },
}

/// A well-formed suggestion. Coordinates are on the board but not yet
/// checked for legality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub mv: Move,
    pub rationale: Option<String>,
}

impl RawSuggestion {
    pub fn place(x: i64, y: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn pass() -> Self {
        Self {
            pass: true,
            ..Self::default()
        }
    }

    pub fn resign() -> Self {
        Self {
            resign: true,
            ..Self::default()
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// Parse a structured JSON answer such as
    /// `{"x": 3, "y": 4, "rationale": "extends the wall"}` or `{"pass": true}`.
    pub fn from_json(s: &str) -> Result<Self, SuggestionError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Check that exactly one of coordinate, pass, or resign is given and
    /// that the coordinate lies on a board of `size`.
    pub fn validate(self, size: BoardSize) -> Result<Suggestion, SuggestionError> {
        let coordinate = match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            (None, None) => None,
            _ => return Err(SuggestionError::PartialCoordinate),
        };
        let signals = usize::from(coordinate.is_some()) + usize::from(self.pass) + usize::from(self.resign);
        if signals > 1 {
            return Err(SuggestionError::Conflicting);
        }

        let mv = if let Some((x, y)) = coordinate {
            let n = size.get();
            match (usize::try_from(x), usize::try_from(y)) {
                (Ok(px), Ok(py)) if px < n && py < n => Move::Place(Point::new(px, py)),
                _ => return Err(SuggestionError::OutOfRange { x, y, size: n }),
            }
        } else if self.pass {
            Move::Pass
        } else if self.resign {
            Move::Resign
        } else {
            return Err(SuggestionError::Empty);
        };
        Ok(Suggestion {
            mv,
            rationale: self.rationale,
        })
    }
}

/// Future returned by [`MoveSuggester::suggest`].
pub type SuggestFut<'a> = Pin<Box<dyn Future<Output = anyhow::Result<RawSuggestion>> + Send + 'a>>;

/// Source of candidate moves.
///
/// The returned future is dropped once its deadline passes, which cancels
/// whatever it was waiting on. Long CPU-bound work should not run inline in
/// the future: it blocks the chain's runtime and cannot be interrupted.
pub trait MoveSuggester: Send + Sync {
    fn name(&self) -> &str;

    fn suggest<'a>(&'a self, request: &'a SuggestionRequest) -> SuggestFut<'a>;
}

/// Why a suggestion tier produced no usable move.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("{name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    #[error("{name} failed: {error:#}")]
    Failed { name: String, error: anyhow::Error },
    #[error("{name} gave an unusable suggestion: {source}")]
    Invalid {
        name: String,
        #[source]
        source: SuggestionError,
    },
    #[error("{name} suggested {point}: {source}")]
    Illegal {
        name: String,
        point: Point,
        #[source]
        source: IllegalMove,
    },
}

/// Ask `suggester` for a move, waiting at most `timeout`.
///
/// On timeout the suggestion future is dropped, so nothing keeps running
/// after this returns.
pub async fn request_with_timeout(
    suggester: &dyn MoveSuggester,
    request: &SuggestionRequest,
    timeout: Duration,
) -> Result<RawSuggestion, SuggestError> {
    match tokio::time::timeout(timeout, suggester.suggest(request)).await {
        Ok(Ok(raw)) => Ok(raw),
        Ok(Err(error)) => Err(SuggestError::Failed {
            name: suggester.name().to_string(),
            error,
        }),
        Err(_) => Err(SuggestError::Timeout {
            name: suggester.name().to_string(),
            timeout,
        }),
    }
}

/// One step of a [`FallbackChain`].
#[derive(Clone)]
pub struct Tier {
    pub suggester: Arc<dyn MoveSuggester>,
    pub timeout: Duration,
}

/// Where a resolved move came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveSource {
    /// Named suggester tier
    Tier(String),
    /// First legal empty point in row-major order
    FirstLegalPoint,
    /// Nothing else was available
    Pass,
}

/// A move that is safe to apply to the position it was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub mv: Move,
    pub source: MoveSource,
    pub rationale: Option<String>,
}

/// Ordered fallback policy: each tier in turn, then the first legal point,
/// then pass.
///
/// Tiers are awaited on a single-threaded runtime owned by the chain, so
/// [`resolve`](Self::resolve) is a plain blocking call. It must not be made
/// from inside another tokio runtime.
#[derive(Clone)]
pub struct FallbackChain {
    tiers: Vec<Tier>,
    runtime: Arc<Runtime>,
}

impl FallbackChain {
    /// An empty chain. Fails only if the runtime's timer cannot be set up.
    pub fn new() -> io::Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(Self {
            tiers: Vec::new(),
            runtime: Arc::new(runtime),
        })
    }

    pub fn with_tier(mut self, suggester: Arc<dyn MoveSuggester>, timeout: Duration) -> Self {
        self.tiers.push(Tier { suggester, timeout });
        self
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Produce a move for the color to move in `session`.
    ///
    /// Never fails: tier errors are logged and the next step is tried.
    pub fn resolve(&self, session: &GameSession) -> Resolved {
        self.resolve_for(session, session.to_move())
    }

    /// Produce a move for `player` on the current board of `session`,
    /// whether or not it is that player's turn.
    pub fn resolve_for(&self, session: &GameSession, player: Color) -> Resolved {
        let board = session.board();
        let request =
            SuggestionRequest::new(board, player, session.captures(), session.last_move());

        for tier in &self.tiers {
            match self.runtime.block_on(try_tier(tier, &request, board, player)) {
                Ok(suggestion) => {
                    debug!(tier = tier.suggester.name(), mv = ?suggestion.mv, "suggestion accepted");
                    return Resolved {
                        mv: suggestion.mv,
                        source: MoveSource::Tier(tier.suggester.name().to_string()),
                        rationale: suggestion.rationale,
                    };
                }
                Err(e) => warn!("{e}, falling back"),
            }
        }

        match first_legal_point(board, player) {
            Some(p) => Resolved {
                mv: Move::Place(p),
                source: MoveSource::FirstLegalPoint,
                rationale: None,
            },
            None => Resolved {
                mv: Move::Pass,
                source: MoveSource::Pass,
                rationale: None,
            },
        }
    }
}

async fn try_tier(
    tier: &Tier,
    request: &SuggestionRequest,
    board: &Board,
    player: Color,
) -> Result<Suggestion, SuggestError> {
    let raw = request_with_timeout(tier.suggester.as_ref(), request, tier.timeout).await?;
    let name = tier.suggester.name();
    let suggestion = raw
        .validate(board.size())
        .map_err(|source| SuggestError::Invalid {
            name: name.to_string(),
            source,
        })?;
    if let Move::Place(point) = suggestion.mv {
        attempt_move(board, point, player).map_err(|source| SuggestError::Illegal {
            name: name.to_string(),
            point,
            source,
        })?;
    }
    Ok(suggestion)
}
