//! Random play.
//!
//! [`RandomSuggester`] picks a uniformly random legal move that does not
//! fill one of the mover's own eyes, and passes when none is left. Skipping
//! eye-filling moves is what lets random games end: without it a player
//! would eventually fill its last eyes and get captured over and over.
//!
//! [`playout`] plays such moves on a session until both players pass.

use std::sync::Mutex;

use anyhow::{Context, anyhow};

use crate::board::{Board, Color, Point};
use crate::game::{GameSession, Move, Phase};
use crate::rules::is_legal;
use crate::suggest::{MoveSuggester, RawSuggestion, SuggestFut, SuggestionRequest};

/// Check if a point is "eyeish" for `color`: every on-board neighbor is one
/// of its stones. This may be true for false eyes.
pub fn is_eyeish(board: &Board, pt: Point, color: Color) -> bool {
    board.is_empty_at(pt) && board.neighbors(pt).all(|n| board.get(n) == Some(color))
}

/// Choose a random legal move that is not an eye of `player`.
pub fn choose_random_move(board: &Board, player: Color, rng: &mut fastrand::Rng) -> Option<Point> {
    let mut candidates: Vec<Point> = board
        .empty_points()
        .filter(|&p| !is_eyeish(board, p, player))
        .collect();

    // Shuffle and try moves until we find a legal one
    // (some candidates might be suicide moves)
    rng.shuffle(&mut candidates);
    candidates.into_iter().find(|&p| is_legal(board, p, player))
}

/// Suggester answering with random legal moves.
pub struct RandomSuggester {
    rng: Mutex<fastrand::Rng>,
}

impl Default for RandomSuggester {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSuggester {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Reproducible sequence of suggestions.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    fn pick(&self, request: &SuggestionRequest) -> anyhow::Result<RawSuggestion> {
        let board = request.parse_board().context("decoding request board")?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("random suggester state poisoned"))?;

        Ok(match choose_random_move(&board, request.to_move, &mut rng) {
            Some(p) => {
                RawSuggestion::place(p.x as i64, p.y as i64).with_rationale("random legal move")
            }
            None => RawSuggestion::pass().with_rationale("no moves outside own eyes"),
        })
    }
}

impl MoveSuggester for RandomSuggester {
    fn name(&self) -> &str {
        "random"
    }

    fn suggest<'a>(&'a self, request: &'a SuggestionRequest) -> SuggestFut<'a> {
        Box::pin(std::future::ready(self.pick(request)))
    }
}

/// Play random moves until both players pass or `max_moves` is reached.
///
/// Returns the number of moves played, passes included.
pub fn playout(session: &mut GameSession, rng: &mut fastrand::Rng, max_moves: usize) -> usize {
    let mut played = 0;
    while played < max_moves && session.phase() == Phase::Playing {
        let mv = match choose_random_move(session.board(), session.to_move(), rng) {
            Some(p) => Move::Place(p),
            None => Move::Pass,
        };
        // chosen moves are legal by construction
        if session.apply(mv).is_err() {
            break;
        }
        played += 1;
    }
    played
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSize;
    use crate::game::GameConfig;

    #[test]
    fn test_is_eyeish() {
        let board: Board = "\
            .X.......
            X........
            .........
            .........
            .........
            .........
            .........
            .........
            ........."
            .parse()
            .unwrap();
        assert!(is_eyeish(&board, Point::new(0, 0), Color::Black));
        assert!(!is_eyeish(&board, Point::new(0, 0), Color::White));
        assert!(!is_eyeish(&board, Point::new(4, 4), Color::Black));
        assert!(!is_eyeish(&board, Point::new(1, 0), Color::Black));
    }

    #[tokio::test]
    async fn test_random_suggestion_is_legal() {
        let suggester = RandomSuggester::with_seed(7);
        let session = GameSession::default();
        let request = SuggestionRequest::from_session(&session);
        for _ in 0..20 {
            let raw = suggester.suggest(&request).await.unwrap();
            let s = raw.validate(BoardSize::Nine).unwrap();
            let Move::Place(p) = s.mv else {
                panic!("expected a placement, got {:?}", s.mv);
            };
            assert!(is_legal(session.board(), p, Color::Black));
        }
    }

    #[tokio::test]
    async fn test_seeded_suggester_is_reproducible() {
        let request = SuggestionRequest::from_session(&GameSession::default());
        let a = RandomSuggester::with_seed(42);
        let b = RandomSuggester::with_seed(42);
        for _ in 0..5 {
            assert_eq!(
                a.suggest(&request).await.unwrap(),
                b.suggest(&request).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_undecodable_board_fails() {
        let mut request = SuggestionRequest::from_session(&GameSession::default());
        request.board[0].push('?');
        assert!(RandomSuggester::new().suggest(&request).await.is_err());
    }

    #[test]
    fn test_playout_ends_in_scoring() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut session = GameSession::new(GameConfig::default());
        let played = playout(&mut session, &mut rng, 1000);
        assert!(played > 0);
        assert_eq!(session.phase(), Phase::Scoring);
        assert_eq!(session.move_number(), played);
    }
}
