//! End-of-game territory scoring.
//!
//! Scoring works on a view of the final board with every stone marked dead
//! taken off. Each maximal empty region of that view belongs to a color if
//! only that color's stones border it; regions touching both colors, or no
//! stones at all, are neutral. Dead stones count as captures for the
//! opponent, and White receives komi.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, BoardSize, Color, Point};
use crate::constants::{RESIGNATION_LOSS_TOTAL, RESIGNATION_WIN_TOTAL};

/// Stones captured during play, per capturing color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captures {
    /// White stones captured by Black
    pub black: u32,
    /// Black stones captured by White
    pub white: u32,
}

impl Captures {
    pub fn by(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub fn add(&mut self, color: Color, stones: u32) {
        match color {
            Color::Black => self.black += stones,
            Color::White => self.white += stones,
        }
    }
}

/// Stones marked dead during the scoring phase, keyed by packed index.
///
/// Marking never changes the board itself; the marks only affect the scoring
/// view built by [`calculate_final_score`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadStones {
    size: BoardSize,
    marked: HashSet<usize>,
}

impl DeadStones {
    pub fn new(size: BoardSize) -> Self {
        Self {
            size,
            marked: HashSet::new(),
        }
    }

    fn key(&self, p: Point) -> Option<usize> {
        let n = self.size.get();
        (p.x < n && p.y < n).then_some(p.y * n + p.x)
    }

    /// Mark a point. Returns false for off-board points.
    pub fn mark(&mut self, p: Point) -> bool {
        match self.key(p) {
            Some(k) => {
                self.marked.insert(k);
                true
            }
            None => false,
        }
    }

    pub fn unmark(&mut self, p: Point) {
        if let Some(k) = self.key(p) {
            self.marked.remove(&k);
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.key(p).is_some_and(|k| self.marked.contains(&k))
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        let n = self.size.get();
        self.marked.iter().map(move |&k| Point::new(k % n, k / n))
    }
}

/// One color's share of the final score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorScore {
    /// Empty points enclosed only by this color
    pub territory: u32,
    /// In-game captures plus the opponent's dead stones
    pub captures: u32,
    /// Compensation points (White only)
    pub komi: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Black,
    White,
    Draw,
}

impl From<Color> for Winner {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Winner::Black,
            Color::White => Winner::White,
        }
    }
}

/// Final score of a game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub black: ColorScore,
    pub white: ColorScore,
    /// Empty points on the scoring view that belong to neither color
    pub neutral: u32,
    pub winner: Winner,
}

impl ScoreResult {
    /// Result of a resigned game: no counting, the winner gets a fixed
    /// total and the resigning player gets nothing.
    pub fn by_resignation(resigned: Color) -> Self {
        let winner = resigned.opponent();
        let score = |color: Color| ColorScore {
            total: if color == winner {
                RESIGNATION_WIN_TOTAL
            } else {
                RESIGNATION_LOSS_TOTAL
            },
            ..ColorScore::default()
        };
        Self {
            black: score(Color::Black),
            white: score(Color::White),
            neutral: 0,
            winner: winner.into(),
        }
    }

    pub fn of(&self, color: Color) -> &ColorScore {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    /// Winning margin, zero for a draw.
    pub fn margin(&self) -> f64 {
        (self.black.total - self.white.total).abs()
    }
}

impl fmt::Display for ScoreResult {
    /// GTP style: `B+3.5`, `W+0.5`, or `0` for a draw.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner {
            Winner::Black => write!(f, "B+{}", self.margin()),
            Winner::White => write!(f, "W+{}", self.margin()),
            Winner::Draw => f.write_str("0"),
        }
    }
}

/// Compute the final score.
///
/// `captures` are the in-game capture counts; `dead_stones` are removed from
/// a scoring copy of `board` before territory is counted. Dead marks on empty
/// points are ignored. The board itself is not modified.
pub fn calculate_final_score(
    board: &Board,
    dead_stones: &DeadStones,
    captures: Captures,
    komi: f64,
) -> ScoreResult {
    let mut view = board.clone();
    let mut dead = Captures::default();
    for p in dead_stones.points() {
        if let Some(color) = board.get(p) {
            view.set(p, None);
            // a dead stone is a prisoner for the other side
            dead.add(color.opponent(), 1);
        }
    }

    let (black_territory, white_territory, neutral) = count_territory(&view);

    let black_captures = captures.black + dead.black;
    let white_captures = captures.white + dead.white;
    let black_total = f64::from(black_territory + black_captures);
    let white_total = f64::from(white_territory + white_captures) + komi;

    let winner = if black_total > white_total {
        Winner::Black
    } else if white_total > black_total {
        Winner::White
    } else {
        Winner::Draw
    };

    let result = ScoreResult {
        black: ColorScore {
            territory: black_territory,
            captures: black_captures,
            komi: 0.0,
            total: black_total,
        },
        white: ColorScore {
            territory: white_territory,
            captures: white_captures,
            komi,
            total: white_total,
        },
        neutral,
        winner,
    };
    debug!(%result, black = black_total, white = white_total, "scored board");
    result
}

/// Count (black territory, white territory, neutral) over the empty regions.
fn count_territory(view: &Board) -> (u32, u32, u32) {
    let mut visited = vec![false; view.edge() * view.edge()];
    let (mut black, mut white, mut neutral) = (0u32, 0u32, 0u32);

    for start in view.empty_points() {
        if visited[view.index(start)] {
            continue;
        }
        visited[view.index(start)] = true;

        let mut queue = VecDeque::from([start]);
        let mut size = 0u32;
        let (mut touches_black, mut touches_white) = (false, false);
        while let Some(p) = queue.pop_front() {
            size += 1;
            for n in view.neighbors(p) {
                match view.get(n) {
                    Some(Color::Black) => touches_black = true,
                    Some(Color::White) => touches_white = true,
                    None => {
                        let i = view.index(n);
                        if !visited[i] {
                            visited[i] = true;
                            queue.push_back(n);
                        }
                    }
                }
            }
        }

        match (touches_black, touches_white) {
            (true, false) => black += size,
            (false, true) => white += size,
            _ => neutral += size,
        }
    }
    (black, white, neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rows: &[&str]) -> Board {
        let mut s = String::new();
        for i in 0..9 {
            s.push_str(rows.get(i).copied().unwrap_or("........."));
            s.push('\n');
        }
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_board_is_neutral() {
        let b = Board::default();
        let score = calculate_final_score(&b, &DeadStones::new(b.size()), Captures::default(), 6.5);
        assert_eq!(score.black.territory, 0);
        assert_eq!(score.white.territory, 0);
        assert_eq!(score.neutral, 81);
        assert_eq!(score.white.total, 6.5);
        assert_eq!(score.winner, Winner::White);
        assert_eq!(score.to_string(), "W+6.5");
    }

    #[test]
    fn test_single_color_owns_board() {
        let b = board(&["....X...."]);
        let score = calculate_final_score(&b, &DeadStones::new(b.size()), Captures::default(), 6.5);
        assert_eq!(score.black.territory, 80);
        assert_eq!(score.winner, Winner::Black);
        assert_eq!(score.to_string(), "B+73.5");
    }

    #[test]
    fn test_corner_territory() {
        // Black walls off the top-left 2x2; white sits in the open.
        let b = board(&["..X......", "..X......", "XXX......", ".........", "....O...."]);
        let score = calculate_final_score(&b, &DeadStones::new(b.size()), Captures::default(), 0.0);
        assert_eq!(score.black.territory, 4);
        assert_eq!(score.white.territory, 0);
        assert_eq!(score.neutral, 81 - 5 - 1 - 4);
    }

    #[test]
    fn test_dead_stones_count_for_opponent() {
        // A white stone inside black's corner is marked dead.
        let b = board(&[".O.X.....", "...X.....", "XXXX.....", ".........", "....O...."]);
        let mut dead = DeadStones::new(b.size());
        dead.mark(Point::new(1, 0));
        let score = calculate_final_score(&b, &dead, Captures { black: 2, white: 1 }, 0.0);
        assert_eq!(score.black.territory, 6);
        assert_eq!(score.black.captures, 3);
        assert_eq!(score.white.captures, 1);
        // board untouched
        assert_eq!(b.get(Point::new(1, 0)), Some(Color::White));
    }

    #[test]
    fn test_dead_mark_on_empty_point_ignored() {
        let b = board(&["....X...."]);
        let mut dead = DeadStones::new(b.size());
        dead.mark(Point::new(0, 0));
        let score = calculate_final_score(&b, &dead, Captures::default(), 6.5);
        assert_eq!(score.white.captures, 0);
        assert_eq!(score.black.captures, 0);
    }

    #[test]
    fn test_exact_tie_is_draw() {
        let b = board(&["....X...."]);
        let score = calculate_final_score(&b, &DeadStones::new(b.size()), Captures::default(), 80.0);
        assert_eq!(score.winner, Winner::Draw);
        assert_eq!(score.margin(), 0.0);
        assert_eq!(score.to_string(), "0");
    }

    #[test]
    fn test_resignation_convention() {
        let score = ScoreResult::by_resignation(Color::Black);
        assert_eq!(score.winner, Winner::White);
        assert_eq!(score.white.total, 1.0);
        assert_eq!(score.black.total, 0.0);
        assert_eq!(score.white.territory, 0);
        assert_eq!(score.white.komi, 0.0);
    }

    #[test]
    fn test_dead_stones_keys() {
        let mut dead = DeadStones::new(BoardSize::Nine);
        assert!(dead.mark(Point::new(3, 2)));
        assert!(!dead.mark(Point::new(9, 0)));
        assert!(dead.contains(Point::new(3, 2)));
        assert_eq!(dead.points().collect::<Vec<_>>(), vec![Point::new(3, 2)]);
        dead.unmark(Point::new(3, 2));
        assert!(dead.is_empty());
    }
}
