//! Board model: a fixed-size square grid of empty/black/white points.
//!
//! The grid is stored as a flat row-major vector, so every point has a packed
//! index `y * N + x`. Rows are numbered from the top (`y = 0`), which is also
//! the order diagrams are written in. GTP vertices count rows from the bottom;
//! [`parse_vertex`] and [`format_vertex`] translate between the two.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{COLUMN_LETTERS, EMPTY, STONE_BLACK, STONE_WHITE};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Diagram character for a stone of this color.
    pub fn symbol(self) -> char {
        match self {
            Color::Black => STONE_BLACK,
            Color::White => STONE_WHITE,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => f.write_str("black"),
            Color::White => f.write_str("white"),
        }
    }
}

impl FromStr for Color {
    type Err = BoardError;

    /// Accepts the GTP spellings `b`, `black`, `w`, `white` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Ok(Color::Black),
            "w" | "white" => Ok(Color::White),
            _ => Err(BoardError::UnknownColor(s.to_string())),
        }
    }
}

/// A point on the board: `x` is the column, `y` the row from the top.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the board sizes the engine accepts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoardSize {
    #[default]
    Nine,
    Thirteen,
    Nineteen,
}

impl BoardSize {
    /// Edge length in points.
    pub const fn get(self) -> usize {
        match self {
            BoardSize::Nine => 9,
            BoardSize::Thirteen => 13,
            BoardSize::Nineteen => 19,
        }
    }
}

impl TryFrom<usize> for BoardSize {
    type Error = BoardError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        match n {
            9 => Ok(BoardSize::Nine),
            13 => Ok(BoardSize::Thirteen),
            19 => Ok(BoardSize::Nineteen),
            other => Err(BoardError::UnsupportedSize(other)),
        }
    }
}

impl FromStr for BoardSize {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s
            .trim()
            .parse::<usize>()
            .map_err(|_| BoardError::InvalidSize(s.to_string()))?;
        BoardSize::try_from(n)
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unsupported board size {0} (expected 9, 13 or 19)")]
    UnsupportedSize(usize),
    #[error("invalid board size '{0}'")]
    InvalidSize(String),
    #[error("diagram row {row} has {len} points, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("unknown diagram character '{0}'")]
    UnknownCell(char),
    #[error("unknown color '{0}'")]
    UnknownColor(String),
}

/// An N×N Go board.
///
/// A board handed out by the engine is never modified afterwards: moves
/// produce a fresh board (see [`attempt_move`](crate::rules::attempt_move)),
/// so older boards kept in a history stay valid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Option<Color>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BoardSize::default())
    }
}

impl Board {
    /// Create a board with every point empty.
    pub fn new(size: BoardSize) -> Self {
        let n = size.get();
        Self {
            size,
            cells: vec![None; n * n],
        }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Edge length in points.
    pub fn edge(&self) -> usize {
        self.size.get()
    }

    /// Packed index `y * N + x`. The point must be on the board.
    #[inline]
    pub fn index(&self, p: Point) -> usize {
        p.y * self.edge() + p.x
    }

    /// Inverse of [`Board::index`].
    #[inline]
    pub fn point_at(&self, index: usize) -> Point {
        let n = self.edge();
        Point::new(index % n, index / n)
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x < self.edge() && p.y < self.edge()
    }

    /// Stone at `p`, or `None` if the point is empty or off the board.
    #[inline]
    pub fn get(&self, p: Point) -> Option<Color> {
        if !self.contains(p) {
            return None;
        }
        self.cells[self.index(p)]
    }

    pub fn is_empty_at(&self, p: Point) -> bool {
        self.contains(p) && self.cells[self.index(p)].is_none()
    }

    pub(crate) fn set(&mut self, p: Point, value: Option<Color>) {
        let i = self.index(p);
        self.cells[i] = value;
    }

    /// The orthogonal neighbors of an on-board point, clipped to the edges.
    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + use<> {
        let n = self.edge();
        let Point { x, y } = p;
        [
            (x > 0).then(|| Point::new(x - 1, y)),
            (x + 1 < n).then(|| Point::new(x + 1, y)),
            (y > 0).then(|| Point::new(x, y - 1)),
            (y + 1 < n).then(|| Point::new(x, y + 1)),
        ]
        .into_iter()
        .flatten()
    }

    /// Every point in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let n = self.edge();
        (0..n * n).map(move |i| Point::new(i % n, i / n))
    }

    /// Empty points in row-major order.
    pub fn empty_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points().filter(|&p| self.get(p).is_none())
    }

    /// Occupied points with their colors, in row-major order.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Color)> + '_ {
        self.points()
            .filter_map(|p| self.get(p).map(|color| (p, color)))
    }

    pub fn count(&self, color: Color) -> usize {
        self.cells.iter().filter(|c| **c == Some(color)).count()
    }

    /// One string per row, top to bottom, using the diagram characters.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.edge())
            .map(|row| row.iter().map(|c| cell_symbol(*c)).collect())
            .collect()
    }
}

fn cell_symbol(cell: Option<Color>) -> char {
    cell.map_or(EMPTY, Color::symbol)
}

impl FromStr for Board {
    type Err = BoardError;

    /// Parse a diagram: one line per row, `.` empty, `X` black, `O` white.
    /// Whitespace inside a row and blank lines are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<char>> = s
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();

        let size = BoardSize::try_from(rows.len())?;
        let mut board = Board::new(size);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != size.get() {
                return Err(BoardError::RaggedRow {
                    row: y,
                    len: row.len(),
                    expected: size.get(),
                });
            }
            for (x, &ch) in row.iter().enumerate() {
                let cell = match ch.to_ascii_uppercase() {
                    STONE_BLACK => Some(Color::Black),
                    STONE_WHITE => Some(Color::White),
                    EMPTY => None,
                    other => return Err(BoardError::UnknownCell(other)),
                };
                board.set(Point::new(x, y), cell);
            }
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.edge()) {
            for cell in row {
                write!(f, "{} ", cell_symbol(*cell))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse a GTP vertex (e.g. "D4") into a point on a board of the given size.
///
/// Columns use letters A-T skipping I; rows count up from the bottom edge.
/// Returns `None` for malformed or off-board vertices. "pass" is not a vertex
/// and is handled by the caller.
pub fn parse_vertex(s: &str, size: BoardSize) -> Option<Point> {
    let n = size.get();
    let s = s.trim();
    let mut chars = s.chars();
    let col_char = chars.next()?.to_ascii_uppercase();
    let x = COLUMN_LETTERS[..n]
        .iter()
        .position(|&c| c as char == col_char)?;

    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 || row > n {
        return None;
    }
    Some(Point::new(x, n - row))
}

/// Format a point as a GTP vertex (e.g. "D4"), or `None` if it is off a
/// board of the given size.
pub fn format_vertex(p: Point, size: BoardSize) -> Option<String> {
    let n = size.get();
    if p.x >= n || p.y >= n {
        return None;
    }
    let col = COLUMN_LETTERS[p.x] as char;
    Some(format!("{col}{}", n - p.y))
}
