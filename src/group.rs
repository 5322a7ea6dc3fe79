//! Group and liberty analysis.
//!
//! A group is a maximal set of same-colored stones connected through
//! orthogonal adjacency. Its liberties are the distinct empty points next to
//! any of its stones.

use std::collections::{HashSet, VecDeque};

use crate::board::{Board, Color, Point};

/// A group of connected stones and its liberties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Color of the stones, `None` for the empty group.
    pub color: Option<Color>,
    pub stones: HashSet<Point>,
    pub liberties: HashSet<Point>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn liberty_count(&self) -> usize {
        self.liberties.len()
    }

    /// A group with no liberties left is captured.
    pub fn is_captured(&self) -> bool {
        !self.is_empty() && self.liberties.is_empty()
    }
}

/// Find the group containing the stone at `start`.
///
/// Breadth-first flood fill over same-colored neighbors. Returns an empty
/// group if `start` is empty or off the board.
pub fn find_group(board: &Board, start: Point) -> Group {
    let Some(color) = board.get(start) else {
        return Group::default();
    };

    let mut group = Group {
        color: Some(color),
        ..Group::default()
    };
    let mut visited = vec![false; board.edge() * board.edge()];
    let mut queue = VecDeque::from([start]);
    visited[board.index(start)] = true;

    while let Some(p) = queue.pop_front() {
        group.stones.insert(p);
        for n in board.neighbors(p) {
            match board.get(n) {
                None => {
                    group.liberties.insert(n);
                }
                Some(c) if c == color => {
                    let i = board.index(n);
                    if !visited[i] {
                        visited[i] = true;
                        queue.push_back(n);
                    }
                }
                Some(_) => {}
            }
        }
    }
    group
}
