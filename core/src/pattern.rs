use serde::{Deserialize, Serialize};

use crate::*;

/// Adjacency pattern of a claimed cell. Each pattern is a ring of exactly eight
/// offsets, listed clockwise starting from `(0, +1)` or its nearest equivalent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    #[default]
    Normal,
    Knight,
    Diamond,
}

const NORMAL_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const DIAMOND_OFFSETS: [(i8, i8); 8] = [
    (0, 2),
    (1, 1),
    (2, 0),
    (1, -1),
    (0, -2),
    (-1, -1),
    (-2, 0),
    (-1, 1),
];

impl Pattern {
    pub const ALL: [Pattern; 3] = [Pattern::Normal, Pattern::Knight, Pattern::Diamond];

    pub const fn offsets(self) -> &'static [(i8, i8); 8] {
        match self {
            Self::Normal => &NORMAL_OFFSETS,
            Self::Knight => &KNIGHT_OFFSETS,
            Self::Diamond => &DIAMOND_OFFSETS,
        }
    }

    /// The eight raw targets around `center`, including those off the board.
    pub fn ring(self, center: Coord2) -> [(i16, i16); 8] {
        let (x, y) = (i16::from(center.0), i16::from(center.1));
        self.offsets()
            .map(|(dx, dy)| (x + i16::from(dx), y + i16::from(dy)))
    }

    /// In-bounds targets around `center` on a board of size `bounds`.
    pub fn iter(self, center: Coord2, bounds: Coord2) -> PatternIter {
        PatternIter::new(self, center, bounds)
    }
}

#[derive(Debug, Clone)]
pub struct PatternIter {
    offsets: &'static [(i8, i8); 8],
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl PatternIter {
    fn new(pattern: Pattern, center: Coord2, bounds: Coord2) -> Self {
        Self {
            offsets: pattern.offsets(),
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for PatternIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if usize::from(self.index) >= self.offsets.len() {
                return None;
            }

            let next_item = apply_delta(self.center, self.offsets[self.index as usize], self.bounds);
            self.index += 1;

            if next_item.is_some() {
                return next_item;
            }
        }
    }
}
