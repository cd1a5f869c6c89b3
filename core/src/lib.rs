#![no_std]

extern crate alloc;

use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use cursor::*;
pub use eligibility::*;
pub use error::*;
pub use generator::*;
pub use outcome::*;
pub use pattern::*;
pub use quiz::*;
pub use replay::*;
pub use rules::*;
pub use types::*;

mod cell;
mod cursor;
mod eligibility;
mod error;
mod generator;
mod outcome;
mod pattern;
mod quiz;
mod replay;
mod rules;
mod types;

/// Largest number of players a roster can hold; one per available color.
pub const MAX_PLAYERS: u8 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSize {
    pub rows: Coord,
    pub cols: Coord,
}

impl GameSize {
    pub const fn new_unchecked(rows: Coord, cols: Coord) -> Self {
        Self { rows, cols }
    }

    pub fn new(rows: Coord, cols: Coord) -> Self {
        Self::new_unchecked(rows.clamp(1, Coord::MAX), cols.clamp(1, Coord::MAX))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub const fn bounds(&self) -> Coord2 {
        (self.rows, self.cols)
    }

    pub const fn contains(&self, coords: Coord2) -> bool {
        coords.0 < self.rows && coords.1 < self.cols
    }
}

impl Default for GameSize {
    fn default() -> Self {
        Self::new_unchecked(5, 5)
    }
}

/// Grid of cells, `rows` by `cols`, addressed by `(x, y)` = `(row, column)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
}

impl Board {
    pub fn new(size: GameSize) -> Self {
        Self {
            cells: Array2::default(size.bounds().to_nd_index()),
        }
    }

    pub fn size(&self) -> GameSize {
        let (rows, cols) = self.cells.dim();
        GameSize::new_unchecked(
            rows.try_into().unwrap_or(Coord::MAX),
            cols.try_into().unwrap_or(Coord::MAX),
        )
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.size().contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<&Cell> {
        self.cells.get(coords.to_nd_index())
    }

    /// All cells with their coordinates, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, &Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((x, y), cell)| ((x as Coord, y as Coord), cell))
    }

    pub fn free_cells(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.iter()
            .filter(|(_, cell)| cell.is_free())
            .map(|(coords, _)| coords)
    }

    pub fn first_free_cell(&self) -> Option<Coord2> {
        self.free_cells().next()
    }

    pub fn free_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.is_free()).count() as CellCount
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_free())
    }

    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = Coord2> + '_ {
        self.iter()
            .filter(move |(_, cell)| cell.is_owned_by(player))
            .map(|(coords, _)| coords)
    }

    /// In-bounds cells reached from `center` by `pattern`.
    pub fn iter_pattern(&self, center: Coord2, pattern: Pattern) -> PatternIter {
        pattern.iter(center, self.size().bounds())
    }

    /// Number of cells in `center`'s `pattern` ring owned by `player`.
    pub fn count_owned_in_pattern(&self, center: Coord2, pattern: Pattern, player: PlayerId) -> u8 {
        self.iter_pattern(center, pattern)
            .filter(|&pos| self[pos].is_owned_by(player))
            .count() as u8
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.cells[(x as usize, y as usize)]
    }
}

impl IndexMut<Coord2> for Board {
    fn index_mut(&mut self, (x, y): Coord2) -> &mut Self::Output {
        &mut self.cells[(x as usize, y as usize)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn game_size_clamps_to_at_least_one() {
        let size = GameSize::new(0, 7);
        assert_eq!(size, GameSize::new_unchecked(1, 7));
        assert_eq!(size.total_cells(), 7);
    }

    #[test]
    fn board_is_row_major() {
        let size = GameSize::new(2, 3);
        let mut board = Board::new(size);
        assert_eq!(board.size(), size);
        assert_eq!(board.free_count(), 6);
        board[(1, 1)].owner = Some(PlayerId(1));
        assert_eq!(board.free_count(), 5);
        assert_eq!(board.owned_by(PlayerId(1)).collect::<Vec<_>>(), [(1, 1)]);
        assert_eq!(board.first_free_cell(), Some((0, 0)));
        assert!(!board.is_full());
    }

    #[test]
    fn validate_coords_rejects_outside_cells() {
        let board = Board::new(GameSize::new(3, 4));
        assert_eq!(board.validate_coords((2, 3)), Ok((2, 3)));
        assert_eq!(board.validate_coords((3, 0)), Err(GameError::InvalidCoords));
        assert_eq!(board.validate_coords((0, 4)), Err(GameError::InvalidCoords));
    }
}
