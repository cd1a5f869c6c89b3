use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// A claimed cell, as recorded in the move log.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMove {
    pub player: PlayerId,
    pub coords: Coord2,
    pub pattern: Pattern,
    pub value: Points,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: PlayerId,
    pub score: Points,
    pub moves: CellCount,
}

impl PlayerScore {
    pub const fn zero(player: PlayerId) -> Self {
        Self {
            player,
            score: 0.0,
            moves: 0,
        }
    }
}

/// Applies the first `cursor` moves to a copy of `initial`. A cursor past the
/// end of the log applies every move.
pub fn replay(initial: &Board, moves: &[ResolvedMove], cursor: usize, mode: ValueMode) -> Result<Board> {
    let mut board = initial.clone();
    let applied = &moves[..cursor.min(moves.len())];

    for m in applied {
        let coords = board.validate_coords(m.coords)?;
        let cell = &mut board[coords];
        cell.owner = Some(m.player);
        cell.pattern = m.pattern;
        cell.value = Some(m.value);
    }
    log::trace!("replayed {} of {} moves", applied.len(), moves.len());

    if mode == ValueMode::Adjacency {
        recount_values(&mut board);
    }

    Ok(board)
}

/// Sets every owned cell's value to the number of same-owner cells in its
/// pattern ring.
pub fn recount_values(board: &mut Board) {
    let counts: Vec<(Coord2, u8)> = board
        .iter()
        .filter_map(|(coords, cell)| {
            let owner = cell.owner?;
            Some((coords, board.count_owned_in_pattern(coords, cell.pattern, owner)))
        })
        .collect();

    for (coords, count) in counts {
        board[coords].value = Some(Points::from(count));
    }
}

/// Per-player score and owned-cell count, in roster order.
pub fn scores(board: &Board, player_count: u8) -> Vec<PlayerScore> {
    let mut scores: Vec<PlayerScore> = (0..player_count).map(|i| PlayerScore::zero(PlayerId(i))).collect();

    for (_, cell) in board.iter() {
        let Some(owner) = cell.owner else { continue };
        match scores.get_mut(owner.index()) {
            Some(entry) => {
                entry.score += cell.value.unwrap_or(0.0);
                entry.moves += 1;
            }
            None => log::warn!("Cell owned by player {owner} outside a roster of {player_count}"),
        }
    }

    scores
}
