use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use ndarray::Array2;

use crate::*;

/// Neighbourhood balance around a free cell, seen from one player.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Contest {
    /// Normal-adjacent cells owned by the player.
    pub coverage: u8,
    /// Largest number of normal-adjacent cells held by any single rival.
    pub max_rival: u8,
}

impl Contest {
    pub fn around(board: &Board, target: Coord2, player: PlayerId) -> Self {
        let mut by_owner: BTreeMap<PlayerId, u8> = BTreeMap::new();
        for pos in board.iter_pattern(target, Pattern::Normal) {
            if let Some(owner) = board[pos].owner {
                *by_owner.entry(owner).or_default() += 1;
            }
        }

        let coverage = by_owner.get(&player).copied().unwrap_or(0);
        let max_rival = by_owner
            .iter()
            .filter(|(owner, _)| **owner != player)
            .map(|(_, count)| *count)
            .max()
            .unwrap_or(0);

        Self { coverage, max_rival }
    }

    /// A player may not take a cell some single rival surrounds more heavily.
    pub const fn is_fair(&self) -> bool {
        self.coverage >= self.max_rival
    }
}

/// Whether `player` may claim the free cell at `target` under the fairness rule.
pub fn is_fair_target(board: &Board, target: Coord2, player: PlayerId) -> bool {
    Contest::around(board, target, player).is_fair()
}

/// Free cells a knight's move away from any cell `player` owns that pass the
/// fairness rule, in row-major order.
pub fn eligible_cells(board: &Board, player: PlayerId) -> Vec<Coord2> {
    let mut reachable: Array2<bool> = Array2::default(board.size().bounds().to_nd_index());
    for owned in board.owned_by(player) {
        for target in board.iter_pattern(owned, Pattern::Knight) {
            if board[target].is_free() {
                reachable[target.to_nd_index()] = true;
            }
        }
    }

    reachable
        .indexed_iter()
        .filter(|(_, reached)| **reached)
        .map(|((x, y), _)| (x as Coord, y as Coord))
        .filter(|&target| is_fair_target(board, target, player))
        .collect()
}

/// Whether `player` may claim `target` right now.
pub fn is_eligible(board: &Board, target: Coord2, player: PlayerId) -> bool {
    let Some(cell) = board.get(target) else {
        return false;
    };
    cell.is_free()
        && board
            .iter_pattern(target, Pattern::Knight)
            .any(|from| board[from].is_owned_by(player))
        && is_fair_target(board, target, player)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: PlayerId = PlayerId(0);
    const B: PlayerId = PlayerId(1);
    const C: PlayerId = PlayerId(2);

    fn board_with(size: GameSize, owned: &[(PlayerId, Coord2)]) -> Board {
        let mut board = Board::new(size);
        for &(player, coords) in owned {
            board[coords].owner = Some(player);
            board[coords].value = Some(1.0);
        }
        board
    }

    #[test]
    fn player_without_cells_has_no_eligible_cells() {
        let board = board_with(GameSize::new(5, 5), &[(B, (2, 2))]);
        assert!(eligible_cells(&board, A).is_empty());
    }

    #[test]
    fn uncontested_knight_targets_are_eligible() {
        let board = board_with(GameSize::new(5, 5), &[(A, (0, 0))]);
        assert_eq!(eligible_cells(&board, A), [(1, 2), (2, 1)]);
    }

    #[test]
    fn covered_target_is_eligible() {
        let board = board_with(
            GameSize::new(5, 5),
            &[(A, (1, 1)), (A, (1, 2)), (A, (2, 2)), (B, (4, 0))],
        );
        let contest = Contest::around(&board, (2, 3), A);
        assert_eq!(contest, Contest { coverage: 2, max_rival: 0 });
        assert!(is_eligible(&board, (2, 3), A));
        assert!(eligible_cells(&board, A).contains(&(2, 3)));
    }

    #[test]
    fn rival_majority_blocks_target() {
        let board = board_with(
            GameSize::new(5, 5),
            &[
                (A, (1, 1)),
                (A, (1, 2)),
                (A, (2, 2)),
                (B, (3, 3)),
                (B, (3, 4)),
                (B, (2, 4)),
            ],
        );
        assert_eq!(Contest::around(&board, (2, 3), A), Contest { coverage: 2, max_rival: 3 });
        assert!(!is_eligible(&board, (2, 3), A));
        assert!(!eligible_cells(&board, A).contains(&(2, 3)));
    }

    #[test]
    fn tie_with_single_rival_is_allowed() {
        let board = board_with(GameSize::new(3, 3), &[(A, (0, 0)), (B, (1, 2))]);
        // (1, 1) is not knight-reachable from (0, 0); check the rule directly.
        let contest = Contest::around(&board, (1, 1), A);
        assert_eq!(contest, Contest { coverage: 1, max_rival: 1 });
        assert!(contest.is_fair());
    }

    #[test]
    fn rivals_are_not_pooled() {
        let board = board_with(
            GameSize::new(5, 5),
            &[(A, (0, 0)), (A, (1, 1)), (B, (2, 1)), (C, (1, 3)), (C, (2, 3))],
        );
        // Target (1, 2): A covers (1, 1), B holds one, C holds two.
        assert_eq!(Contest::around(&board, (1, 2), A), Contest { coverage: 1, max_rival: 2 });
        assert!(!eligible_cells(&board, A).contains(&(1, 2)));

        // Target (2, 2): A covers (1, 1), B holds (2, 1), C holds (1, 3) and (2, 3).
        assert!(!is_fair_target(&board, (2, 2), A));
    }

    #[test]
    fn occupied_and_outside_cells_are_never_eligible() {
        let board = board_with(GameSize::new(5, 5), &[(A, (0, 0)), (A, (2, 0)), (B, (1, 2))]);
        assert!(!is_eligible(&board, (1, 2), A));
        assert!(!is_eligible(&board, (7, 7), A));
        assert_eq!(eligible_cells(&board, A), [(0, 1), (2, 1), (3, 2), (4, 1)]);
    }
}
