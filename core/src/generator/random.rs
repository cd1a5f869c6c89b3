use super::*;

/// Marks half of the cells, rounded down, as competitive quiz cells; the
/// choice is uniformly random and reproducible from the seed.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, size: GameSize) -> Board {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let total = size.total_cells();
        let competitive = sample_distinct(total / 2, total, &mut rng);

        let mut board = Board::new(size);
        for index in competitive {
            board[coords_of(index, size.cols)].quiz = QuizCell::Competitive;
        }
        board
    }
}

/// Draws `count` distinct indices from `0..total` by rejection sampling, in
/// draw order.
pub fn sample_distinct<R: Rng>(count: CellCount, total: CellCount, rng: &mut R) -> Vec<CellCount> {
    let count = if count > total {
        log::warn!("Cannot pick {count} distinct cells out of {total}, picking all of them");
        total
    } else {
        count
    };

    let mut picked: Vec<CellCount> = Vec::with_capacity(count.into());
    while picked.len() < usize::from(count) {
        let candidate = rng.random_range(0..total);
        if !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }
    picked
}
