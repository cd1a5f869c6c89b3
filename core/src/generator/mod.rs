use alloc::vec::Vec;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

pub trait BoardGenerator {
    fn generate(self, size: GameSize) -> Board;
}

/// Random difficulty in `1..=max_level`.
pub fn random_level<R: Rng>(rng: &mut R, max_level: Level) -> Level {
    rng.random_range(1..=max_level.max(1))
}

/// Everything a fresh game needs besides its roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSetup {
    pub board: Board,
    pub level: Level,
    pub question: Question,
}

impl GameSetup {
    /// Generates the board and draws the opening question at a random level.
    pub fn random(size: GameSize, bank: &QuestionBank, rules: &GameRules, seed: u64) -> Result<Self> {
        let board = RandomBoardGenerator::new(seed).generate(size);

        let mut rng = SmallRng::seed_from_u64(seed.rotate_left(32));
        let level = random_level(&mut rng, rules.max_level);
        let question = bank.pick(level, &mut rng)?.clone();
        log::debug!(
            "new {}x{} game, level {level}, question {}",
            size.rows,
            size.cols,
            question.id
        );

        Ok(Self {
            board,
            level: question.level,
            question,
        })
    }

    pub fn competitive_cells(&self) -> Vec<Coord2> {
        self.board
            .iter()
            .filter(|(_, cell)| cell.quiz == QuizCell::Competitive)
            .map(|(coords, _)| coords)
            .collect()
    }
}
