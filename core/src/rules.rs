use serde::{Deserialize, Serialize};

use crate::*;

/// How cell values are obtained when a move history is replayed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// Keep the value the answering client recorded with the move.
    #[default]
    Recorded,
    /// Recount, for every owned cell, the same-owner cells in its pattern ring.
    Adjacency,
}

/// Points awarded for one question kind. `None` means no move is made.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindValues {
    /// The mover answered correctly.
    pub correct: Option<Points>,
    /// The mover answered incorrectly.
    pub wrong: Option<Points>,
    /// Nobody answered before the timer ran out.
    pub timeout: Option<Points>,
    /// Someone other than the mover answered a competitive question correctly.
    pub rival_correct: Option<Points>,
}

impl KindValues {
    pub const fn new(
        correct: Option<Points>,
        wrong: Option<Points>,
        timeout: Option<Points>,
        rival_correct: Option<Points>,
    ) -> Self {
        Self {
            correct,
            wrong,
            timeout,
            rival_correct,
        }
    }
}

impl Default for KindValues {
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueTable {
    pub safe: KindValues,
    pub balanced: KindValues,
    pub risky: KindValues,
    pub race: KindValues,
    pub duel: KindValues,
    pub high_duel: KindValues,
}

impl ValueTable {
    pub const fn get(&self, kind: QuestionKind) -> &KindValues {
        match kind {
            QuestionKind::Safe => &self.safe,
            QuestionKind::Balanced => &self.balanced,
            QuestionKind::Risky => &self.risky,
            QuestionKind::Race => &self.race,
            QuestionKind::Duel => &self.duel,
            QuestionKind::HighDuel => &self.high_duel,
        }
    }
}

impl Default for ValueTable {
    fn default() -> Self {
        Self {
            safe: KindValues::new(Some(1.5), Some(1.0), Some(1.0), None),
            balanced: KindValues::new(Some(2.0), Some(0.5), Some(0.5), None),
            risky: KindValues::new(Some(2.5), None, None, None),
            race: KindValues::new(Some(3.0), None, None, Some(0.5)),
            duel: KindValues::new(Some(3.5), None, None, Some(1.0)),
            high_duel: KindValues::new(Some(4.0), None, None, Some(1.5)),
        }
    }
}

/// Tunable game-balance parameters.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub values: ValueTable,
    pub value_mode: ValueMode,
    /// Time a player has to answer once a question opens.
    pub answer_timeout_ms: u64,
    /// Competitive questions open after a random delay in this range.
    pub open_delay_min_ms: u64,
    pub open_delay_max_ms: u64,
    pub max_level: Level,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            values: ValueTable::default(),
            value_mode: ValueMode::Recorded,
            answer_timeout_ms: 10_000,
            open_delay_min_ms: 3_000,
            open_delay_max_ms: 6_000,
            max_level: 15,
        }
    }
}
