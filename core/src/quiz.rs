use alloc::string::String;
use alloc::vec::Vec;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Question difficulty, `1..=max_level`.
pub type Level = u8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub level: Level,
    pub title: String,
    pub answers: Vec<String>,
    pub correct: u8,
}

impl Question {
    /// `None` is the empty answer submitted when the timer runs out.
    pub fn is_correct(&self, choice: Option<u8>) -> bool {
        choice == Some(self.correct)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Random question of the given level. Falls back to any question when the
    /// level has none.
    pub fn pick<R: Rng>(&self, level: Level, rng: &mut R) -> Result<&Question> {
        let at_level: Vec<&Question> = self.questions.iter().filter(|q| q.level == level).collect();
        if at_level.is_empty() {
            log::warn!("No questions at level {level}, picking from the whole bank");
            return self.pick_any(rng);
        }
        Ok(at_level[rng.random_range(0..at_level.len())])
    }

    /// Random question other than `current`, unless it is the only one.
    pub fn pick_other<R: Rng>(&self, current: &str, rng: &mut R) -> Result<&Question> {
        let others: Vec<&Question> = self.questions.iter().filter(|q| q.id != current).collect();
        if others.is_empty() {
            return self.pick_any(rng);
        }
        Ok(others[rng.random_range(0..others.len())])
    }

    pub fn pick_any<R: Rng>(&self, rng: &mut R) -> Result<&Question> {
        if self.questions.is_empty() {
            return Err(GameError::EmptyQuestionBank);
        }
        Ok(&self.questions[rng.random_range(0..self.questions.len())])
    }
}

/// The move mode a player picks before claiming a cell. Serialized as its
/// numeric tag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum QuestionKind {
    /// Solo, small gain either way.
    #[default]
    Safe,
    /// Solo, large gain when correct, small when wrong.
    Balanced,
    /// Solo, no move unless correct.
    Risky,
    /// Everyone answers; the coordinator awards the cell afterwards.
    Race,
    /// Everyone answers; the first correct answer claims the cell.
    Duel,
    /// Like `Duel` with higher stakes.
    HighDuel,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 6] = [
        QuestionKind::Safe,
        QuestionKind::Balanced,
        QuestionKind::Risky,
        QuestionKind::Race,
        QuestionKind::Duel,
        QuestionKind::HighDuel,
    ];

    pub const fn is_competitive(self) -> bool {
        matches!(self, Self::Race | Self::Duel | Self::HighDuel)
    }

    /// Whether an answer produces a move directly rather than through the
    /// coordinator.
    pub const fn resolves_on_answer(self) -> bool {
        !matches!(self, Self::Race)
    }
}

impl From<QuestionKind> for u8 {
    fn from(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::Safe => 0,
            QuestionKind::Balanced => 1,
            QuestionKind::Risky => 2,
            QuestionKind::Race => 3,
            QuestionKind::Duel => 4,
            QuestionKind::HighDuel => 5,
        }
    }
}

impl TryFrom<u8> for QuestionKind {
    type Error = GameError;

    fn try_from(tag: u8) -> Result<Self> {
        QuestionKind::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or(GameError::UnknownQuestionKind(tag))
    }
}

/// Players who must answer before a question resolves.
pub fn required_answerers(kind: QuestionKind, mover: PlayerId, player_count: u8) -> Vec<PlayerId> {
    if kind.is_competitive() {
        (0..player_count).map(PlayerId).collect()
    } else {
        alloc::vec![mover]
    }
}

/// Value of the move an answer produces, or `None` when no move is made.
pub fn answer_value(kind: QuestionKind, table: &ValueTable, by_mover: bool, correct: bool) -> Option<Points> {
    if !kind.resolves_on_answer() {
        return None;
    }

    let values = table.get(kind);
    match (kind.is_competitive(), by_mover, correct) {
        (true, true, true) => values.correct,
        (true, false, true) => values.rival_correct,
        (true, _, false) => None,
        (false, _, true) => values.correct,
        (false, _, false) => values.wrong,
    }
}

/// Value of the move made when the timer submits an empty answer.
pub fn timeout_value(kind: QuestionKind, table: &ValueTable) -> Option<Points> {
    if kind.is_competitive() {
        None
    } else {
        table.get(kind).timeout
    }
}

/// One player's answer to a race question, in server order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RaceAttempt {
    pub player: PlayerId,
    pub correct: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RaceOutcome {
    /// Ask another question for the same cell.
    Reask,
    Award { player: PlayerId, value: Points },
}

/// Decides a finished race. `questions_for_cell` counts race questions asked
/// for this cell so far, including the current one.
pub fn resolve_race(
    attempts: &[RaceAttempt],
    mover: PlayerId,
    questions_for_cell: usize,
    table: &ValueTable,
) -> RaceOutcome {
    let mut correct = attempts.iter().filter(|attempt| attempt.correct);
    let Some(first) = correct.next() else {
        return RaceOutcome::Reask;
    };

    if correct.next().is_some() && questions_for_cell <= 1 {
        return RaceOutcome::Reask;
    }

    let values = table.get(QuestionKind::Race);
    let value = if first.player == mover {
        values.correct
    } else {
        values.rival_correct
    };
    RaceOutcome::Award {
        player: first.player,
        value: value.unwrap_or(0.0),
    }
}

/// Where a question stands for one answering player.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuestionPhase {
    /// Visible but not yet accepting answers.
    Delayed,
    Open,
    /// The answer window elapsed; an empty answer is due.
    Expired,
    Answered,
}

impl QuestionPhase {
    pub const fn accepts_answer(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Timing of a posted question, in server milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTiming {
    pub posted_at_ms: i64,
    pub open_delay_ms: u64,
}

impl QuestionTiming {
    /// Solo questions open immediately; competitive ones after their delay.
    pub fn new(kind: QuestionKind, posted_at_ms: i64, open_delay_ms: u64) -> Self {
        Self {
            posted_at_ms,
            open_delay_ms: if kind.is_competitive() { open_delay_ms } else { 0 },
        }
    }

    pub fn opens_at_ms(&self) -> i64 {
        self.posted_at_ms.saturating_add_unsigned(self.open_delay_ms)
    }

    /// The answer window runs from posting, so the open delay eats into it.
    pub fn expires_at_ms(&self, answer_timeout_ms: u64) -> i64 {
        self.posted_at_ms.saturating_add_unsigned(answer_timeout_ms)
    }

    pub fn phase(&self, now_ms: i64, answered: bool, answer_timeout_ms: u64) -> QuestionPhase {
        if answered {
            QuestionPhase::Answered
        } else if now_ms >= self.expires_at_ms(answer_timeout_ms) {
            QuestionPhase::Expired
        } else if now_ms < self.opens_at_ms() {
            QuestionPhase::Delayed
        } else {
            QuestionPhase::Open
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn question(id: &str, level: Level) -> Question {
        Question {
            id: id.to_string(),
            level,
            title: "2 + 2".to_string(),
            answers: vec!["3".to_string(), "4".to_string()],
            correct: 1,
        }
    }

    #[test]
    fn kind_tags_round_trip() {
        for kind in QuestionKind::ALL {
            assert_eq!(QuestionKind::try_from(u8::from(kind)), Ok(kind));
        }
        assert_eq!(QuestionKind::try_from(6), Err(GameError::UnknownQuestionKind(6)));
        assert_eq!(serde_json::to_string(&QuestionKind::Duel).unwrap(), "4");
    }

    #[test]
    fn solo_values_follow_table() {
        let table = ValueTable::default();
        assert_eq!(answer_value(QuestionKind::Safe, &table, true, true), Some(1.5));
        assert_eq!(answer_value(QuestionKind::Safe, &table, true, false), Some(1.0));
        assert_eq!(answer_value(QuestionKind::Balanced, &table, true, true), Some(2.0));
        assert_eq!(answer_value(QuestionKind::Balanced, &table, true, false), Some(0.5));
        assert_eq!(answer_value(QuestionKind::Risky, &table, true, true), Some(2.5));
        assert_eq!(answer_value(QuestionKind::Risky, &table, true, false), None);

        assert_eq!(timeout_value(QuestionKind::Safe, &table), Some(1.0));
        assert_eq!(timeout_value(QuestionKind::Balanced, &table), Some(0.5));
        assert_eq!(timeout_value(QuestionKind::Risky, &table), None);
    }

    #[test]
    fn duel_values_depend_on_who_answered() {
        let table = ValueTable::default();
        assert_eq!(answer_value(QuestionKind::Duel, &table, true, true), Some(3.5));
        assert_eq!(answer_value(QuestionKind::Duel, &table, false, true), Some(1.0));
        assert_eq!(answer_value(QuestionKind::HighDuel, &table, true, true), Some(4.0));
        assert_eq!(answer_value(QuestionKind::HighDuel, &table, false, true), Some(1.5));
        assert_eq!(answer_value(QuestionKind::HighDuel, &table, true, false), None);
        assert_eq!(timeout_value(QuestionKind::Duel, &table), None);
    }

    #[test]
    fn race_answers_never_move_directly() {
        let table = ValueTable::default();
        assert_eq!(answer_value(QuestionKind::Race, &table, true, true), None);
        assert_eq!(timeout_value(QuestionKind::Race, &table), None);
    }

    #[test]
    fn required_answerers_depend_on_kind() {
        assert_eq!(required_answerers(QuestionKind::Balanced, PlayerId(2), 3), [PlayerId(2)]);
        assert_eq!(
            required_answerers(QuestionKind::Race, PlayerId(2), 3),
            [PlayerId(0), PlayerId(1), PlayerId(2)]
        );
    }

    #[test]
    fn race_without_correct_answers_is_reasked() {
        let table = ValueTable::default();
        let attempts = [
            RaceAttempt { player: PlayerId(0), correct: false },
            RaceAttempt { player: PlayerId(1), correct: false },
        ];
        assert_eq!(resolve_race(&attempts, PlayerId(0), 1, &table), RaceOutcome::Reask);
        assert_eq!(resolve_race(&[], PlayerId(0), 3, &table), RaceOutcome::Reask);
    }

    #[test]
    fn tied_race_is_reasked_only_the_first_time() {
        let table = ValueTable::default();
        let attempts = [
            RaceAttempt { player: PlayerId(1), correct: true },
            RaceAttempt { player: PlayerId(0), correct: true },
        ];
        assert_eq!(resolve_race(&attempts, PlayerId(0), 1, &table), RaceOutcome::Reask);
        assert_eq!(
            resolve_race(&attempts, PlayerId(0), 2, &table),
            RaceOutcome::Award { player: PlayerId(1), value: 0.5 }
        );
    }

    #[test]
    fn single_correct_racer_wins() {
        let table = ValueTable::default();
        let attempts = [
            RaceAttempt { player: PlayerId(1), correct: false },
            RaceAttempt { player: PlayerId(0), correct: true },
        ];
        assert_eq!(
            resolve_race(&attempts, PlayerId(0), 1, &table),
            RaceOutcome::Award { player: PlayerId(0), value: 3.0 }
        );
    }

    #[test]
    fn competitive_questions_open_after_delay() {
        let timing = QuestionTiming::new(QuestionKind::Duel, 1_000, 4_000);
        assert_eq!(timing.phase(2_000, false, 10_000), QuestionPhase::Delayed);
        assert_eq!(timing.phase(5_000, false, 10_000), QuestionPhase::Open);
        assert_eq!(timing.phase(10_999, false, 10_000), QuestionPhase::Open);
        assert_eq!(timing.phase(11_000, false, 10_000), QuestionPhase::Expired);
        assert_eq!(timing.phase(11_000, true, 10_000), QuestionPhase::Answered);
    }

    #[test]
    fn delay_longer_than_timeout_never_opens() {
        let timing = QuestionTiming::new(QuestionKind::Race, 0, 12_000);
        assert_eq!(timing.phase(9_999, false, 10_000), QuestionPhase::Delayed);
        assert_eq!(timing.phase(10_000, false, 10_000), QuestionPhase::Expired);
        assert_eq!(timing.phase(12_000, false, 10_000), QuestionPhase::Expired);
    }

    #[test]
    fn solo_questions_ignore_delay() {
        let timing = QuestionTiming::new(QuestionKind::Safe, 1_000, 4_000);
        assert_eq!(timing.opens_at_ms(), 1_000);
        assert!(timing.phase(1_000, false, 10_000).accepts_answer());
        assert_eq!(timing.phase(11_000, false, 10_000), QuestionPhase::Expired);
    }

    #[test]
    fn pick_other_skips_current() {
        let bank = QuestionBank::new(vec![question("a", 1), question("b", 3)]);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(bank.pick_other("a", &mut rng).unwrap().id, "b");
        }
        let single = QuestionBank::new(vec![question("a", 1)]);
        assert_eq!(single.pick_other("a", &mut rng).unwrap().id, "a");
    }

    #[test]
    fn pick_prefers_requested_level() {
        let bank = QuestionBank::new(vec![question("a", 1), question("b", 2), question("c", 2)]);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(bank.pick(2, &mut rng).unwrap().level, 2);
        }
        assert!(bank.pick(9, &mut rng).is_ok());
        assert_eq!(
            QuestionBank::default().pick_any(&mut rng),
            Err(GameError::EmptyQuestionBank)
        );
        assert!(question("x", 1).is_correct(Some(1)));
        assert!(!question("x", 1).is_correct(None));
    }
}
