use quizgrid_core::{
    Board, Coord2, PlayerId, QuestionKind, RaceAttempt, ResolvedMove, ValueMode, replay, required_answerers,
};

use crate::*;

/// Everything a client knows about the current game, read in one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSnapshot {
    pub game: Stored<GameDoc>,
    pub moves: Vec<Stored<MoveDoc>>,
    pub questions: Vec<Stored<QuestionDoc>>,
    pub answers: Vec<Stored<AnswerDoc>>,
    pub attempts: Vec<Stored<MoveAttemptDoc>>,
    pub metadata: SnapshotMetadata,
}

impl GameSnapshot {
    /// Loads the most recent game and all of its logs.
    pub fn load_latest<S: DocumentStore>(repo: &Repository<S>) -> Result<Option<Self>> {
        let Some(game) = repo.latest_game()? else {
            return Ok(None);
        };
        Self::load(repo, game).map(Some)
    }

    pub fn load<S: DocumentStore>(repo: &Repository<S>, game: Stored<GameDoc>) -> Result<Self> {
        let id = game.data.id.clone();
        let (moves, moves_meta) = repo.moves(&id)?;
        let (questions, questions_meta) = repo.questions(&id)?;
        let (answers, answers_meta) = repo.answers(&id)?;
        let (attempts, attempts_meta) = repo.move_attempts(&id)?;

        let metadata = [moves_meta, questions_meta, answers_meta, attempts_meta]
            .into_iter()
            .fold(SnapshotMetadata::default(), |acc, meta| SnapshotMetadata {
                has_pending_writes: acc.has_pending_writes || meta.has_pending_writes,
                from_cache: acc.from_cache || meta.from_cache,
            });

        Ok(Self {
            game,
            moves,
            questions,
            answers,
            attempts,
            metadata,
        })
    }

    pub fn id(&self) -> &str {
        &self.game.data.id
    }

    pub fn player_count(&self) -> u8 {
        self.game.data.players.len().try_into().unwrap_or(u8::MAX)
    }

    pub fn player_id(&self, color: &str) -> Option<PlayerId> {
        let index = self.game.data.player_index(color)?;
        Some(PlayerId(index.try_into().ok()?))
    }

    pub fn color_of(&self, player: PlayerId) -> Option<&str> {
        self.game
            .data
            .players
            .get(player.index())
            .map(|p| p.color.as_str())
    }

    pub fn move_player(&self) -> Option<PlayerId> {
        self.player_id(&self.game.data.move_player)
    }

    /// The move log in server order, with colors resolved to roster positions.
    pub fn resolved_moves(&self) -> Result<Vec<ResolvedMove>> {
        self.moves
            .iter()
            .map(|m| -> Result<ResolvedMove> {
                let mv = &m.data.player_move;
                let player = self
                    .player_id(&mv.player)
                    .ok_or(quizgrid_core::GameError::UnknownPlayer)?;
                Ok(ResolvedMove {
                    player,
                    coords: mv.coords(),
                    pattern: mv.cell_type,
                    value: m.data.value,
                })
            })
            .collect()
    }

    /// Board after the first `cursor` moves.
    pub fn board_at(&self, cursor: usize, mode: ValueMode) -> Result<Board> {
        let initial = self.game.data.initial_board()?;
        Ok(replay(&initial, &self.resolved_moves()?, cursor, mode)?)
    }

    pub fn last_question(&self) -> Option<&Stored<QuestionDoc>> {
        self.questions.last()
    }

    pub fn move_at(&self, coords: Coord2) -> Option<&Stored<MoveDoc>> {
        self.moves
            .iter()
            .find(|m| m.data.player_move.coords() == coords)
    }

    pub fn answer_of(&self, question_id: &str, color: &str) -> Option<&Stored<AnswerDoc>> {
        self.answers
            .iter()
            .find(|a| a.data.question_id == question_id && a.data.player == color)
    }

    pub fn attempts_for<'a, 'q>(&'a self, question_id: &'q str) -> impl Iterator<Item = &'a Stored<MoveAttemptDoc>> + use<'a, 'q> {
        self.attempts
            .iter()
            .filter(move |a| a.data.question_id == question_id)
    }

    /// Competitive attempts made on a cell, for display next to it.
    pub fn competitive_attempts_at(&self, coords: Coord2) -> Vec<&Stored<MoveAttemptDoc>> {
        self.attempts
            .iter()
            .filter(|a| a.data.question_type.is_competitive() && a.data.player_move.coords() == coords)
            .collect()
    }

    pub fn race_attempts(&self, question_id: &str) -> Vec<RaceAttempt> {
        self.attempts_for(question_id)
            .filter_map(|a| {
                Some(RaceAttempt {
                    player: self.player_id(&a.data.player_move.player)?,
                    correct: a.data.is_correct,
                })
            })
            .collect()
    }

    /// Race questions asked so far for the cell at `coords`.
    pub fn race_questions_for(&self, coords: Coord2) -> usize {
        self.questions
            .iter()
            .filter(|q| q.data.question_type == QuestionKind::Race && q.data.player_move.coords() == coords)
            .count()
    }

    /// Whether every player who must answer `question` has done so.
    pub fn all_required_answered(&self, question: &QuestionDoc) -> bool {
        let Some(mover) = self.player_id(&question.player_move.player) else {
            return false;
        };
        required_answerers(question.question_type, mover, self.player_count())
            .into_iter()
            .filter_map(|player| self.color_of(player))
            .all(|color| self.answer_of(&question.id, color).is_some())
    }

    /// The question still waiting for answers: the last one, unless its cell
    /// already has a move or every required player has answered.
    pub fn current_question(&self) -> Option<&Stored<QuestionDoc>> {
        let last = self.last_question()?;
        if self.move_at(last.data.player_move.coords()).is_some() {
            return None;
        }
        if self.all_required_answered(&last.data) {
            return None;
        }
        Some(last)
    }
}

/// What a [`Watch`] saw after the store changed.
#[derive(Clone, Debug, PartialEq)]
pub enum WatchUpdate {
    NoGame,
    Game(Box<GameSnapshot>),
}

/// Re-reads the game only when the store has changed since the last poll,
/// standing in for a realtime listener.
#[derive(Clone, Debug, Default)]
pub struct Watch {
    seen_revision: Option<u64>,
}

impl Watch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the last revision so the next poll reloads.
    pub fn reset(&mut self) {
        self.seen_revision = None;
    }

    /// `None` when nothing changed or the new snapshot is not confirmed by the
    /// server yet.
    pub fn poll<S: DocumentStore>(&mut self, repo: &Repository<S>) -> Result<Option<WatchUpdate>> {
        let revision = repo.revision();
        if self.seen_revision == Some(revision) {
            return Ok(None);
        }

        let update = match GameSnapshot::load_latest(repo)? {
            None => WatchUpdate::NoGame,
            Some(snapshot) if !snapshot.metadata.is_confirmed() => {
                log::debug!("skipping unconfirmed snapshot of game {}", snapshot.id());
                return Ok(None);
            }
            Some(snapshot) => WatchUpdate::Game(Box::new(snapshot)),
        };

        self.seen_revision = Some(revision);
        Ok(Some(update))
    }
}
