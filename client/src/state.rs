use quizgrid_core::{
    Board, Coord2, GameRules, Outcome, PlayerId, PlayerScore, Points, QuestionPhase, ReplayCursor,
    eligible_cells, outcome, required_answerers, score_lead, scores,
};
use quizgrid_protocol::{AnswerDoc, GameSnapshot, MoveAttemptDoc, QuestionDoc, Stored};

use crate::*;

/// Everything the client shows, rebuilt from the store after every change.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AppState {
    #[default]
    Loading,
    NoGame,
    Ready(Box<GameView>),
    /// The last load failed; the message is for display only.
    Failed(String),
}

impl AppState {
    pub fn view(&self) -> Option<&GameView> {
        match self {
            Self::Ready(view) => Some(view),
            _ => None,
        }
    }
}

/// One client's view of the current game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameView {
    pub snapshot: GameSnapshot,
    /// Seat of this client, if it has one.
    pub me: Option<PlayerId>,
    pub cursor: ReplayCursor,
    /// Board and scores at the cursor.
    pub board: Board,
    pub scores: Vec<PlayerScore>,
    /// Board and scores after every move.
    pub last_board: Board,
    pub last_scores: Vec<PlayerScore>,
    /// Cells this client may claim on the latest board.
    pub eligible: Vec<Coord2>,
    pub outcome: Outcome,
    pub question: Option<Stored<QuestionDoc>>,
    pub my_answer: Option<AnswerDoc>,
}

impl GameView {
    pub fn build(snapshot: GameSnapshot, cursor: ReplayCursor, me: Option<PlayerId>, rules: &GameRules) -> Result<Self> {
        let player_count = snapshot.player_count();
        let board = snapshot.board_at(cursor.current(), rules.value_mode)?;
        let last_board = snapshot.board_at(snapshot.moves.len(), rules.value_mode)?;
        let last_scores = scores(&last_board, player_count);
        let eligible = me.map(|me| eligible_cells(&last_board, me)).unwrap_or_default();
        let question = snapshot.current_question().cloned();
        let my_answer = question.as_ref().and_then(|q| {
            let color = snapshot.color_of(me?)?;
            snapshot.answer_of(&q.id, color).map(|a| a.data.clone())
        });

        Ok(Self {
            me,
            cursor,
            scores: scores(&board, player_count),
            board,
            outcome: outcome(&last_board, &last_scores),
            last_board,
            last_scores,
            eligible,
            question,
            my_answer,
            snapshot,
        })
    }

    pub fn my_color(&self) -> Option<&str> {
        self.snapshot.color_of(self.me?)
    }

    pub fn all_ready(&self) -> bool {
        self.snapshot.game.data.all_ready()
    }

    pub fn is_my_turn(&self) -> bool {
        self.me.is_some() && self.me == self.snapshot.move_player()
    }

    /// Why `cell` cannot be claimed right now, if it cannot.
    pub fn check_claim(&self, cell: Coord2) -> Result<()> {
        if self.me.is_none() {
            return Err(SessionError::NotSeated);
        }
        if !self.cursor.is_last() {
            return Err(SessionError::ReplayInProgress);
        }
        if !self.all_ready() {
            return Err(SessionError::NotReady);
        }
        if !self.is_my_turn() {
            return Err(SessionError::NotYourTurn);
        }
        if self.question.is_some() {
            return Err(SessionError::QuestionPending);
        }
        if !self.eligible.contains(&cell) {
            return Err(SessionError::NotEligible(cell));
        }
        Ok(())
    }

    pub fn can_claim(&self, cell: Coord2) -> bool {
        self.check_claim(cell).is_ok()
    }

    /// Whether this client has to answer the current question.
    pub fn must_answer(&self) -> bool {
        let (Some(me), Some(question)) = (self.me, &self.question) else {
            return false;
        };
        let Some(mover) = self.snapshot.player_id(&question.data.player_move.player) else {
            return false;
        };
        required_answerers(question.data.question_type, mover, self.snapshot.player_count()).contains(&me)
    }

    /// Where the current question stands for this client.
    pub fn question_phase(&self, now_ms: i64, rules: &GameRules) -> Option<QuestionPhase> {
        let question = self.question.as_ref()?;
        Some(
            question
                .data
                .timing()
                .phase(now_ms, self.my_answer.is_some(), rules.answer_timeout_ms),
        )
    }

    /// Competitive attempts made on `cell`, shown next to it.
    pub fn attempts_at(&self, cell: Coord2) -> Vec<&MoveAttemptDoc> {
        self.snapshot
            .competitive_attempts_at(cell)
            .into_iter()
            .map(|a| &a.data)
            .collect()
    }

    /// Lead over the best rival at the cursor, shown once moves exist.
    pub fn my_lead(&self) -> Option<Points> {
        if self.snapshot.moves.is_empty() {
            return None;
        }
        score_lead(&self.scores, self.me?)
    }
}
