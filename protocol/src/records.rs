use chrono::{DateTime, Utc};
use quizgrid_core::{
    Board, Cell, Coord, Coord2, GameError, GameSize, Pattern, Points, Question, QuestionKind,
    QuestionTiming, QuizCell,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDoc {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_ready: bool,
}

impl PlayerDoc {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            name: None,
            is_ready: false,
        }
    }
}

/// A cell of the freshly generated board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDoc {
    pub id: String,
    pub x: Coord,
    pub y: Coord,
    pub cell_type: Pattern,
    pub question_type: QuizCell,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDoc {
    pub id: String,
    pub size: GameSize,
    pub players: Vec<PlayerDoc>,
    pub board: Vec<CellDoc>,
    pub date: DateTime<Utc>,
    /// Color of the player whose turn it is.
    pub move_player: String,
    /// Question shared by solo moves until the level rotates.
    pub question: Question,
}

impl GameDoc {
    pub fn new(
        id: String,
        players: Vec<PlayerDoc>,
        board: &Board,
        question: Question,
        date: DateTime<Utc>,
    ) -> Self {
        let cells = board
            .iter()
            .map(|((x, y), cell)| CellDoc {
                id: uuid::Uuid::new_v4().to_string(),
                x,
                y,
                cell_type: cell.pattern,
                question_type: cell.quiz,
            })
            .collect();
        let move_player = players.first().map(|p| p.color.clone()).unwrap_or_default();

        Self {
            id,
            size: board.size(),
            players,
            board: cells,
            date,
            move_player,
            question,
        }
    }

    /// Rebuilds the empty board the move log is replayed onto.
    pub fn initial_board(&self) -> Result<Board, GameError> {
        if self.board.len() != usize::from(self.size.total_cells()) {
            return Err(GameError::InvalidBoardShape);
        }

        let mut board = Board::new(self.size);
        for doc in &self.board {
            let coords = board.validate_coords((doc.x, doc.y))?;
            board[coords] = Cell {
                pattern: doc.cell_type,
                ..Cell::new(doc.question_type)
            };
        }
        Ok(board)
    }

    pub fn player_index(&self, color: &str) -> Option<usize> {
        self.players.iter().position(|p| p.color == color)
    }

    pub fn all_ready(&self) -> bool {
        self.players.iter().all(|p| p.is_ready)
    }
}

/// The cell a player is trying to claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMoveDoc {
    pub player: String,
    pub x: Coord,
    pub y: Coord,
    pub cell_type: Pattern,
}

impl PlayerMoveDoc {
    pub fn new(player: impl Into<String>, (x, y): Coord2, cell_type: Pattern) -> Self {
        Self {
            player: player.into(),
            x,
            y,
            cell_type,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        (self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDoc {
    pub question_id: String,
    pub question_type: QuestionKind,
    #[serde(rename = "move")]
    pub player_move: PlayerMoveDoc,
    pub value: Points,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDoc {
    pub id: String,
    /// Client time the question was posted, in milliseconds.
    pub posted_at: i64,
    pub delay_time: u64,
    #[serde(rename = "move")]
    pub player_move: PlayerMoveDoc,
    pub question: Question,
    pub question_type: QuestionKind,
    #[serde(default)]
    pub is_closed: bool,
}

impl QuestionDoc {
    pub fn timing(&self) -> QuestionTiming {
        QuestionTiming::new(self.question_type, self.posted_at, self.delay_time)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDoc {
    pub question_id: String,
    pub player: String,
    /// Chosen answer index, `-1` for the empty answer sent on timeout.
    pub answer: i32,
    pub client_date: i64,
    pub think_time: i64,
}

impl AnswerDoc {
    pub const EMPTY: i32 = -1;

    pub fn choice(&self) -> Option<u8> {
        u8::try_from(self.answer).ok()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAttemptDoc {
    pub question_id: String,
    #[serde(rename = "move")]
    pub player_move: PlayerMoveDoc,
    pub is_correct: bool,
    /// When the question opened for answers, in milliseconds.
    pub move_attempt_date: i64,
    pub question_type: QuestionKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizgrid_core::{BoardGenerator, RandomBoardGenerator};

    fn question() -> Question {
        Question {
            id: "q".to_string(),
            level: 3,
            title: "Capital of France?".to_string(),
            answers: vec!["Paris".to_string(), "Rome".to_string()],
            correct: 0,
        }
    }

    #[test]
    fn game_doc_round_trips_the_initial_board() {
        let board = RandomBoardGenerator::new(5).generate(GameSize::new(4, 3));
        let players = vec![PlayerDoc::new("orange"), PlayerDoc::new("pink")];
        let game = GameDoc::new("g".to_string(), players, &board, question(), DateTime::default());

        assert_eq!(game.board.len(), 12);
        assert_eq!(game.move_player, "orange");
        assert_eq!(game.initial_board().unwrap(), board);
        assert_eq!(game.player_index("pink"), Some(1));
        assert!(!game.all_ready());
    }

    #[test]
    fn truncated_board_is_rejected() {
        let board = Board::new(GameSize::new(2, 2));
        let mut game = GameDoc::new("g".to_string(), vec![], &board, question(), DateTime::default());
        game.board.pop();
        assert_eq!(game.initial_board(), Err(GameError::InvalidBoardShape));
    }

    #[test]
    fn move_doc_uses_wire_names() {
        let doc = MoveDoc {
            question_id: "q".to_string(),
            question_type: QuestionKind::Balanced,
            player_move: PlayerMoveDoc::new("aqua", (1, 2), Pattern::Knight),
            value: 2.0,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["questionType"], 1);
        assert_eq!(json["move"]["cellType"], "knight");
        assert_eq!(json["move"]["y"], 2);
    }

    #[test]
    fn empty_answer_has_no_choice() {
        let answer = AnswerDoc {
            question_id: "q".to_string(),
            player: "pink".to_string(),
            answer: AnswerDoc::EMPTY,
            client_date: 0,
            think_time: 0,
        };
        assert_eq!(answer.choice(), None);
        assert_eq!(AnswerDoc { answer: 2, ..answer }.choice(), Some(2));
    }
}
