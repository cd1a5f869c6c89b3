use quizgrid_core::Coord2;
use serde::{Deserialize, Serialize};

/// Colors handed out to players, in seating order.
pub const PLAYER_COLORS: [&str; 5] = ["orange", "lightblue", "lightgreen", "pink", "aqua"];

/// Collection names in the document store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Collections {
    pub boards: String,
    pub moves: String,
    pub questions: String,
    pub answers: String,
    pub move_attempts: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            boards: "boards".to_string(),
            moves: "moves".to_string(),
            questions: "questions".to_string(),
            answers: "answers".to_string(),
            move_attempts: "moveAttempts".to_string(),
        }
    }
}

impl Collections {
    pub fn games(&self) -> String {
        self.boards.clone()
    }

    pub fn moves_of(&self, game_id: &str) -> String {
        format!("{}/{game_id}/{}", self.boards, self.moves)
    }

    pub fn questions_of(&self, game_id: &str) -> String {
        format!("{}/{game_id}/{}", self.boards, self.questions)
    }

    pub fn answers_of(&self, game_id: &str) -> String {
        format!("{}/{game_id}/{}", self.boards, self.answers)
    }

    pub fn move_attempts_of(&self, game_id: &str) -> String {
        format!("{}/{game_id}/{}", self.boards, self.move_attempts)
    }
}

/// Moves are keyed by the cell they claim, so a cell holds at most one move.
pub fn move_doc_id((x, y): Coord2) -> String {
    format!("{x}_{y}")
}

/// Answers and move attempts are keyed per question and player.
pub fn player_doc_id(question_id: &str, color: &str) -> String {
    format!("{question_id}_{color}")
}
