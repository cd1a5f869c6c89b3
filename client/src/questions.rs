use std::path::Path;

use quizgrid_core::{Question, QuestionBank};

/// Question bank shipped with the client, levels 1 to 15.
pub const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

pub fn bundled_bank() -> serde_json::Result<QuestionBank> {
    serde_json::from_str(BUNDLED_QUESTIONS)
}

/// Reads a bank from a JSON file, or the bundled one when no path is given.
pub fn load_bank(path: Option<&Path>) -> anyhow::Result<QuestionBank> {
    let bank = match path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => bundled_bank()?,
    };
    log::debug!("loaded {} questions", bank.len());
    Ok(bank)
}

/// Replacement used in test mode: two choices, the first one correct.
pub fn test_question(question: Question) -> Question {
    Question {
        title: "Test question, the correct answer is 1".to_string(),
        answers: vec!["1".to_string(), "2".to_string()],
        correct: 0,
        ..question
    }
}
