use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Unknown player")]
    UnknownPlayer,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Unknown question kind {0}")]
    UnknownQuestionKind(u8),
    #[error("Question bank has no questions")]
    EmptyQuestionBank,
}

pub type Result<T> = core::result::Result<T, GameError>;
