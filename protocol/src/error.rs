use quizgrid_core::GameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document {0} does not exist")]
    NotFound(String),
    #[error("Document {0} already exists")]
    AlreadyExists(String),
    #[error("Document {path} changed: expected revision {expected}, found {actual}")]
    Conflict {
        path: String,
        expected: u64,
        actual: u64,
    },
    #[error("Write rejected: {0}")]
    Rejected(String),
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Game(#[from] GameError),
}

impl StoreError {
    /// Lost a conditional write to another client.
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::AlreadyExists(_) | Self::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
