use quizgrid_core::{Coord2, GameError, QuestionPhase};
use quizgrid_protocol::StoreError;
use thiserror::Error;

/// Why a player action was refused.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No game has been started")]
    NoGame,
    #[error("This client is not seated in the current game")]
    NotSeated,
    #[error("Not every player is ready")]
    NotReady,
    #[error("It is not this player's turn")]
    NotYourTurn,
    #[error("A question is still waiting for answers")]
    QuestionPending,
    #[error("Moves can only be made from the latest position")]
    ReplayInProgress,
    #[error("Cell {0:?} cannot be claimed")]
    NotEligible(Coord2),
    #[error("There is no question to answer")]
    NoQuestion,
    #[error("This player does not answer the current question")]
    NotAnswerer,
    #[error("The question is not accepting answers ({0:?})")]
    NotOpen(QuestionPhase),
    #[error("Answer {0} is not one of the choices")]
    InvalidAnswer(u8),
    #[error("Players can only change seats before the first question")]
    RosterLocked,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
