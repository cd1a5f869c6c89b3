use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    /// Every player tied at the top score, when that is not everyone.
    Winners(Vec<PlayerId>),
    /// All players share the top score.
    Draw,
}

impl Outcome {
    pub const fn is_over(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// The game ends once no free cell is left.
pub fn outcome(board: &Board, scores: &[PlayerScore]) -> Outcome {
    if !board.is_full() {
        return Outcome::InProgress;
    }

    let Some(best) = scores.iter().map(|s| s.score).reduce(f64::max) else {
        return Outcome::Draw;
    };
    let winners: Vec<PlayerId> = scores
        .iter()
        .filter(|s| s.score == best)
        .map(|s| s.player)
        .collect();

    if winners.len() == scores.len() && scores.len() > 1 {
        Outcome::Draw
    } else {
        Outcome::Winners(winners)
    }
}

/// How far `player` is ahead of the best rival. `None` without rivals or when
/// the player is not on the scoreboard.
pub fn score_lead(scores: &[PlayerScore], player: PlayerId) -> Option<Points> {
    let own = scores.iter().find(|s| s.player == player)?.score;
    let best_rival = scores
        .iter()
        .filter(|s| s.player != player)
        .map(|s| s.score)
        .reduce(f64::max)?;
    Some(own - best_rival)
}

/// Formats a lead as `+1.5`, `-2`, or `=0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LeadDisplay(pub Points);

impl fmt::Display for LeadDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            lead if lead > 0.0 => write!(f, "+{lead}"),
            lead if lead < 0.0 => write!(f, "{lead}"),
            _ => write!(f, "=0"),
        }
    }
}
