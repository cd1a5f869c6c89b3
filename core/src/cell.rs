use core::fmt;

use serde::{Deserialize, Serialize};

use crate::*;

/// Position of a player in the game's roster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Player whose turn follows this one in a roster of `count` players.
    pub const fn next(self, count: u8) -> Self {
        if self.0.saturating_add(1) >= count {
            Self(0)
        } else {
            Self(self.0 + 1)
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// Which kind of question a free cell asks when it is claimed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizCell {
    #[default]
    Normal,
    Competitive,
}

/// One grid position as displayed after replay.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub owner: Option<PlayerId>,
    pub value: Option<Points>,
    pub pattern: Pattern,
    pub quiz: QuizCell,
}

impl Cell {
    pub const fn new(quiz: QuizCell) -> Self {
        Self {
            owner: None,
            value: None,
            pattern: Pattern::Normal,
            quiz,
        }
    }

    pub const fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }
}
