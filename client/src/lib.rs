//! Player client for quizgrid: one [`Session`] per seat keeps a local view of
//! the shared game and performs that player's writes, including the turn
//! coordination every client takes part in.

pub use bot::*;
pub use error::*;
pub use identity::*;
pub use questions::*;
pub use session::*;
pub use state::*;

pub use quizgrid_protocol::{Clock, ManualClock, SystemClock};

mod bot;
mod error;
mod identity;
mod questions;
mod session;
mod state;
