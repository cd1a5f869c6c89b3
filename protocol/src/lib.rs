//! Document schemas and the document-store seam the game client talks to.
//!
//! The hosted database is modelled by [`DocumentStore`]; every record is stored
//! as JSON and written either last-write-wins ([`DocumentStore::set`]) or
//! conditionally ([`DocumentStore::create`], [`DocumentStore::update_if`]).

pub use clock::*;
pub use collections::*;
pub use error::*;
pub use records::*;
pub use repository::*;
pub use snapshot::*;
pub use store::*;

mod clock;
mod collections;
mod error;
mod records;
mod repository;
mod snapshot;
mod store;
