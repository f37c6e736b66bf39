//! Domain models for the Bookshelf platform.

pub mod book;
pub mod interaction;

pub use book::Book;
pub use interaction::{Interaction, LibraryRecord, Provenance, ReadingStatus};
