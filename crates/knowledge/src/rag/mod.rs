//! Retrieval-augmented question answering over the course notes.

pub mod ask;
pub mod prompt;
pub mod types;

pub use ask::QueryEngine;
pub use types::{QueryOptions, RagResponse, RagSourceRef};
