//! End-to-end tests for indexing and question answering.

mod query_pipeline;
