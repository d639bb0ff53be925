/// State management module
///
/// This module handles all application state, including:
/// - Database connections and queries (library.rs)
/// - Shared data structures (data.rs)
/// - The add-photo draft and its workflow (draft.rs, workflow.rs)
/// - Editing stored photos (edit.rs)
/// - Error types (error.rs)

pub mod data;
pub mod draft;
pub mod edit;
pub mod error;
pub mod library;
pub mod workflow;
