//! Shared data types

mod state;

pub use state::{Cursor, EditorState, OverallState, ProjectState, RepoState, Selection};
