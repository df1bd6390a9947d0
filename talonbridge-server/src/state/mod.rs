//! Editor-state snapshots and buffer mirrors

mod mirror;
mod snapshot;

pub use mirror::{MirrorKey, MirrorStore};
pub use snapshot::{build_snapshot, selection_from_caret, serialize_editor};
