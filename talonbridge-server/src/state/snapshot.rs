//! Snapshot builder
//!
//! Turns the live host state into an [`OverallState`]. The snapshot is a
//! pure read of the host except for one side effect: every editor's mirror
//! is overwritten with the buffer's current text.

use tracing::warn;

use talonbridge_protocol::{EditorState, OverallState, Selection};

use super::mirror::{MirrorKey, MirrorStore};
use crate::host::{Caret, EditorHost, EditorId};

/// Build the selection record for one caret
pub fn selection_from_caret(caret: &Caret) -> Selection {
    let (start, end) = caret.range();
    Selection::new(Some(start), Some(end), Some(caret.position))
}

/// Serialize one editor, refreshing its mirror
pub fn serialize_editor(
    host: &dyn EditorHost,
    mirrors: &mut MirrorStore,
    editor: EditorId,
    active: bool,
) -> EditorState {
    let path = host.file_path(editor);

    let temporary_file_path = host.text(editor).and_then(|text| {
        let key = MirrorKey::for_editor(editor, path.as_deref());
        match mirrors.write(key, &text) {
            Ok(mirror) => Some(mirror.to_string_lossy().into_owned()),
            Err(e) => {
                warn!("Failed to write mirror for editor {}: {}", editor, e);
                None
            }
        }
    });

    let carets = host.carets(editor);
    let (first_visible_line, last_visible_line) = host.visible_lines(editor);

    EditorState {
        path: path.map(|p| p.to_string_lossy().into_owned()),
        temporary_file_path,
        active,
        project: host.project(editor),
        first_visible_line,
        last_visible_line,
        cursors: carets.iter().map(|c| c.position).collect(),
        selections: carets.iter().map(selection_from_caret).collect(),
        open_files: host.open_files(editor),
        recent_files: host.recent_files(editor),
    }
}

/// Build the full snapshot
pub fn build_snapshot(
    host: &dyn EditorHost,
    mirrors: &mut MirrorStore,
    serial: u64,
    pid: u32,
) -> OverallState {
    let active = host.active_editor();

    let active_editor = active.map(|id| serialize_editor(host, mirrors, id, true));
    let editors = host
        .visible_editors()
        .into_iter()
        .map(|id| serialize_editor(host, mirrors, id, Some(id) == active))
        .collect();

    OverallState {
        pid,
        serial,
        ide_product: host.product(),
        ide_version: host.version(),
        plugin_version: host.plugin_version(),
        active_editor,
        editors,
        recent_projects: host.recent_projects(),
    }
}
