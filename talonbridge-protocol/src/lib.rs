//! Wire protocol for talonbridge
//!
//! Messages exchanged on the command socket and with the cursorless sidecar,
//! the published editor-state snapshot types, and the newline-delimited JSON
//! codecs that frame them.

pub mod codec;
pub mod messages;
pub mod types;

pub use codec::{
    decode_command, decode_cursorless_response, decode_sidecar_state, encode_response,
    encode_sidecar_command, ClientCodec, CodecError, DecodedCommand, MalformedCommand,
    ServerCodec, MAX_MESSAGE_SIZE,
};
pub use messages::{
    Command, CommandResponse, CursorlessResponse, Response, SidecarCommand, SidecarPosition,
    SidecarSelection, SidecarState, SIDECAR_APPLY_PRIMARY_EDITOR_STATE, SIDECAR_CURSORLESS,
    SIDECAR_STATE_WITH_CONTENTS,
};
pub use types::{Cursor, EditorState, OverallState, ProjectState, RepoState, Selection};
