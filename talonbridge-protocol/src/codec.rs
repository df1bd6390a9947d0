//! Message codec for newline-delimited JSON framing
//!
//! Each message is one JSON document on one line. A malformed line on the
//! server side is surfaced as an item (`Err(MalformedCommand)`) rather than
//! a stream error, so one bad request never tears down the connection.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::messages::{Command, CursorlessResponse, Response, SidecarCommand, SidecarState};

/// Maximum message size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large (max {max} bytes)")]
    MessageTooLarge { max: usize },
}

impl From<LinesCodecError> for CodecError {
    fn from(e: LinesCodecError) -> Self {
        match e {
            LinesCodecError::Io(e) => CodecError::Io(e),
            LinesCodecError::MaxLineLengthExceeded => CodecError::MessageTooLarge {
                max: MAX_MESSAGE_SIZE,
            },
        }
    }
}

/// A request line that did not decode into a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCommand {
    /// The raw line as received (empty when the line was discarded)
    pub raw: String,
    /// Why decoding failed
    pub reason: String,
}

/// One decoded request line
pub type DecodedCommand = Result<Command, MalformedCommand>;

/// Decode a single request line, leniently
pub fn decode_command(line: &str) -> DecodedCommand {
    serde_json::from_str(line.trim()).map_err(|e| MalformedCommand {
        raw: line.to_string(),
        reason: format!("invalid command: {}", e),
    })
}

/// Encode a response as one newline-terminated line
pub fn encode_response(response: &Response) -> Result<String, CodecError> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    Ok(line)
}

/// Encode a sidecar request as one newline-terminated line
pub fn encode_sidecar_command(command: &SidecarCommand) -> Result<String, CodecError> {
    let mut line = serde_json::to_string(command)?;
    line.push('\n');
    Ok(line)
}

/// Decode the sidecar's reply to a `cursorless` command
pub fn decode_cursorless_response(raw: &str) -> Result<CursorlessResponse, CodecError> {
    Ok(serde_json::from_str(raw.trim())?)
}

/// Decode the sidecar's reply to `stateWithContents`
pub fn decode_sidecar_state(raw: &str) -> Result<SidecarState, CodecError> {
    Ok(serde_json::from_str(raw.trim())?)
}

fn lines() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_MESSAGE_SIZE)
}

/// Codec for Command (decoding) and Response (encoding)
/// Used by the command socket server
pub struct ServerCodec {
    lines: LinesCodec,
}

impl ServerCodec {
    pub fn new() -> Self {
        Self { lines: lines() }
    }

    fn next(&mut self, src: &mut BytesMut, eof: bool) -> Result<Option<DecodedCommand>, CodecError> {
        loop {
            let line = match if eof {
                self.lines.decode_eof(src)
            } else {
                self.lines.decode(src)
            } {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                // The lines codec keeps discarding up to the next newline
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    return Ok(Some(Err(MalformedCommand {
                        raw: String::new(),
                        reason: format!("message too large (max {} bytes)", MAX_MESSAGE_SIZE),
                    })))
                }
                Err(e) => return Err(e.into()),
            };

            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(decode_command(&line)));
        }
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ServerCodec {
    type Item = DecodedCommand;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.next(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.next(src, true)
    }
}

impl Encoder<Response> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_string(&item)?;
        self.lines.encode(json, dst)?;
        Ok(())
    }
}

/// Codec for Command (encoding) and Response (decoding)
/// Used by the command-line client
pub struct ClientCodec {
    lines: LinesCodec,
}

impl ClientCodec {
    pub fn new() -> Self {
        Self { lines: lines() }
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ClientCodec {
    type Item = Response;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.lines.decode(src)? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(serde_json::from_str(&line)?)),
                None => return Ok(None),
            }
        }
    }
}

impl Encoder<Command> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_string(&item)?;
        self.lines.encode(json, dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::CommandResponse;
    use bytes::BufMut;
    use futures::{SinkExt, StreamExt};
    use tokio_util::codec::{Framed, FramedRead};

    #[test]
    fn test_decode_single_command() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::from(&b"{\"command\":\"ping\"}\n"[..]);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Ok(Command::new("ping")));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::from(&b"{\"command\":\"go"[..]);

        // Should return None for partial message
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.put_slice(b"to\",\"args\":[\"3\"]}\n");
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Ok(Command::with_args("goto", ["3"])));
    }

    #[test]
    fn test_coalesced_lines() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::from(&b"{\"command\":\"ping\"}\n{\"command\":\"content\"}\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), Ok(Command::new("ping")));
        assert_eq!(
            codec.decode(&mut buf).unwrap().unwrap(),
            Ok(Command::new("content"))
        );
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::from(&b"\n  \r\n{\"command\":\"ping\"}\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), Ok(Command::new("ping")));
    }

    #[test]
    fn test_final_line_without_newline_at_eof() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::from(&b"{\"command\":\"ping\"}"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap().unwrap(),
            Ok(Command::new("ping"))
        );
    }

    #[test]
    fn test_malformed_line_is_an_item() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::from(&b"not json\n{\"command\":\"ping\"}\n"[..]);

        let first = codec.decode(&mut buf).unwrap().unwrap();
        let malformed = first.unwrap_err();
        assert_eq!(malformed.raw, "not json");
        assert!(malformed.reason.starts_with("invalid command"));

        // The next line still decodes
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), Ok(Command::new("ping")));
    }

    #[test]
    fn test_command_round_trip_bytes() {
        let inputs = [
            r#"{"command":"ping"}"#,
            r#"{"command":"goto","args":["12","4"]}"#,
            r#"{"command":"insertAtCursors","args":["hello","world"]}"#,
        ];
        for input in inputs {
            let cmd = decode_command(input).unwrap();
            assert_eq!(serde_json::to_string(&cmd).unwrap(), input);
        }
    }

    #[test]
    fn test_response_round_trip_bytes() {
        let inputs = [
            r#"{"pid":1,"product":"IDE 1.0","response":{"result":"pong"},"receivedCommand":"{\"command\":\"ping\"}"}"#,
            r#"{"pid":1,"product":"IDE 1.0","receivedCommand":null,"error":"invalid command: frob"}"#,
        ];
        for input in inputs {
            let resp: Response = serde_json::from_str(input).unwrap();
            assert_eq!(encode_response(&resp).unwrap(), format!("{}\n", input));
        }
    }

    #[test]
    fn test_encode_response_is_one_line() {
        let resp = Response::ok(
            1,
            "IDE",
            CommandResponse::result("line one\nline two"),
            None,
        );
        let line = encode_response(&resp).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_decode_sidecar_state_lenient() {
        let state = decode_sidecar_state(r#"{"path":"/a.rs","cursors":[],"unknown":1}"#).unwrap();
        assert_eq!(state.path, "/a.rs");
        assert!(state.contents_path.is_none());
    }

    #[test]
    fn test_decode_transport_error_string_fails() {
        assert!(decode_cursorless_response("Error: connection refused").is_err());
    }

    #[tokio::test]
    async fn test_framed_client_server_exchange() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let mut client = Framed::new(client_io, ClientCodec::new());
        let mut server = Framed::new(server_io, ServerCodec::new());

        client.send(Command::new("ping")).await.unwrap();
        let received = server.next().await.unwrap().unwrap().unwrap();
        assert_eq!(received, Command::new("ping"));

        server
            .send(Response::ok(9, "IDE", CommandResponse::result("pong"), None))
            .await
            .unwrap();
        let response = client.next().await.unwrap().unwrap();
        assert_eq!(response.result(), Some("pong"));
    }

    #[tokio::test]
    async fn test_framed_read_to_eof() {
        let input: &[u8] = b"{\"command\":\"ping\"}\ngarbage\n{\"command\":\"state\"}";
        let items: Vec<_> = FramedRead::new(input, ServerCodec::new())
            .collect::<Vec<_>>()
            .await;

        assert_eq!(items.len(), 3);
        assert!(items[0].as_ref().unwrap().is_ok());
        assert!(items[1].as_ref().unwrap().is_err());
        assert_eq!(
            items[2].as_ref().unwrap().as_ref().unwrap(),
            &Command::new("state")
        );
    }
}
