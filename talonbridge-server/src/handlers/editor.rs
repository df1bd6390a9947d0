//! Editor manipulation handlers
//!
//! Handles: action, find, openFile, goto, insertAtCursors, openProject

use std::path::PathBuf;

use regex::RegexBuilder;
use tracing::debug;

use talonbridge_protocol::{Command, Cursor};
use talonbridge_utils::{BridgeError, Result};

use super::{one_based, required, HandlerContext, HandlerError, HandlerResult};
use crate::host::{text, ActionOutcome, Caret, EditorHost, EditorId, ProjectOutcome};

impl HandlerContext {
    /// Run each named action; unknown ids are skipped
    pub async fn handle_action(&self, command: &Command) -> HandlerResult {
        let actions = command.args().to_vec();
        let report = self
            .host
            .run_and_wait(move |ctx| {
                let mut report = String::new();
                for action in &actions {
                    match ctx.host.run_action(action) {
                        ActionOutcome::Performed => report.push_str(&format!("{} -> OK\n", action)),
                        ActionOutcome::Rejected => {
                            report.push_str(&format!("{} -> REJECTED\n", action))
                        }
                        ActionOutcome::Unknown => debug!("No action {}", action),
                    }
                }
                report
            })
            .await?;
        Ok(format!("OK, ran: {}", report))
    }

    /// Case-insensitive regex search from the primary caret
    ///
    /// `next` leaves the caret at the end of the match, anything else searches
    /// backwards and leaves it at the start. The match is selected.
    pub async fn handle_find(&self, command: &Command) -> HandlerResult {
        let pattern = required(command, 0, "pattern")?;
        let forward = required(command, 1, "direction")? == "next";
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|_| HandlerError::InvalidArgument {
                name: "pattern",
                value: pattern.to_string(),
            })?;

        let found = self
            .host
            .run_and_wait(move |ctx| -> Result<bool> {
                let host = ctx.host.as_mut();
                let editor = host.active_editor().ok_or(BridgeError::EditorNotFound)?;
                let contents = host.text(editor).unwrap_or_default();
                let caret = host
                    .carets(editor)
                    .first()
                    .map(|c| c.position)
                    .unwrap_or_default();
                let from = text::byte_index(&contents, text::offset_of(&contents, caret));

                let found = if forward {
                    regex.find_at(&contents, from)
                } else {
                    regex.find_iter(&contents).take_while(|m| m.end() <= from).last()
                };
                let Some(found) = found else {
                    return Ok(false);
                };

                let start = text::cursor_at(&contents, text::char_offset(&contents, found.start()));
                let end = text::cursor_at(&contents, text::char_offset(&contents, found.end()));
                let position = if forward { end } else { start };
                host.set_carets(editor, &[Caret::selecting(position, start, end)])?;
                Ok(true)
            })
            .await??;

        debug!("find {:?}: found={}", command.args(), found);
        Ok(format!("OK, ran: {:?}", command.args()))
    }

    /// Open or focus a file, optionally moving to a 1-based line and column
    pub async fn handle_open_file(&self, command: &Command) -> HandlerResult {
        let raw_path = required(command, 0, "path")?;
        let path = PathBuf::from(raw_path.trim());
        let target = match command.arg(1) {
            Some(line) => Some(Cursor::new(
                one_based(line, "line")?,
                command.arg(2).map(|c| one_based(c, "column")).transpose()?.unwrap_or(0),
            )),
            None => None,
        };

        self.host
            .run_and_wait(move |ctx| -> Result<()> {
                let editor = ctx.host.open_file(&path)?;
                if let Some(target) = target {
                    ctx.host.set_carets(editor, &[Caret::at(target)])?;
                }
                Ok(())
            })
            .await??;
        Ok(format!("OK, opened: {}", raw_path))
    }

    /// Move to a 1-based line and column with a single caret
    pub async fn handle_goto(&self, command: &Command) -> HandlerResult {
        let line = one_based(required(command, 0, "line")?, "line")?;
        let column = command
            .arg(1)
            .map(|c| one_based(c, "column"))
            .transpose()?
            .unwrap_or(0);
        let target = Cursor::new(line, column);

        let moved = self
            .host
            .run_and_wait(move |ctx| -> Result<Cursor> {
                let editor = ctx.host.active_editor().ok_or(BridgeError::EditorNotFound)?;
                ctx.host.set_carets(editor, &[Caret::at(target)])?;
                Ok(primary_position(ctx.host.as_ref(), editor).unwrap_or(target))
            })
            .await??;
        Ok(format!("OK, moved to: {}", moved))
    }

    /// Insert the space-joined arguments at every caret as one edit
    pub async fn handle_insert_at_cursors(&self, command: &Command) -> HandlerResult {
        let insert = command.args().join(" ");
        let inserted = insert.clone();

        self.host
            .run_and_wait(move |ctx| -> Result<()> {
                let editor = ctx.host.active_editor().ok_or(BridgeError::EditorNotFound)?;
                let contents = ctx.host.text(editor).unwrap_or_default();
                let carets = ctx.host.carets(editor);
                let (new_text, new_carets) = text::insert_at_carets(&contents, &carets, &insert);

                ctx.host.set_text(editor, &new_text)?;
                if !new_carets.is_empty() {
                    ctx.host.set_carets(editor, &new_carets)?;
                }
                Ok(())
            })
            .await??;
        Ok(format!("OK, inserted: {}", inserted))
    }

    pub async fn handle_open_project(&self, command: &Command) -> HandlerResult {
        let path = PathBuf::from(required(command, 0, "path")?);
        let outcome = self
            .host
            .run_and_wait(move |ctx| ctx.host.open_project(&path))
            .await??;

        Ok(match outcome {
            ProjectOutcome::AlreadyOpen(name) => format!("OK, already open: {}", name),
            ProjectOutcome::Opened(name) => format!("OK, opened: {}", name),
        })
    }
}

fn primary_position(host: &dyn EditorHost, editor: EditorId) -> Option<Cursor> {
    host.carets(editor).first().map(|c| c.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursorless::tests::Fixture;
    use crate::handlers::tests::{context, run};

    async fn carets(fx: &Fixture) -> Vec<Caret> {
        fx.handle
            .run_and_wait(|ctx| {
                let id = ctx.host.active_editor().unwrap();
                ctx.host.carets(id)
            })
            .await
            .unwrap()
    }

    // ==================== Goto Tests ====================

    #[tokio::test]
    async fn test_goto_is_one_based() {
        let fx = Fixture::new("one\ntwo\nthree");
        let ctx = context(&fx);

        let response = run(&ctx, "goto", &["2", "3"]).await;
        assert_eq!(response.result(), Some("OK, moved to: 1:2"));
        assert_eq!(carets(&fx).await, vec![Caret::at(Cursor::new(1, 2))]);
    }

    #[tokio::test]
    async fn test_goto_clears_selection_and_extra_carets() {
        let fx = Fixture::new("one\ntwo\nthree");
        let ctx = context(&fx);
        fx.handle
            .run_and_wait(|ctx| {
                let id = ctx.host.active_editor().unwrap();
                ctx.host
                    .set_carets(
                        id,
                        &[
                            Caret::selecting(Cursor::new(0, 3), Cursor::new(0, 0), Cursor::new(0, 3)),
                            Caret::at(Cursor::new(2, 1)),
                        ],
                    )
                    .unwrap();
            })
            .await
            .unwrap();

        run(&ctx, "goto", &["3"]).await;
        assert_eq!(carets(&fx).await, vec![Caret::at(Cursor::new(2, 0))]);
    }

    #[tokio::test]
    async fn test_goto_rejects_non_numeric_line() {
        let fx = Fixture::new("one");
        let ctx = context(&fx);

        let response = run(&ctx, "goto", &["abc"]).await;
        assert_eq!(response.error.as_deref(), Some("invalid line: abc"));
    }

    // ==================== Insert Tests ====================

    #[tokio::test]
    async fn test_insert_at_cursors_joins_args() {
        let fx = Fixture::new("ab");
        let ctx = context(&fx);
        run(&ctx, "goto", &["1", "2"]).await;

        let response = run(&ctx, "insertAtCursors", &["x", "y"]).await;
        assert_eq!(response.result(), Some("OK, inserted: x y"));
        assert_eq!(fx.text().await, "ax yb");
        assert_eq!(carets(&fx).await, vec![Caret::at(Cursor::new(0, 4))]);
    }

    #[tokio::test]
    async fn test_insert_replaces_selection() {
        let fx = Fixture::new("hello world");
        let ctx = context(&fx);
        fx.handle
            .run_and_wait(|ctx| {
                let id = ctx.host.active_editor().unwrap();
                ctx.host
                    .set_carets(
                        id,
                        &[Caret::selecting(Cursor::new(0, 11), Cursor::new(0, 6), Cursor::new(0, 11))],
                    )
                    .unwrap();
            })
            .await
            .unwrap();

        run(&ctx, "insertAtCursors", &["there"]).await;
        assert_eq!(fx.text().await, "hello there");
    }

    // ==================== Find Tests ====================

    #[tokio::test]
    async fn test_find_next_selects_match_and_moves_to_end() {
        let fx = Fixture::new("alpha Beta gamma beta");
        let ctx = context(&fx);

        let response = run(&ctx, "find", &["beta", "next"]).await;
        assert!(response.result().unwrap().starts_with("OK, ran: "));
        assert_eq!(
            carets(&fx).await,
            vec![Caret::selecting(Cursor::new(0, 10), Cursor::new(0, 6), Cursor::new(0, 10))]
        );

        // Searching again continues after the previous match
        run(&ctx, "find", &["beta", "next"]).await;
        assert_eq!(carets(&fx).await[0].position, Cursor::new(0, 21));
    }

    #[tokio::test]
    async fn test_find_prev_moves_to_start() {
        let fx = Fixture::new("beta one\nbeta two");
        let ctx = context(&fx);
        run(&ctx, "goto", &["2", "9"]).await;

        run(&ctx, "find", &["BETA", "prev"]).await;
        assert_eq!(
            carets(&fx).await,
            vec![Caret::selecting(Cursor::new(1, 0), Cursor::new(1, 0), Cursor::new(1, 4))]
        );

        run(&ctx, "find", &["beta", "prev"]).await;
        assert_eq!(carets(&fx).await[0].position, Cursor::new(0, 0));
    }

    #[tokio::test]
    async fn test_find_without_match_leaves_caret() {
        let fx = Fixture::new("nothing here");
        let ctx = context(&fx);

        let response = run(&ctx, "find", &["absent", "next"]).await;
        assert!(!response.is_error());
        assert_eq!(carets(&fx).await, vec![Caret::at(Cursor::new(0, 0))]);
    }

    #[tokio::test]
    async fn test_find_rejects_bad_regex() {
        let fx = Fixture::new("x");
        let ctx = context(&fx);

        let response = run(&ctx, "find", &["(", "next"]).await;
        assert_eq!(response.error.as_deref(), Some("invalid pattern: ("));
    }

    // ==================== File and Project Tests ====================

    #[tokio::test]
    async fn test_open_file_with_position() {
        let fx = Fixture::new("x");
        let ctx = context(&fx);
        let file = fx.dir.path().join("main.rs");
        std::fs::write(&file, "fn main() {\n    run();\n}\n").unwrap();
        let path = file.to_string_lossy().into_owned();

        let response = run(&ctx, "openFile", &[path.as_str(), "2", "5"]).await;
        assert_eq!(response.result().unwrap(), format!("OK, opened: {}", path));
        assert_eq!(fx.text().await, "fn main() {\n    run();\n}\n");
        assert_eq!(carets(&fx).await, vec![Caret::at(Cursor::new(1, 4))]);
    }

    #[tokio::test]
    async fn test_open_missing_file_is_error() {
        let fx = Fixture::new("x");
        let ctx = context(&fx);
        let path = fx.dir.path().join("missing.rs").to_string_lossy().into_owned();

        let response = run(&ctx, "openFile", &[path.as_str()]).await;
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn test_open_project_twice() {
        let fx = Fixture::new("x");
        let ctx = context(&fx);
        let project = fx.dir.path().join("proj");
        std::fs::create_dir(&project).unwrap();
        let path = project.to_string_lossy().into_owned();

        let first = run(&ctx, "openProject", &[path.as_str()]).await;
        assert_eq!(first.result(), Some("OK, opened: proj"));
        let second = run(&ctx, "openProject", &[path.as_str()]).await;
        assert_eq!(second.result(), Some("OK, already open: proj"));
    }

    // ==================== Action Tests ====================

    #[tokio::test]
    async fn test_action_reports_each_known_action() {
        let fx = Fixture::new("select me");
        let ctx = context(&fx);

        let response = run(&ctx, "action", &["$SelectAll", "NoSuchAction", "EditorEscape"]).await;
        assert_eq!(
            response.result(),
            Some("OK, ran: $SelectAll -> OK\nEditorEscape -> OK\n")
        );
        assert_eq!(carets(&fx).await, vec![Caret::at(Cursor::new(0, 9))]);
    }
}
