//! History navigation handlers
//!
//! Handles: navigateHistory, navigateFileBack/Forward,
//! navigateFunctionBack/Forward
//!
//! Navigation steps through the host history until the value being
//! navigated by (file, function, language) changes to something non-null.
//! If nothing different is found the steps are undone.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use talonbridge_protocol::Command;

use super::{required, HandlerContext, HandlerError, HandlerResult};
use crate::host::{EditorHost, Notification};

/// Upper bound on history entries inspected per navigation
pub const MAX_NAVIGATION_STEPS: u32 = 100;

/// What a navigation tries to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    File,
    Function,
    Language,
}

impl NavigationKind {
    /// The value at the host's current position
    pub fn current(&self, host: &dyn EditorHost) -> Option<String> {
        match self {
            Self::File => host
                .active_editor()
                .and_then(|id| host.file_path(id))
                .map(|p| p.to_string_lossy().into_owned()),
            Self::Function => host.function_at_caret(),
            Self::Language => host.language_at_caret(),
        }
    }
}

impl fmt::Display for NavigationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Function => "function",
            Self::Language => "language",
        })
    }
}

impl FromStr for NavigationKind {
    type Err = HandlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "function" => Ok(Self::Function),
            "language" => Ok(Self::Language),
            other => Err(HandlerError::InvalidArgument {
                name: "navigation type",
                value: other.to_string(),
            }),
        }
    }
}

/// Step through history until `kind` changes; returns the result text
pub fn navigate_host(host: &mut dyn EditorHost, forward: bool, kind: NavigationKind) -> String {
    let verb = if forward { "forward" } else { "back" };
    let original = kind.current(host);
    let mut current = original.clone();
    let mut steps = 0;
    let mut success = false;

    debug!("Navigating {} by {} from {:?}", verb, kind, original);
    while host.history_available(forward) && steps < MAX_NAVIGATION_STEPS {
        if !host.history_step(forward) {
            break;
        }
        steps += 1;
        current = kind.current(host);

        // Entries without a value (a file with no functions) are skipped over
        if current.is_some() && current != original {
            success = true;
            break;
        }
    }

    if success {
        info!("Navigated {} {} steps to {:?}", verb, steps, current);
        return format!(
            "OK, navigated {} {} steps to {}",
            verb,
            steps,
            current.unwrap_or_default()
        );
    }

    for _ in 0..steps {
        host.history_step(!forward);
    }

    let mut explanation = format!(
        "Navigation stack (checked {} entries) didn't include a different {}",
        steps, kind
    );
    if steps > 0 && current.is_none() {
        explanation.push_str(" (last entry was also null)");
    }
    host.notify(Notification::warning(
        format!("Unable to navigate {}/{}", kind, verb),
        explanation,
    ));

    format!("Failed; no different {} found to go {} to", kind, verb)
}

impl HandlerContext {
    /// `navigateHistory <forward|back> <file|function|language>`
    pub async fn handle_navigate_history(&self, command: &Command) -> HandlerResult {
        let direction = required(command, 0, "direction")?;
        let forward = match direction {
            "forward" => true,
            "back" => false,
            other => {
                return Err(HandlerError::InvalidArgument {
                    name: "direction",
                    value: other.to_string(),
                })
            }
        };
        let kind: NavigationKind = required(command, 1, "navigation type")?.parse()?;
        self.navigate(forward, kind).await
    }

    /// Navigate as one task on the host
    pub async fn navigate(&self, forward: bool, kind: NavigationKind) -> HandlerResult {
        let result = self
            .host
            .run_and_wait(move |ctx| navigate_host(ctx.host.as_mut(), forward, kind))
            .await?;
        Ok(result)
    }
}
