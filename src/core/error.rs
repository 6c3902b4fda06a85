use std::error::Error;
use std::fmt;

/// Why a turn did not complete normally.
///
/// `Cancelled` is produced when the user stops a turn; the session maps it to
/// [`TurnOutcome::Stopped`](crate::core::session::TurnOutcome::Stopped) and
/// never surfaces it as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The user asked for the turn to stop.
    Cancelled,
    /// Connection, status, or body-read failure.
    Transport(String),
    /// The server sent something that makes the stream unusable.
    Protocol(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Cancelled => write!(f, "Turn cancelled"),
            ChatError::Transport(message) => write!(f, "Transport error: {message}"),
            ChatError::Protocol(message) => write!(f, "Protocol error: {message}"),
        }
    }
}

impl Error for ChatError {}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

/// Text of an `error` field, which servers send either as a string or as an
/// object with a `message`.
fn error_text(error: &serde_json::Value) -> Option<&str> {
    error
        .as_str()
        .or_else(|| error.get("message").and_then(|v| v.as_str()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .get("error")
        .and_then(error_text)
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;

    Some(collapse_whitespace(summary))
}

/// Single-line text for the `error` field of an in-stream record.
pub fn summarize_error_value(error: &serde_json::Value) -> String {
    error_text(error)
        .map(collapse_whitespace)
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| error.to_string())
}

/// Reduce an error response body to a single line for diagnostics.
pub fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| trimmed.to_string())
}
