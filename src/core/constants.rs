//! Shared constants used across the application

/// Server root used when neither the command line, the environment, nor the
/// config file names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Environment variable that overrides the configured server root.
pub const BASE_URL_ENV: &str = "STREAMCHAT_BASE_URL";

/// Appended to a partial reply when the user stops the turn.
pub const STOPPED_MARKER: &str = "[Stopped by user]";

/// Replaces the reply when a turn fails.
pub const ERROR_PLACEHOLDER: &str = "Error: Could not get response";
