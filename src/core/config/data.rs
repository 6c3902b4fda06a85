use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::constants::{
    BASE_URL_ENV, DEFAULT_BASE_URL, ERROR_PLACEHOLDER, STOPPED_MARKER,
};
use crate::core::session::SessionOptions;
use crate::utils::url::normalize_base_url;

/// Keys accepted by `streamchat set` / `streamchat unset`.
pub const CONFIG_KEYS: &[&str] = &[
    "default-model",
    "base-url",
    "idle-timeout",
    "max-malformed",
    "stopped-marker",
    "error-placeholder",
];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root URL of the inference server (e.g., "http://localhost:11434")
    pub base_url: Option<String>,
    /// Model used when none is given on the command line
    pub default_model: Option<String>,
    /// Fail a turn when the stream sends nothing for this many seconds
    pub idle_timeout_secs: Option<u64>,
    /// Fail a turn after this many unparseable stream lines
    pub max_malformed_chunks: Option<usize>,
    pub stopped_marker: Option<String>,
    pub error_placeholder: Option<String>,
}

impl Config {
    /// Pick the server root: command-line flag, then environment, then file.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> String {
        self.resolve_base_url_with_env(flag, std::env::var(BASE_URL_ENV).ok())
    }

    pub(crate) fn resolve_base_url_with_env(
        &self,
        flag: Option<&str>,
        env_value: Option<String>,
    ) -> String {
        let chosen = flag
            .map(str::to_string)
            .or(env_value)
            .or_else(|| self.base_url.clone())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        normalize_base_url(&chosen)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            idle_timeout: self
                .idle_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            max_malformed_chunks: self.max_malformed_chunks.filter(|limit| *limit > 0),
            stopped_marker: self
                .stopped_marker
                .clone()
                .unwrap_or_else(|| STOPPED_MARKER.to_string()),
            error_placeholder: self
                .error_placeholder
                .clone()
                .unwrap_or_else(|| ERROR_PLACEHOLDER.to_string()),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for {key}"));
        }
        match key {
            "default-model" => self.default_model = Some(value.to_string()),
            "base-url" => self.base_url = Some(normalize_base_url(value)),
            "idle-timeout" => {
                self.idle_timeout_secs = Some(parse_number(key, value)?);
            }
            "max-malformed" => {
                self.max_malformed_chunks = Some(parse_number(key, value)?);
            }
            "stopped-marker" => self.stopped_marker = Some(value.to_string()),
            "error-placeholder" => self.error_placeholder = Some(value.to_string()),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "default-model" => self.default_model = None,
            "base-url" => self.base_url = None,
            "idle-timeout" => self.idle_timeout_secs = None,
            "max-malformed" => self.max_malformed_chunks = None,
            "stopped-marker" => self.stopped_marker = None,
            "error-placeholder" => self.error_placeholder = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("{key} expects a whole number, got '{value}'"))
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key} (expected one of: {})",
        CONFIG_KEYS.join(", ")
    )
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
