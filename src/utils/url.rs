//! Endpoint URL helpers.
//!
//! Server roots are accepted with or without trailing slashes; endpoint
//! paths are joined without producing `//`.

pub const CHAT_ENDPOINT: &str = "api/chat";
pub const TAGS_ENDPOINT: &str = "api/tags";

/// Strip trailing slashes from a server root.
///
/// ```
/// use streamchat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a server root and an endpoint path.
///
/// ```
/// use streamchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434/", "/api/chat"),
///     "http://localhost:11434/api/chat"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}
