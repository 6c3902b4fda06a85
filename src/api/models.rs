use std::error::Error;
use std::fmt;

use crate::api::{ModelInfo, ModelsResponse};
use crate::core::error::summarize_error_body;
use crate::utils::url::{construct_api_url, TAGS_ENDPOINT};

/// Failure while listing the models a server offers.
#[derive(Debug)]
pub enum ModelsError {
    /// The request never produced a usable response.
    Transport(String),
    /// The server answered with a non-success status.
    Status { status: u16, body: String },
}

impl fmt::Display for ModelsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelsError::Transport(message) => write!(f, "Failed to list models: {message}"),
            ModelsError::Status { status, body } => {
                write!(f, "Model listing failed with status {status}: {body}")
            }
        }
    }
}

impl Error for ModelsError {}

pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<ModelsResponse, ModelsError> {
    let url = construct_api_url(base_url, TAGS_ENDPOINT);
    tracing::debug!(url = %url, "fetching model list");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| ModelsError::Transport(err.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(ModelsError::Status {
            status,
            body: summarize_error_body(&body),
        });
    }

    response
        .json::<ModelsResponse>()
        .await
        .map_err(|err| ModelsError::Transport(err.to_string()))
}

/// Pick the model to use when none was configured: the first one listed.
pub fn first_model(models: &[ModelInfo]) -> Option<String> {
    models.first().map(|model| model.name.clone())
}

pub fn sort_models(models: &mut [ModelInfo]) {
    // Newest first; entries without a timestamp sink to the bottom, then by name
    models.sort_by(|a, b| match (&a.modified_at, &b.modified_at) {
        (Some(a_modified), Some(b_modified)) => b_modified
            .cmp(a_modified)
            .then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
}
