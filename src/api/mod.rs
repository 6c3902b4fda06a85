use serde::{Deserialize, Serialize};

pub mod models;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChunkMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// One newline-delimited record of a streamed chat response.
///
/// Every field is optional on the wire; anything not listed here is ignored.
#[derive(Debug, Deserialize, Default)]
pub struct StreamChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: Option<bool>,
    /// Either a plain string or an object with a `message`.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl StreamChunk {
    pub fn delta(&self) -> &str {
        self.message
            .as_ref()
            .and_then(|message| message.content.as_deref())
            .unwrap_or("")
    }

    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

impl ModelsResponse {
    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|model| model.name.clone()).collect()
    }
}
