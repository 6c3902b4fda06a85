use serde::{Deserialize, Serialize};

use crate::api::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn to_api(&self) -> ChatMessage {
        ChatMessage {
            role: self.role.as_str().to_string(),
            content: self.content.clone(),
        }
    }
}

/// One change the session makes to the transcript during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEdit {
    /// Push a new message onto the end of the transcript.
    Append(Message),
    /// Overwrite the content of the open assistant message.
    ReplaceLast(String),
}

/// The seam between the chat session and whoever owns the transcript.
///
/// The session reads the transcript once to build its request and then only
/// talks to it through [`apply`](Self::apply). A front-end implements this to
/// re-render on every edit.
pub trait TranscriptSink {
    fn messages(&self) -> &[Message];

    fn apply(&mut self, edit: HistoryEdit);
}

/// Ordered list of messages; array order is conversation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

}

impl From<Vec<Message>> for ConversationHistory {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl TranscriptSink for ConversationHistory {
    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn apply(&mut self, edit: HistoryEdit) {
        match edit {
            HistoryEdit::Append(message) => self.messages.push(message),
            HistoryEdit::ReplaceLast(content) => match self.messages.last_mut() {
                Some(last) if last.role.is_assistant() => last.content = content,
                _ => tracing::warn!("ignoring edit: transcript has no open assistant message"),
            },
        }
    }
}
