use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model is required".to_owned());
        }
        if self.messages.is_empty() {
            return Err("messages must not be empty".to_owned());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub modified_at: DateTime<Utc>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StreamChunk {
    pub role: MessageRole,
    pub content_delta: String,
    pub is_final: bool,
}

impl StreamChunk {
    pub fn assistant(content_delta: impl Into<String>, is_final: bool) -> Self {
        Self {
            role: MessageRole::Assistant,
            content_delta: content_delta.into(),
            is_final,
        }
    }

    /// Empty terminal chunk, used when the backend signals completion out of band.
    pub fn completion() -> Self {
        Self::assistant(String::new(), true)
    }
}

/// Concatenated deltas of one generation, up to and including the final chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    content: String,
}

impl GenerationResult {
    pub fn push(&mut self, chunk: &StreamChunk) {
        self.content.push_str(&chunk.content_delta);
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

impl From<String> for GenerationResult {
    fn from(content: String) -> Self {
        Self { content }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NativeTagsResponse {
    pub models: Vec<NativeModelEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NativeModelEntry {
    pub name: String,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiModelsResponse {
    pub data: Vec<OpenAiModelEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiModelEntry {
    pub id: String,
    #[serde(default)]
    pub created: i64,
}

impl From<NativeModelEntry> for ModelInfo {
    fn from(value: NativeModelEntry) -> Self {
        ModelInfo {
            name: value.name,
            modified_at: value.modified_at,
            size_bytes: value.size,
        }
    }
}

impl From<OpenAiModelEntry> for ModelInfo {
    fn from(value: OpenAiModelEntry) -> Self {
        ModelInfo {
            name: value.id,
            modified_at: DateTime::<Utc>::from_timestamp(value.created, 0).unwrap_or_default(),
            size_bytes: 0,
        }
    }
}
