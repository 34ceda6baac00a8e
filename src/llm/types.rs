use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};

/// Message in a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions.
    System,
    /// User input.
    User,
    /// Model output.
    Assistant,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation, system message first.
    pub messages: Vec<Message>,
    /// Sampling temperature, clamped to `[0, 2]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ChatRequest {
    /// Create a new chat request for a model
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }
}

/// Response from `POST /chat/completions`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion id.
    #[serde(default)]
    pub id: Option<String>,
    /// Model that answered.
    #[serde(default)]
    pub model: Option<String>,
    /// Candidate completions.
    pub choices: Vec<ChatChoice>,
    /// Token accounting.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// Position of the choice.
    #[serde(default)]
    pub index: u32,
    /// Generated message.
    pub message: ChoiceMessage,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message payload of a choice. `content` is null for refusals and tool calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Author, normally assistant.
    pub role: MessageRole,
    /// Text, when present.
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: Option<u32>,
    /// Tokens generated.
    pub completion_tokens: Option<u32>,
    /// Sum of both.
    pub total_tokens: Option<u32>,
}

impl ChatResponse {
    /// Build a response carrying a single assistant message.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            model: None,
            choices: vec![ChatChoice {
                index: 0,
                message: ChoiceMessage {
                    role: MessageRole::Assistant,
                    content: Some(text.into()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        }
    }

    /// Trimmed text of the first choice.
    ///
    /// A missing choice or a blank message is a malformed response.
    pub fn completion(&self) -> LlmResult<String> {
        let content = self
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(LlmError::InvalidResponse {
                message: "completion contained no text".to_string(),
            });
        }
        Ok(content.to_string())
    }
}

/// Request body for `POST /embeddings`
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    /// Embedding model identifier.
    pub model: String,
    /// Texts to embed.
    pub input: Vec<String>,
}

/// Response from `POST /embeddings`
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    /// One vector per input.
    pub data: Vec<EmbeddingData>,
    /// Model that answered.
    #[serde(default)]
    pub model: Option<String>,
}

/// One embedding vector, tagged with the position of its input
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    /// Position of the input.
    pub index: usize,
    /// The vector.
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Vectors in input order. Fails unless exactly `expected` distinct indices came back.
    pub fn into_ordered(mut self, expected: usize) -> LlmResult<Vec<Vec<f32>>> {
        if self.data.len() != expected {
            return Err(LlmError::InvalidResponse {
                message: format!(
                    "expected {} embeddings, received {}",
                    expected,
                    self.data.len()
                ),
            });
        }
        self.data.sort_by_key(|d| d.index);
        if self.data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err(LlmError::InvalidResponse {
                message: "embedding indices do not match inputs".to_string(),
            });
        }
        Ok(self.data.into_iter().map(|d| d.embedding).collect())
    }
}
