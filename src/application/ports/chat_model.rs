use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::TokenUsage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "STOP",
            FinishReason::MaxTokens => "MAX_TOKENS",
            FinishReason::Safety => "SAFETY",
            FinishReason::Recitation => "RECITATION",
            FinishReason::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ModelRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_instruction: String,
    /// Prior turns followed by the new user turn.
    pub contents: Vec<ChatTurn>,
    /// Remote store names exposed to the model's file-search tool.
    pub store_names: Vec<String>,
    pub generation: GenerationConfig,
}

/// One retrieved fragment the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// Display name of the source document in the remote store.
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Links a segment of the answer to the chunks that justify it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundingSupport {
    pub chunk_indices: Vec<usize>,
    /// Parallel to `chunk_indices`.
    pub confidence_scores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundingEvidence {
    pub chunks: Vec<GroundingChunk>,
    pub supports: Option<Vec<GroundingSupport>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub text: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<TokenUsage>,
    pub grounding: GroundingEvidence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionError {
    pub status: Option<u16>,
    pub finish_reason: Option<FinishReason>,
    pub message: String,
}

impl ChatCompletionError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            finish_reason: None,
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429)
    }

    /// Transport failures, server errors and rate limits are worth retrying.
    pub fn is_retriable(&self) -> bool {
        match self.status {
            None => true,
            Some(code) => code >= 500 || code == 429,
        }
    }
}

impl std::fmt::Display for ChatCompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "Chat completion failed ({}): {}", code, self.message),
            None => write!(f, "Chat completion failed: {}", self.message),
        }
    }
}

impl std::error::Error for ChatCompletionError {}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, ChatCompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_parsing() {
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("SAFETY"), FinishReason::Safety);
        assert_eq!(FinishReason::parse("RECITATION"), FinishReason::Recitation);
        assert_eq!(FinishReason::parse("MAX_TOKENS"), FinishReason::MaxTokens);
        assert_eq!(
            FinishReason::parse("MALFORMED_FUNCTION_CALL").as_str(),
            "MALFORMED_FUNCTION_CALL"
        );
    }

    #[test]
    fn test_retriable_statuses() {
        assert!(ChatCompletionError::new(None, "reset").is_retriable());
        assert!(ChatCompletionError::new(Some(429), "quota").is_retriable());
        assert!(ChatCompletionError::new(Some(502), "bad gateway").is_retriable());
        assert!(!ChatCompletionError::new(Some(400), "bad request").is_retriable());
        assert!(!ChatCompletionError::new(Some(404), "no model").is_retriable());
    }
}
