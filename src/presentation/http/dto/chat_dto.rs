use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::MessageWithCitations;
use crate::domain::entities::{Chat, Citation, Message};
use crate::domain::value_objects::TokenUsage;

#[derive(Debug, Deserialize)]
pub struct CreateChatDto {
    pub title: String,
    pub tenant_id: Option<Uuid>,
    pub primary_store_id: Uuid,
    #[serde(default)]
    pub auxiliary_store_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitMessageDto {
    pub author_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseDto {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub title: String,
    pub primary_store_id: Uuid,
    pub auxiliary_store_ids: Vec<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Chat> for ChatResponseDto {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id(),
            tenant_id: chat.owner().tenant_id(),
            title: chat.title().to_string(),
            primary_store_id: chat.primary_store_id(),
            auxiliary_store_ids: chat.auxiliary_store_ids().to_vec(),
            created_at: chat.created_at().to_rfc3339(),
            updated_at: chat.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CitationDto {
    pub document_id: Uuid,
    pub pages: Vec<i32>,
    pub snippet: Option<String>,
    pub confidence: Option<f64>,
    pub strength: String,
}

impl From<Citation> for CitationDto {
    fn from(citation: Citation) -> Self {
        Self {
            document_id: citation.document_id(),
            pages: citation.pages().to_vec(),
            snippet: citation.snippet().map(str::to_string),
            confidence: citation.confidence(),
            strength: citation.strength().as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponseDto {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: String,
    pub status: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub token_usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub citations: Vec<CitationDto>,
}

impl From<Message> for MessageResponseDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id(),
            chat_id: message.chat_id(),
            role: message.role().as_str().to_string(),
            status: message.status().as_str().to_string(),
            content: message.content().to_string(),
            author_id: message.author_id(),
            token_usage: message.token_usage(),
            finish_reason: message.finish_reason().map(str::to_string),
            error_message: message.error_message().map(str::to_string),
            created_at: message.created_at().to_rfc3339(),
            citations: Vec::new(),
        }
    }
}

impl From<MessageWithCitations> for MessageResponseDto {
    fn from(entry: MessageWithCitations) -> Self {
        let mut dto = MessageResponseDto::from(entry.message);
        dto.citations = entry.citations.into_iter().map(CitationDto::from).collect();
        dto
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::EvidenceStrength;

    #[test]
    fn test_message_dto_carries_citations() {
        let chat_id = Uuid::new_v4();
        let message = Message::assistant_completed(
            chat_id,
            "Revenue grew 12%.".to_string(),
            Some(TokenUsage::new(40, 8)),
            Some("STOP".to_string()),
        );
        let citation = Citation::new(
            message.id(),
            Uuid::new_v4(),
            vec![4, 2, 4],
            Some("Revenue grew".to_string()),
            Some(0.9),
            EvidenceStrength::Strong,
        );

        let dto = MessageResponseDto::from(MessageWithCitations {
            message,
            citations: vec![citation],
        });
        assert_eq!(dto.role, "assistant");
        assert_eq!(dto.status, "completed");
        assert_eq!(dto.citations.len(), 1);
        assert_eq!(dto.citations[0].pages, vec![2, 4]);
        assert_eq!(dto.citations[0].strength, "strong");

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["token_usage"]["total_tokens"], 48);
    }
}
