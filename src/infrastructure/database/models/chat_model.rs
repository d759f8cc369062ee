use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{Chat, Citation, EvidenceStrength, Message};
use crate::domain::value_objects::{MessageRole, MessageStatus, Owner, TokenUsage};
use crate::infrastructure::database::schema::{chats, citations, messages};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = chats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatModel {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub title: String,
    pub primary_store_id: Uuid,
    pub auxiliary_store_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Chat> for ChatModel {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id(),
            tenant_id: chat.owner().tenant_id(),
            title: chat.title().to_string(),
            primary_store_id: chat.primary_store_id(),
            auxiliary_store_ids: chat.auxiliary_store_ids().to_vec(),
            created_at: chat.created_at(),
            updated_at: chat.updated_at(),
        }
    }
}

impl From<ChatModel> for Chat {
    fn from(model: ChatModel) -> Self {
        Chat::from_database(
            model.id,
            Owner::from_tenant_id(model.tenant_id),
            model.title,
            model.primary_store_id,
            model.auxiliary_store_ids,
            model.created_at,
            model.updated_at,
        )
    }
}

/// Selected without `seq`, which only orders history.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageModel {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: String,
    pub status: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub finish_reason: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageModel {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: String,
    pub status: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub finish_reason: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = messages)]
#[diesel(treat_none_as_null = true)]
pub struct MessageChanges {
    pub status: String,
    pub content: String,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub finish_reason: Option<String>,
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Message> for NewMessageModel {
    fn from(message: &Message) -> Self {
        let usage = message.token_usage();
        Self {
            id: message.id(),
            chat_id: message.chat_id(),
            role: message.role().as_str().to_string(),
            status: message.status().as_str().to_string(),
            content: message.content().to_string(),
            author_id: message.author_id(),
            prompt_tokens: usage.map(|u| u.prompt_tokens),
            completion_tokens: usage.map(|u| u.completion_tokens),
            total_tokens: usage.map(|u| u.total_tokens),
            finish_reason: message.finish_reason().map(str::to_string),
            error_message: message.error_message().map(str::to_string),
            created_at: message.created_at(),
            updated_at: message.updated_at(),
        }
    }
}

impl From<&Message> for MessageChanges {
    fn from(message: &Message) -> Self {
        let usage = message.token_usage();
        Self {
            status: message.status().as_str().to_string(),
            content: message.content().to_string(),
            prompt_tokens: usage.map(|u| u.prompt_tokens),
            completion_tokens: usage.map(|u| u.completion_tokens),
            total_tokens: usage.map(|u| u.total_tokens),
            finish_reason: message.finish_reason().map(str::to_string),
            error_message: message.error_message().map(str::to_string),
            updated_at: message.updated_at(),
        }
    }
}

impl TryFrom<MessageModel> for Message {
    type Error = String;

    fn try_from(model: MessageModel) -> Result<Self, Self::Error> {
        let token_usage = match (model.prompt_tokens, model.completion_tokens, model.total_tokens) {
            (Some(prompt_tokens), Some(completion_tokens), total) => Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: total.unwrap_or(prompt_tokens + completion_tokens),
            }),
            _ => None,
        };

        Ok(Message::from_database(
            model.id,
            model.chat_id,
            MessageRole::parse(&model.role)?,
            MessageStatus::parse(&model.status)?,
            model.content,
            model.author_id,
            token_usage,
            model.finish_reason,
            model.error_message,
            model.created_at,
            model.updated_at,
        ))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = citations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CitationModel {
    pub id: Uuid,
    pub message_id: Uuid,
    pub document_id: Uuid,
    pub pages: Vec<i32>,
    pub snippet: Option<String>,
    pub confidence: Option<f64>,
    pub strength: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Citation> for CitationModel {
    fn from(citation: &Citation) -> Self {
        Self {
            id: citation.id(),
            message_id: citation.message_id(),
            document_id: citation.document_id(),
            pages: citation.pages().to_vec(),
            snippet: citation.snippet().map(str::to_string),
            confidence: citation.confidence(),
            strength: citation.strength().as_str().to_string(),
            created_at: citation.created_at(),
        }
    }
}

impl TryFrom<CitationModel> for Citation {
    type Error = String;

    fn try_from(model: CitationModel) -> Result<Self, Self::Error> {
        Ok(Citation::from_database(
            model.id,
            model.message_id,
            model.document_id,
            model.pages,
            model.snippet,
            model.confidence,
            EvidenceStrength::parse(&model.strength)?,
            model.created_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_usage_columns() {
        let mut message = Message::user(Uuid::new_v4(), Uuid::new_v4(), "q".to_string());
        message.claim(false).unwrap();
        message.complete(Some(TokenUsage::new(7, 3))).unwrap();

        let row = NewMessageModel::from(&message);
        assert_eq!(row.total_tokens, Some(10));

        let model = MessageModel {
            id: row.id,
            chat_id: row.chat_id,
            role: row.role,
            status: row.status,
            content: row.content,
            author_id: row.author_id,
            prompt_tokens: row.prompt_tokens,
            completion_tokens: row.completion_tokens,
            total_tokens: row.total_tokens,
            finish_reason: row.finish_reason,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        assert_eq!(Message::try_from(model).unwrap(), message);
    }

    #[test]
    fn test_unknown_strength_rejected() {
        let citation = Citation::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![3],
            None,
            None,
            EvidenceStrength::Unscored,
        );
        let mut model = CitationModel::from(&citation);
        model.strength = "weak".to_string();
        assert!(Citation::try_from(model).is_err());
    }
}
