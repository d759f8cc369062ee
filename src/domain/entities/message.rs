use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{MessageRole, MessageStatus, TokenUsage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    chat_id: Uuid,
    role: MessageRole,
    status: MessageStatus,
    content: String,
    author_id: Option<Uuid>,
    token_usage: Option<TokenUsage>,
    finish_reason: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Message {
    pub fn user(chat_id: Uuid, author_id: Uuid, content: String) -> Self {
        Self::build(
            chat_id,
            MessageRole::User,
            MessageStatus::Pending,
            content,
            Some(author_id),
        )
    }

    pub fn assistant_completed(
        chat_id: Uuid,
        content: String,
        token_usage: Option<TokenUsage>,
        finish_reason: Option<String>,
    ) -> Self {
        let mut message = Self::build(
            chat_id,
            MessageRole::Assistant,
            MessageStatus::Completed,
            content,
            None,
        );
        message.token_usage = token_usage;
        message.finish_reason = finish_reason;
        message
    }

    pub fn assistant_failed(chat_id: Uuid, content: String, error: String) -> Self {
        let mut message = Self::build(
            chat_id,
            MessageRole::Assistant,
            MessageStatus::Failed,
            content,
            None,
        );
        message.error_message = Some(error);
        message
    }

    fn build(
        chat_id: Uuid,
        role: MessageRole,
        status: MessageStatus,
        content: String,
        author_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            chat_id,
            role,
            status,
            content,
            author_id,
            token_usage: None,
            finish_reason: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        chat_id: Uuid,
        role: MessageRole,
        status: MessageStatus,
        content: String,
        author_id: Option<Uuid>,
        token_usage: Option<TokenUsage>,
        finish_reason: Option<String>,
        error_message: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chat_id,
            role,
            status,
            content,
            author_id,
            token_usage,
            finish_reason,
            error_message,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chat_id(&self) -> Uuid {
        self.chat_id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author_id(&self) -> Option<Uuid> {
        self.author_id
    }

    pub fn token_usage(&self) -> Option<TokenUsage> {
        self.token_usage
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Move a message into processing. Failed messages are only accepted
    /// when `allow_failed` is set (job redelivery).
    pub fn claim(&mut self, allow_failed: bool) -> Result<(), String> {
        match self.status {
            MessageStatus::Pending => {}
            MessageStatus::Failed if allow_failed => {}
            other => return Err(format!("Message {} cannot be claimed from {}", self.id, other)),
        }
        self.status = MessageStatus::Processing;
        self.error_message = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn complete(&mut self, token_usage: Option<TokenUsage>) -> Result<(), String> {
        if self.status != MessageStatus::Processing {
            return Err(format!("Message {} is not being processed", self.id));
        }
        self.status = MessageStatus::Completed;
        self.token_usage = token_usage;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), String> {
        if self.status != MessageStatus::Processing {
            return Err(format!("Message {} is not being processed", self.id));
        }
        self.status = MessageStatus::Failed;
        self.error_message = Some(error);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Fail a pending message whose turn was never queued.
    pub fn abandon(&mut self, error: String) -> Result<(), String> {
        if self.status != MessageStatus::Pending {
            return Err(format!("Message {} is not pending", self.id));
        }
        self.status = MessageStatus::Failed;
        self.error_message = Some(error);
        self.updated_at = Utc::now();
        Ok(())
    }
}
