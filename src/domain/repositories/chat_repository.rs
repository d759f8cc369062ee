use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Chat, Citation, Message};
use crate::domain::repositories::RepositoryError;

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn save(&self, chat: &Chat) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Chat>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn save(&self, message: &Message) -> Result<(), RepositoryError>;

    /// Insert a user message only if the chat has no pending or processing
    /// message. Returns false when the chat is busy.
    async fn insert_if_chat_idle(&self, message: &Message) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, RepositoryError>;
    async fn update(&self, message: &Message) -> Result<(), RepositoryError>;

    /// Messages of a chat, oldest first.
    async fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Message>, RepositoryError>;
}

#[async_trait]
pub trait CitationRepository: Send + Sync {
    /// Store citations, replacing any existing row for the same
    /// (message, document) pair.
    async fn save_batch(&self, citations: &[Citation]) -> Result<(), RepositoryError>;
    async fn find_by_message(&self, message_id: Uuid) -> Result<Vec<Citation>, RepositoryError>;
}
