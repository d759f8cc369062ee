use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::ports::JobQueue;
use crate::application::use_cases::UseCaseError;
use crate::domain::entities::{Job, JobKind, Message};
use crate::domain::repositories::{ChatRepository, MessageRepository};

#[derive(Debug, Clone)]
pub struct SubmitMessageRequest {
    pub chat_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

pub struct SubmitMessageUseCase {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    job_queue: Arc<dyn JobQueue>,
}

impl SubmitMessageUseCase {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        messages: Arc<dyn MessageRepository>,
        job_queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            chats,
            messages,
            job_queue,
        }
    }

    pub async fn execute(&self, request: SubmitMessageRequest) -> Result<Message, UseCaseError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(UseCaseError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }

        if self.chats.find_by_id(request.chat_id).await?.is_none() {
            return Err(UseCaseError::NotFound(format!("Chat {}", request.chat_id)));
        }

        let mut message = Message::user(request.chat_id, request.author_id, content.to_string());
        if !self.messages.insert_if_chat_idle(&message).await? {
            return Err(UseCaseError::Conflict(
                "The previous message is still being answered".to_string(),
            ));
        }

        let job = Job::new(JobKind::ProcessChatTurn {
            message_id: message.id(),
        });
        if let Err(e) = self.job_queue.enqueue(job).await {
            // A pending message with no job would hold the chat's in-flight slot.
            warn!(message_id = %message.id(), error = %e, "Failed to queue chat turn");
            message
                .abandon(format!("Failed to queue turn: {}", e))
                .map_err(UseCaseError::ValidationError)?;
            self.messages.update(&message).await?;
            return Err(e.into());
        }

        info!(chat_id = %request.chat_id, message_id = %message.id(), "Message submitted");
        Ok(message)
    }
}
