use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::MessageStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatUpdateKind {
    MessageCreated,
    MessageUpdated,
    MessageFailed,
}

impl ChatUpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatUpdateKind::MessageCreated => "message_created",
            ChatUpdateKind::MessageUpdated => "message_updated",
            ChatUpdateKind::MessageFailed => "message_failed",
        }
    }
}

/// Status change of a message, broadcast on the chat's channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatUpdate {
    pub chat_id: Uuid,
    pub message_id: Uuid,
    pub kind: ChatUpdateKind,
    pub status: MessageStatus,
}

/// Lifecycle outcome delivered to one user's notification channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserNotification {
    pub user_id: Uuid,
    pub event: String,
    pub subject_id: Uuid,
    pub message: String,
}

/// Outbound status channels consumed by the UI layer. Delivery is best effort.
pub trait Broadcaster: Send + Sync {
    fn publish_chat(&self, update: ChatUpdate);
    fn notify_user(&self, notification: UserNotification);
}
