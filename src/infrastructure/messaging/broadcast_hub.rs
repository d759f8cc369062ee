use tokio::sync::broadcast;
use tracing::trace;

use crate::application::ports::broadcaster::{Broadcaster, ChatUpdate, UserNotification};

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of chat updates and user notifications to SSE subscribers.
/// Subscribers filter the shared streams by chat or user id. Slow readers
/// lose the oldest updates rather than blocking publishers.
pub struct BroadcastHub {
    chats: broadcast::Sender<ChatUpdate>,
    users: broadcast::Sender<UserNotification>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        let (chats, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (users, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { chats, users }
    }

    pub fn subscribe_chats(&self) -> broadcast::Receiver<ChatUpdate> {
        self.chats.subscribe()
    }

    pub fn subscribe_users(&self) -> broadcast::Receiver<UserNotification> {
        self.users.subscribe()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for BroadcastHub {
    fn publish_chat(&self, update: ChatUpdate) {
        if self.chats.send(update).is_err() {
            trace!("No chat subscribers");
        }
    }

    fn notify_user(&self, notification: UserNotification) {
        if self.users.send(notification).is_err() {
            trace!("No notification subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::broadcaster::ChatUpdateKind;
    use crate::domain::value_objects::MessageStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let hub = BroadcastHub::new();
        hub.publish_chat(ChatUpdate {
            chat_id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
            kind: ChatUpdateKind::MessageCreated,
            status: MessageStatus::Pending,
        });

        let mut chats = hub.subscribe_chats();
        let update = ChatUpdate {
            chat_id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
            kind: ChatUpdateKind::MessageFailed,
            status: MessageStatus::Failed,
        };
        hub.publish_chat(update.clone());
        assert_eq!(chats.recv().await.unwrap(), update);

        let mut users = hub.subscribe_users();
        let notification = UserNotification {
            user_id: Uuid::new_v4(),
            event: "stores.created".to_string(),
            subject_id: Uuid::new_v4(),
            message: "Store is ready".to_string(),
        };
        hub.notify_user(notification.clone());
        assert_eq!(users.recv().await.unwrap(), notification);
    }
}
