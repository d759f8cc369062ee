use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response, Sse, sse::Event},
};
use futures::stream::{self, Stream};
use serde::Serialize;
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use uuid::Uuid;

use crate::infrastructure::messaging::BroadcastHub;

/// Live status channels: one per chat for message updates, one per user for
/// store lifecycle notifications.
pub struct SseHandler {
    hub: Arc<BroadcastHub>,
}

impl SseHandler {
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        Self { hub }
    }

    pub async fn chat_events(
        State(handler): State<Arc<SseHandler>>,
        Path(chat_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let stream = filtered_stream(handler.hub.subscribe_chats(), move |update| {
            (update.chat_id == chat_id).then(|| event(update.kind.as_str(), update))
        });
        Ok(create_sse_response(stream))
    }

    pub async fn user_notifications(
        State(handler): State<Arc<SseHandler>>,
        Path(user_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let stream = filtered_stream(handler.hub.subscribe_users(), move |notification| {
            (notification.user_id == user_id).then(|| event(&notification.event, notification))
        });
        Ok(create_sse_response(stream))
    }
}

fn event<T: Serialize>(name: &str, payload: &T) -> Event {
    Event::default()
        .event(name)
        .data(serde_json::to_string(payload).unwrap_or_default())
}

/// Forwards the broadcast items `select` maps to an event. Lagged receivers
/// skip what they missed; the stream ends when the hub goes away.
fn filtered_stream<T, F>(
    receiver: broadcast::Receiver<T>,
    select: F,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static
where
    T: Clone + Send + 'static,
    F: Fn(&T) -> Option<Event> + Send + Sync + 'static,
{
    let select = Arc::new(select);
    stream::unfold(receiver, move |mut receiver| {
        let select = select.clone();
        async move {
            loop {
                match receiver.recv().await {
                    Ok(item) => {
                        if let Some(event) = select(&item) {
                            return Some((Ok(event), receiver));
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "SSE subscriber lagged behind");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    })
}

pub fn create_sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream)
        .keep_alive(
            axum::response::sse::KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    use crate::application::ports::Broadcaster;
    use crate::application::ports::broadcaster::{ChatUpdate, ChatUpdateKind};
    use crate::domain::value_objects::MessageStatus;

    #[tokio::test]
    async fn test_chat_stream_only_forwards_its_chat() {
        let hub = Arc::new(BroadcastHub::new());
        let chat_id = Uuid::new_v4();
        let stream = filtered_stream(hub.subscribe_chats(), move |update: &ChatUpdate| {
            (update.chat_id == chat_id).then(|| event(update.kind.as_str(), update))
        });
        let mut stream = Box::pin(stream);

        hub.publish_chat(ChatUpdate {
            chat_id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
            kind: ChatUpdateKind::MessageCreated,
            status: MessageStatus::Completed,
        });
        hub.publish_chat(ChatUpdate {
            chat_id,
            message_id: Uuid::new_v4(),
            kind: ChatUpdateKind::MessageFailed,
            status: MessageStatus::Failed,
        });
        drop(hub);

        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.is_none());
    }
}
