use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::{ChatHandler, SseHandler};

pub fn chat_routes(chat_handler: Arc<ChatHandler>, sse_handler: Arc<SseHandler>) -> Router {
    Router::new()
        .route("/chats", post(ChatHandler::create_chat))
        .route("/chats/{chat_id}", get(ChatHandler::get_chat))
        .route(
            "/chats/{chat_id}/messages",
            get(ChatHandler::list_messages).post(ChatHandler::submit_message),
        )
        .merge(
            Router::new()
                .route("/chats/{chat_id}/events", get(SseHandler::chat_events))
                .route(
                    "/users/{user_id}/notifications",
                    get(SseHandler::user_notifications),
                )
                .with_state(sse_handler),
        )
        .with_state(chat_handler)
}
