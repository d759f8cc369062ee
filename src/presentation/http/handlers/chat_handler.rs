use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    CatalogQueries, CreateChatRequest, CreateChatUseCase, SubmitMessageRequest,
    SubmitMessageUseCase,
};
use crate::domain::value_objects::Owner;
use crate::presentation::http::dto::{
    ApiResponse, ChatResponseDto, CreateChatDto, MessageResponseDto, SubmitMessageDto,
};
use crate::presentation::http::handlers::failure;

pub struct ChatHandler {
    create_chat_use_case: Arc<CreateChatUseCase>,
    submit_message_use_case: Arc<SubmitMessageUseCase>,
    catalog: Arc<CatalogQueries>,
}

impl ChatHandler {
    pub fn new(
        create_chat_use_case: Arc<CreateChatUseCase>,
        submit_message_use_case: Arc<SubmitMessageUseCase>,
        catalog: Arc<CatalogQueries>,
    ) -> Self {
        Self {
            create_chat_use_case,
            submit_message_use_case,
            catalog,
        }
    }

    pub async fn create_chat(
        State(handler): State<Arc<ChatHandler>>,
        Json(body): Json<CreateChatDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = CreateChatRequest {
            owner: Owner::from_tenant_id(body.tenant_id),
            title: body.title,
            primary_store_id: body.primary_store_id,
            auxiliary_store_ids: body.auxiliary_store_ids,
        };

        match handler.create_chat_use_case.execute(request).await {
            Ok(chat) => Ok((
                StatusCode::CREATED,
                Json(ApiResponse::success(ChatResponseDto::from(chat))),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn get_chat(
        State(handler): State<Arc<ChatHandler>>,
        Path(chat_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.catalog.chat(chat_id).await {
            Ok(chat) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(ChatResponseDto::from(chat))),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn list_messages(
        State(handler): State<Arc<ChatHandler>>,
        Path(chat_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.catalog.messages(chat_id).await {
            Ok(messages) => {
                let dto: Vec<MessageResponseDto> =
                    messages.into_iter().map(MessageResponseDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(failure(e)),
        }
    }

    /// Queues the turn; the answer arrives on the chat's event stream.
    pub async fn submit_message(
        State(handler): State<Arc<ChatHandler>>,
        Path(chat_id): Path<Uuid>,
        Json(body): Json<SubmitMessageDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = SubmitMessageRequest {
            chat_id,
            author_id: body.author_id,
            content: body.content,
        };

        match handler.submit_message_use_case.execute(request).await {
            Ok(message) => Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(MessageResponseDto::from(message))),
            )),
            Err(e) => Ok(failure(e)),
        }
    }
}
