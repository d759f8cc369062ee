use async_trait::async_trait;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use uuid::Uuid;

use super::{is_violation_of, run_blocking};
use crate::domain::entities::{Chat, Citation, Message};
use crate::domain::repositories::{
    ChatRepository, CitationRepository, MessageRepository, RepositoryError,
};
use crate::infrastructure::database::DbPool;
use crate::infrastructure::database::models::{
    ChatModel, CitationModel, MessageChanges, MessageModel, NewMessageModel,
};
use crate::infrastructure::database::schema::{chats, citations, messages};

const CHAT_IN_FLIGHT_INDEX: &str = "uq_messages_chat_in_flight";

pub struct PostgresChatRepository {
    pool: DbPool,
}

impl PostgresChatRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PostgresChatRepository {
    async fn save(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let row = ChatModel::from(chat);
        run_blocking(&self.pool, "save chat", move |conn| {
            diesel::insert_into(chats::table)
                .values(&row)
                .on_conflict(chats::id)
                .do_update()
                .set((
                    chats::title.eq(excluded(chats::title)),
                    chats::auxiliary_store_ids.eq(excluded(chats::auxiliary_store_ids)),
                    chats::updated_at.eq(excluded(chats::updated_at)),
                ))
                .execute(conn)
        })
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Chat>, RepositoryError> {
        let model = run_blocking(&self.pool, "find chat", move |conn| {
            chats::table
                .find(id)
                .select(ChatModel::as_select())
                .first(conn)
                .optional()
        })
        .await?;
        Ok(model.map(Chat::from))
    }
}

pub struct PostgresMessageRepository {
    pool: DbPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn message_to_domain(model: MessageModel) -> Result<Message, RepositoryError> {
    Message::try_from(model).map_err(|e| {
        RepositoryError::ValidationError(format!("Failed to convert message model: {}", e))
    })
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn save(&self, message: &Message) -> Result<(), RepositoryError> {
        let row = NewMessageModel::from(message);
        let changes = MessageChanges::from(message);
        run_blocking(&self.pool, "save message", move |conn| {
            diesel::insert_into(messages::table)
                .values(&row)
                .on_conflict(messages::id)
                .do_update()
                .set(&changes)
                .execute(conn)
        })
        .await?;
        Ok(())
    }

    async fn insert_if_chat_idle(&self, message: &Message) -> Result<bool, RepositoryError> {
        let row = NewMessageModel::from(message);
        run_blocking(&self.pool, "insert message", move |conn| {
            match diesel::insert_into(messages::table)
                .values(&row)
                .execute(conn)
            {
                Ok(_) => Ok(true),
                Err(e) if is_violation_of(&e, CHAT_IN_FLIGHT_INDEX) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, RepositoryError> {
        let model = run_blocking(&self.pool, "find message", move |conn| {
            messages::table
                .find(id)
                .select(MessageModel::as_select())
                .first(conn)
                .optional()
        })
        .await?;
        model.map(message_to_domain).transpose()
    }

    async fn update(&self, message: &Message) -> Result<(), RepositoryError> {
        let id = message.id();
        let changes = MessageChanges::from(message);
        let updated = run_blocking(&self.pool, "update message", move |conn| {
            diesel::update(messages::table.find(id))
                .set(&changes)
                .execute(conn)
        })
        .await?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Message>, RepositoryError> {
        let models = run_blocking(&self.pool, "list messages", move |conn| {
            messages::table
                .filter(messages::chat_id.eq(chat_id))
                .order(messages::seq.asc())
                .select(MessageModel::as_select())
                .load(conn)
        })
        .await?;
        models.into_iter().map(message_to_domain).collect()
    }
}

pub struct PostgresCitationRepository {
    pool: DbPool,
}

impl PostgresCitationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CitationRepository for PostgresCitationRepository {
    async fn save_batch(&self, batch: &[Citation]) -> Result<(), RepositoryError> {
        if batch.is_empty() {
            return Ok(());
        }
        let rows: Vec<CitationModel> = batch.iter().map(CitationModel::from).collect();
        run_blocking(&self.pool, "save citations", move |conn| {
            diesel::insert_into(citations::table)
                .values(&rows)
                .on_conflict((citations::message_id, citations::document_id))
                .do_update()
                .set((
                    citations::id.eq(excluded(citations::id)),
                    citations::pages.eq(excluded(citations::pages)),
                    citations::snippet.eq(excluded(citations::snippet)),
                    citations::confidence.eq(excluded(citations::confidence)),
                    citations::strength.eq(excluded(citations::strength)),
                    citations::created_at.eq(excluded(citations::created_at)),
                ))
                .execute(conn)
        })
        .await?;
        Ok(())
    }

    async fn find_by_message(&self, message_id: Uuid) -> Result<Vec<Citation>, RepositoryError> {
        let models = run_blocking(&self.pool, "find citations", move |conn| {
            citations::table
                .filter(citations::message_id.eq(message_id))
                .order((citations::created_at.asc(), citations::id.asc()))
                .select(CitationModel::as_select())
                .load(conn)
        })
        .await?;
        models
            .into_iter()
            .map(|model| {
                Citation::try_from(model).map_err(|e| {
                    RepositoryError::ValidationError(format!(
                        "Failed to convert citation model: {}",
                        e
                    ))
                })
            })
            .collect()
    }
}
