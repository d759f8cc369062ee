use std::{path::PathBuf, sync::Arc};
use tracing::info;

use crate::{
    application::{
        ports::{Broadcaster, ChatModel, EventBus, FileStorage, JobQueue, RemoteStoreClient},
        services::{CitationExtractor, OperationPoller},
        use_cases::{
            CatalogQueries, CreateChatUseCase, CreateStoreUseCase, DeleteDocumentUseCase,
            DeleteStoreUseCase, SubmitMessageUseCase, UploadDocumentUseCase,
        },
        workers::{ChatTurnProcessor, DocumentSyncWorker, JobRouter, StoreLifecycleWorker},
    },
    domain::repositories::{
        ChatRepository, CitationRepository, DocumentRepository, MessageRepository,
        StoreRepository,
    },
    infrastructure::{
        config::{AppConfig, StorageBackend},
        database::{
            DbPool, create_connection_pool, get_connection_from_pool,
            repositories::{
                PostgresChatRepository, PostgresCitationRepository, PostgresDocumentRepository,
                PostgresMessageRepository, PostgresStoreRepository,
            },
            run_migrations,
        },
        external_services::GeminiClient,
        file_system::{InMemoryFileStorage, LocalFileStorage},
        memory::{
            InMemoryChatRepository, InMemoryCitationRepository, InMemoryDocumentRepository,
            InMemoryMessageRepository, InMemoryStoreRepository,
        },
        messaging::{
            BackgroundProcessor, BroadcastHub, DeadLetterQueue, EventDispatcher, MpscJobQueue,
        },
    },
    presentation::http::handlers::{
        ChatHandler, DocumentHandler, HealthHandler, SseHandler, StoreHandler,
    },
};

/// One implementation of every repository trait.
#[derive(Clone)]
pub struct Repositories {
    pub stores: Arc<dyn StoreRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub citations: Arc<dyn CitationRepository>,
}

impl Repositories {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            stores: Arc::new(PostgresStoreRepository::new(pool.clone())),
            documents: Arc::new(PostgresDocumentRepository::new(pool.clone())),
            chats: Arc::new(PostgresChatRepository::new(pool.clone())),
            messages: Arc::new(PostgresMessageRepository::new(pool.clone())),
            citations: Arc::new(PostgresCitationRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            stores: Arc::new(InMemoryStoreRepository::new()),
            documents: Arc::new(InMemoryDocumentRepository::new()),
            chats: Arc::new(InMemoryChatRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            citations: Arc::new(InMemoryCitationRepository::new()),
        }
    }
}

pub struct AppContainer {
    pub config: AppConfig,

    // Repositories
    pub repositories: Repositories,

    // External Services
    pub remote_store: Arc<dyn RemoteStoreClient>,
    pub chat_model: Arc<dyn ChatModel>,
    pub file_storage: Arc<dyn FileStorage>,

    // Job Queue, Events and Background Processing
    pub job_queue: Arc<dyn JobQueue>,
    pub event_bus: Arc<dyn EventBus>,
    pub broadcast_hub: Arc<BroadcastHub>,
    pub background_processor: Arc<BackgroundProcessor>,

    // Use Cases
    pub create_store_use_case: Arc<CreateStoreUseCase>,
    pub delete_store_use_case: Arc<DeleteStoreUseCase>,
    pub upload_document_use_case: Arc<UploadDocumentUseCase>,
    pub delete_document_use_case: Arc<DeleteDocumentUseCase>,
    pub create_chat_use_case: Arc<CreateChatUseCase>,
    pub submit_message_use_case: Arc<SubmitMessageUseCase>,
    pub catalog_queries: Arc<CatalogQueries>,

    // HTTP Handlers
    pub store_handler: Arc<StoreHandler>,
    pub document_handler: Arc<DocumentHandler>,
    pub chat_handler: Arc<ChatHandler>,
    pub sse_handler: Arc<SseHandler>,
    pub health_handler: Arc<HealthHandler>,
}

impl AppContainer {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let (repositories, file_storage): (Repositories, Arc<dyn FileStorage>) =
            match config.database.backend {
                StorageBackend::Postgres => {
                    let db_pool = create_connection_pool(&config.database)?;
                    let mut conn = get_connection_from_pool(&db_pool)
                        .map_err(|e| format!("Failed to create database connection: {}", e))?;
                    run_migrations(&mut conn)
                        .map_err(|e| format!("Failed to run database migrations: {}", e))?;

                    let file_storage =
                        LocalFileStorage::new(PathBuf::from(&config.server.upload_dir));
                    file_storage.ensure_directory_exists().await?;
                    (Repositories::postgres(db_pool), Arc::new(file_storage))
                }
                StorageBackend::Memory => {
                    info!("Using in-memory storage, state is lost on restart");
                    (
                        Repositories::in_memory(),
                        Arc::new(InMemoryFileStorage::new()),
                    )
                }
            };

        let gemini = Arc::new(GeminiClient::new(config.remote.clone())?);
        let remote_store: Arc<dyn RemoteStoreClient> = gemini.clone();
        let chat_model: Arc<dyn ChatModel> = gemini;

        Ok(Self::assemble(
            config,
            repositories,
            remote_store,
            chat_model,
            file_storage,
        ))
    }

    /// Wire every component on top of the given adapters.
    pub fn assemble(
        config: AppConfig,
        repositories: Repositories,
        remote_store: Arc<dyn RemoteStoreClient>,
        chat_model: Arc<dyn ChatModel>,
        file_storage: Arc<dyn FileStorage>,
    ) -> Self {
        let Repositories {
            stores,
            documents,
            chats,
            messages,
            citations,
        } = repositories.clone();

        let (job_queue, job_receiver) = MpscJobQueue::create_pair();
        let job_queue: Arc<dyn JobQueue> = Arc::new(job_queue);
        let job_receiver = Arc::new(job_receiver);

        let broadcast_hub = Arc::new(BroadcastHub::new());
        let broadcaster: Arc<dyn Broadcaster> = broadcast_hub.clone();
        let event_bus: Arc<dyn EventBus> =
            Arc::new(EventDispatcher::new(job_queue.clone(), broadcaster.clone()));

        // Workers
        let poller = Arc::new(OperationPoller::new(remote_store.clone(), config.poller));
        let store_worker = Arc::new(StoreLifecycleWorker::new(
            stores.clone(),
            documents.clone(),
            remote_store.clone(),
            event_bus.clone(),
        ));
        let document_worker = Arc::new(DocumentSyncWorker::new(
            documents.clone(),
            stores.clone(),
            remote_store.clone(),
            poller,
            file_storage.clone(),
            event_bus.clone(),
        ));
        let chat_processor = Arc::new(ChatTurnProcessor::new(
            chats.clone(),
            messages.clone(),
            citations.clone(),
            stores.clone(),
            documents.clone(),
            chat_model.clone(),
            broadcaster,
            CitationExtractor::new(config.citations),
            config.chat.clone(),
        ));
        let router = Arc::new(JobRouter::new(
            store_worker,
            document_worker,
            chat_processor,
            config.retries,
        ));

        let dead_letters = Arc::new(DeadLetterQueue::new());
        let background_processor = Arc::new(
            BackgroundProcessor::new(
                job_receiver,
                job_queue.clone(),
                router,
                dead_letters.clone(),
            )
            .with_worker_count(config.server.worker_count),
        );

        // Use cases
        let create_store_use_case =
            Arc::new(CreateStoreUseCase::new(stores.clone(), event_bus.clone()));
        let delete_store_use_case =
            Arc::new(DeleteStoreUseCase::new(stores.clone(), event_bus.clone()));
        let upload_document_use_case = Arc::new(UploadDocumentUseCase::new(
            stores.clone(),
            documents.clone(),
            file_storage.clone(),
            event_bus.clone(),
            config.limits,
        ));
        let delete_document_use_case =
            Arc::new(DeleteDocumentUseCase::new(documents.clone(), event_bus.clone()));
        let create_chat_use_case = Arc::new(CreateChatUseCase::new(chats.clone(), stores.clone()));
        let submit_message_use_case = Arc::new(SubmitMessageUseCase::new(
            chats.clone(),
            messages.clone(),
            job_queue.clone(),
        ));
        let catalog_queries = Arc::new(CatalogQueries::new(
            stores, documents, chats, messages, citations,
        ));

        // HTTP handlers
        let store_handler = Arc::new(StoreHandler::new(
            create_store_use_case.clone(),
            delete_store_use_case.clone(),
            catalog_queries.clone(),
        ));
        let document_handler = Arc::new(DocumentHandler::new(
            upload_document_use_case.clone(),
            delete_document_use_case.clone(),
            catalog_queries.clone(),
        ));
        let chat_handler = Arc::new(ChatHandler::new(
            create_chat_use_case.clone(),
            submit_message_use_case.clone(),
            catalog_queries.clone(),
        ));
        let sse_handler = Arc::new(SseHandler::new(broadcast_hub.clone()));
        let health_handler = Arc::new(HealthHandler::new(job_queue.clone(), dead_letters));

        Self {
            config,
            repositories,
            remote_store,
            chat_model,
            file_storage,
            job_queue,
            event_bus,
            broadcast_hub,
            background_processor,
            create_store_use_case,
            delete_store_use_case,
            upload_document_use_case,
            delete_document_use_case,
            create_chat_use_case,
            submit_message_use_case,
            catalog_queries,
            store_handler,
            document_handler,
            chat_handler,
            sse_handler,
            health_handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    use crate::application::services::PollerConfig;
    use crate::application::use_cases::{CreateStoreRequest, UploadDocumentRequest};
    use crate::domain::value_objects::{DocumentStatus, Owner, StoreStatus};
    use crate::test_support::{FakeChatModel, FakeRemoteStore, finished_operation};

    async fn wait_for<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_store_and_document_sync_end_to_end() {
        let remote = Arc::new(FakeRemoteStore::new());
        let mut config = AppConfig::default();
        config.poller = PollerConfig {
            max_attempts: 3,
            interval: Duration::from_millis(1),
        };
        let container = AppContainer::assemble(
            config,
            Repositories::in_memory(),
            remote.clone(),
            Arc::new(FakeChatModel::new()),
            Arc::new(InMemoryFileStorage::new()),
        );
        let mut notifications = container.broadcast_hub.subscribe_users();
        let processor = container.background_processor.clone();
        let workers = tokio::spawn(async move { processor.start().await });

        let actor = Uuid::new_v4();
        let store = container
            .create_store_use_case
            .execute(CreateStoreRequest {
                owner: Owner::Global,
                display_name: "Research".to_string(),
                actor_id: Some(actor),
            })
            .await
            .unwrap();

        let store_id = store.id();
        let catalog = container.catalog_queries.clone();
        wait_for(|| {
            let catalog = catalog.clone();
            async move { catalog.store(store_id).await.unwrap().status() == StoreStatus::Active }
        })
        .await;
        let notification = notifications.recv().await.unwrap();
        assert_eq!(notification.user_id, actor);
        assert_eq!(notification.event, "stores.created");

        remote.push_operation(Ok(finished_operation(
            "fileSearchStores/research/documents/doc-1",
            5,
        )));
        let document = container
            .upload_document_use_case
            .execute(UploadDocumentRequest {
                store_id,
                file_name: "notes.txt".to_string(),
                file_data: b"hello".to_vec(),
                metadata: None,
            })
            .await
            .unwrap();
        let document_id = document.id();

        wait_for(|| {
            let catalog = catalog.clone();
            async move {
                catalog.document(document_id).await.unwrap().status() == DocumentStatus::Active
            }
        })
        .await;
        let synced = catalog.document(document_id).await.unwrap();
        assert_eq!(synced.remote_id(), Some("doc-1"));
        assert_eq!(catalog.store(store_id).await.unwrap().active_document_count(), 1);

        workers.abort();
    }
}
