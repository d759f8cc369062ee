pub mod catalog_queries;
pub mod create_chat;
pub mod create_store;
pub mod delete_document;
pub mod delete_store;
pub mod error;
pub mod submit_message;
pub mod upload_document;

pub use catalog_queries::{CatalogQueries, MessageWithCitations};
pub use create_chat::{CreateChatRequest, CreateChatUseCase};
pub use create_store::{CreateStoreRequest, CreateStoreUseCase};
pub use delete_document::DeleteDocumentUseCase;
pub use delete_store::DeleteStoreUseCase;
pub use error::UseCaseError;
pub use submit_message::{SubmitMessageRequest, SubmitMessageUseCase};
pub use upload_document::{UploadDocumentRequest, UploadDocumentUseCase, UploadLimits};
