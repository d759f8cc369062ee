pub mod chat;
pub mod citation;
pub mod document;
pub mod job;
pub mod message;
pub mod store;

pub use chat::Chat;
pub use citation::{Citation, EvidenceStrength};
pub use document::Document;
pub use job::{Job, JobContext, JobKind};
pub use message::Message;
pub use store::Store;
