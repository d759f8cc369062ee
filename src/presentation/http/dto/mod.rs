pub mod chat_dto;
pub mod response_dto;
pub mod store_dto;

pub use chat_dto::*;
pub use response_dto::*;
pub use store_dto::*;
