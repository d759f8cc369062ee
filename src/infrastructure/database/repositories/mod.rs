pub mod postgres_chat_repository;
pub mod postgres_document_repository;
pub mod postgres_store_repository;

pub use postgres_chat_repository::{
    PostgresChatRepository, PostgresCitationRepository, PostgresMessageRepository,
};
pub use postgres_document_repository::PostgresDocumentRepository;
pub use postgres_store_repository::PostgresStoreRepository;

use diesel::PgConnection;
use diesel::result::{DatabaseErrorKind, Error as DieselError, QueryResult};

use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::DbPool;

/// Run a diesel query on a pooled connection off the async runtime.
pub(crate) async fn run_blocking<T, F>(
    pool: &DbPool,
    action: &'static str,
    query: F,
) -> Result<T, RepositoryError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| {
            RepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })?;
        query(&mut conn).map_err(|e| map_diesel_error(action, e))
    })
    .await
    .map_err(|e| RepositoryError::DatabaseError(format!("Task join error: {}", e)))?
}

pub(crate) fn map_diesel_error(action: &str, error: DieselError) -> RepositoryError {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            RepositoryError::DuplicateError(format!("Failed to {}: {}", action, info.message()))
        }
        other => RepositoryError::DatabaseError(format!("Failed to {}: {}", action, other)),
    }
}

pub(crate) fn is_violation_of(error: &DieselError, constraint: &str) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(constraint)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_a_database_error() {
        let err = map_diesel_error("load store", DieselError::NotFound);
        assert_eq!(
            err,
            RepositoryError::DatabaseError("Failed to load store: Record not found".to_string())
        );
        assert!(!is_violation_of(&DieselError::NotFound, "uq_documents_store_hash"));
    }
}
