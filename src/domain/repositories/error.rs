use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryError {
    NotFound(Uuid),
    DatabaseError(String),
    ValidationError(String),
    DuplicateError(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound(id) => write!(f, "Record not found: {}", id),
            RepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            RepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            RepositoryError::DuplicateError(msg) => write!(f, "Duplicate error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}
