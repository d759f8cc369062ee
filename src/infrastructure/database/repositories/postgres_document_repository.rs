use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use super::run_blocking;
use crate::domain::entities::Document;
use crate::domain::repositories::{DocumentRepository, RepositoryError};
use crate::domain::value_objects::DocumentStatus;
use crate::infrastructure::database::DbPool;
use crate::infrastructure::database::models::{DocumentChanges, DocumentModel, NewDocumentModel};
use crate::infrastructure::database::schema::documents;

pub struct PostgresDocumentRepository {
    pool: DbPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_domain(model: DocumentModel) -> Result<Document, RepositoryError> {
    Document::try_from(model).map_err(|e| {
        RepositoryError::ValidationError(format!("Failed to convert document model: {}", e))
    })
}

fn to_domain_all(models: Vec<DocumentModel>) -> Result<Vec<Document>, RepositoryError> {
    models.into_iter().map(to_domain).collect()
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<(), RepositoryError> {
        let row = NewDocumentModel::from(document);
        run_blocking(&self.pool, "insert document", move |conn| {
            diesel::insert_into(documents::table)
                .values(&row)
                .execute(conn)
        })
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, RepositoryError> {
        let model = run_blocking(&self.pool, "find document", move |conn| {
            documents::table
                .find(id)
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()
        })
        .await?;
        model.map(to_domain).transpose()
    }

    async fn update(&self, document: &Document) -> Result<(), RepositoryError> {
        let id = document.id();
        let changes = DocumentChanges::from(document);
        let updated = run_blocking(&self.pool, "update document", move |conn| {
            diesel::update(documents::table.find(id))
                .set(&changes)
                .execute(conn)
        })
        .await?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<Document>, RepositoryError> {
        let model = run_blocking(&self.pool, "claim document", move |conn| {
            diesel::update(documents::table.find(id).filter(documents::status.eq_any([
                DocumentStatus::Pending.as_str(),
                DocumentStatus::Failed.as_str(),
            ])))
            .set((
                documents::status.eq(DocumentStatus::Processing.as_str()),
                documents::updated_at.eq(Utc::now()),
            ))
            .returning(DocumentModel::as_returning())
            .get_result(conn)
            .optional()
        })
        .await?;
        model.map(to_domain).transpose()
    }

    async fn settle_processing(&self, document: &Document) -> Result<bool, RepositoryError> {
        let id = document.id();
        let changes = DocumentChanges::from(document);
        let updated = run_blocking(&self.pool, "settle document", move |conn| {
            diesel::update(
                documents::table
                    .find(id)
                    .filter(documents::status.eq(DocumentStatus::Processing.as_str())),
            )
            .set(&changes)
            .execute(conn)
        })
        .await?;
        Ok(updated == 1)
    }

    async fn find_by_display_names(
        &self,
        store_ids: &[Uuid],
        names: &[String],
    ) -> Result<Vec<Document>, RepositoryError> {
        if store_ids.is_empty() || names.is_empty() {
            return Ok(Vec::new());
        }
        let store_ids = store_ids.to_vec();
        let names = names.to_vec();
        let models = run_blocking(&self.pool, "find documents by name", move |conn| {
            documents::table
                .filter(documents::store_id.eq_any(store_ids))
                .filter(documents::display_name.eq_any(names))
                .filter(documents::status.ne(DocumentStatus::Deleted.as_str()))
                .order(documents::created_at.asc())
                .select(DocumentModel::as_select())
                .load(conn)
        })
        .await?;
        to_domain_all(models)
    }

    async fn list_by_store(&self, store_id: Uuid) -> Result<Vec<Document>, RepositoryError> {
        let models = run_blocking(&self.pool, "list documents", move |conn| {
            documents::table
                .filter(documents::store_id.eq(store_id))
                .filter(documents::status.ne(DocumentStatus::Deleted.as_str()))
                .order(documents::created_at.asc())
                .select(DocumentModel::as_select())
                .load(conn)
        })
        .await?;
        to_domain_all(models)
    }
}
