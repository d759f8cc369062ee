use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Store;
use crate::domain::value_objects::{Owner, StoreStatus};
use crate::infrastructure::database::schema::stores;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = stores)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoreModel {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub display_name: String,
    pub remote_name: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub size_bytes: i64,
    pub active_document_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = stores)]
pub struct NewStoreModel {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub display_name: String,
    pub remote_name: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub size_bytes: i64,
    pub active_document_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Lifecycle columns only; usage counters are written by dedicated statements.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = stores)]
#[diesel(treat_none_as_null = true)]
pub struct StoreLifecycleChanges {
    pub remote_name: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Store> for NewStoreModel {
    fn from(store: &Store) -> Self {
        Self {
            id: store.id(),
            tenant_id: store.owner().tenant_id(),
            display_name: store.display_name().to_string(),
            remote_name: store.remote_name().map(str::to_string),
            status: store.status().as_str().to_string(),
            error_message: store.error_message().map(str::to_string),
            size_bytes: store.size_bytes(),
            active_document_count: store.active_document_count(),
            created_at: store.created_at(),
            updated_at: store.updated_at(),
            deleted_at: store.deleted_at(),
        }
    }
}

impl From<&Store> for StoreLifecycleChanges {
    fn from(store: &Store) -> Self {
        Self {
            remote_name: store.remote_name().map(str::to_string),
            status: store.status().as_str().to_string(),
            error_message: store.error_message().map(str::to_string),
            updated_at: store.updated_at(),
            deleted_at: store.deleted_at(),
        }
    }
}

impl TryFrom<StoreModel> for Store {
    type Error = String;

    fn try_from(model: StoreModel) -> Result<Self, Self::Error> {
        Ok(Store::from_database(
            model.id,
            Owner::from_tenant_id(model.tenant_id),
            model.display_name,
            model.remote_name,
            StoreStatus::parse(&model.status)?,
            model.error_message,
            model.size_bytes,
            model.active_document_count,
            model.created_at,
            model.updated_at,
            model.deleted_at,
        ))
    }
}
