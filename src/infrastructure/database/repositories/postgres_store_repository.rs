use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use uuid::Uuid;

use super::run_blocking;
use crate::domain::entities::Store;
use crate::domain::repositories::{RepositoryError, StoreRepository};
use crate::domain::value_objects::StoreStatus;
use crate::infrastructure::database::DbPool;
use crate::infrastructure::database::models::{NewStoreModel, StoreLifecycleChanges, StoreModel};
use crate::infrastructure::database::schema::stores;

const ADJUST_USAGE_SQL: &str = "UPDATE stores \
     SET size_bytes = GREATEST(size_bytes + $1, 0), \
         active_document_count = GREATEST(active_document_count + $2, 0), \
         updated_at = NOW() \
     WHERE id = $3";

pub struct PostgresStoreRepository {
    pool: DbPool,
}

impl PostgresStoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_domain(model: StoreModel) -> Result<Store, RepositoryError> {
    Store::try_from(model)
        .map_err(|e| RepositoryError::ValidationError(format!("Failed to convert store model: {}", e)))
}

fn store_exists(conn: &mut PgConnection, id: Uuid) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(stores::table.find(id))).get_result(conn)
}

#[async_trait]
impl StoreRepository for PostgresStoreRepository {
    async fn save(&self, store: &Store) -> Result<(), RepositoryError> {
        let row = NewStoreModel::from(store);
        let changes = StoreLifecycleChanges::from(store);

        run_blocking(&self.pool, "save store", move |conn| {
            diesel::insert_into(stores::table)
                .values(&row)
                .on_conflict(stores::id)
                .do_update()
                .set(&changes)
                .execute(conn)
        })
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, RepositoryError> {
        let model = run_blocking(&self.pool, "find store", move |conn| {
            stores::table
                .find(id)
                .select(StoreModel::as_select())
                .first(conn)
                .optional()
        })
        .await?;
        model.map(to_domain).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Store>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted = ids.to_vec();
        let models = run_blocking(&self.pool, "find stores", move |conn| {
            stores::table
                .filter(stores::id.eq_any(wanted))
                .select(StoreModel::as_select())
                .load(conn)
        })
        .await?;

        // Callers rely on the requested order (primary store first).
        let mut found: Vec<Store> = models
            .into_iter()
            .map(to_domain)
            .collect::<Result<_, _>>()?;
        found.sort_by_key(|s| ids.iter().position(|id| *id == s.id()));
        Ok(found)
    }

    async fn update_lifecycle(&self, store: &Store) -> Result<(), RepositoryError> {
        let id = store.id();
        let changes = StoreLifecycleChanges::from(store);
        let updated = run_blocking(&self.pool, "update store", move |conn| {
            diesel::update(stores::table.find(id))
                .set(&changes)
                .execute(conn)
        })
        .await?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn activate(&self, id: Uuid, remote_name: &str) -> Result<bool, RepositoryError> {
        let remote_name = remote_name.to_string();
        let outcome = run_blocking(&self.pool, "activate store", move |conn| {
            let updated = diesel::update(
                stores::table.find(id).filter(
                    stores::status
                        .eq_any([StoreStatus::Pending.as_str(), StoreStatus::Failed.as_str()]),
                ),
            )
            .set((
                stores::remote_name.eq(Some(remote_name)),
                stores::status.eq(StoreStatus::Active.as_str()),
                stores::error_message.eq(None::<String>),
                stores::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

            if updated > 0 {
                return Ok(Some(true));
            }
            Ok(store_exists(conn, id)?.then_some(false))
        })
        .await?;

        outcome.ok_or(RepositoryError::NotFound(id))
    }

    async fn reserve_capacity(
        &self,
        id: Uuid,
        bytes: i64,
        capacity_bytes: i64,
    ) -> Result<bool, RepositoryError> {
        let outcome = run_blocking(&self.pool, "reserve store capacity", move |conn| {
            let updated = diesel::update(
                stores::table
                    .find(id)
                    .filter(stores::size_bytes.le(capacity_bytes - bytes)),
            )
            .set((
                stores::size_bytes.eq(stores::size_bytes + bytes),
                stores::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

            if updated > 0 {
                return Ok(Some(true));
            }
            Ok(store_exists(conn, id)?.then_some(false))
        })
        .await?;

        outcome.ok_or(RepositoryError::NotFound(id))
    }

    async fn adjust_usage(
        &self,
        id: Uuid,
        size_delta: i64,
        active_count_delta: i32,
    ) -> Result<(), RepositoryError> {
        let updated = run_blocking(&self.pool, "adjust store usage", move |conn| {
            diesel::sql_query(ADJUST_USAGE_SQL)
                .bind::<BigInt, _>(size_delta)
                .bind::<Integer, _>(active_count_delta)
                .bind::<diesel::sql_types::Uuid, _>(id)
                .execute(conn)
        })
        .await?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
