use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    CatalogQueries, CreateStoreRequest, CreateStoreUseCase, DeleteStoreUseCase,
};
use crate::domain::value_objects::Owner;
use crate::presentation::http::dto::{
    AcceptedResponseDto, ActorQuery, ApiResponse, CreateStoreDto, StoreResponseDto,
};
use crate::presentation::http::handlers::failure;

pub struct StoreHandler {
    create_store_use_case: Arc<CreateStoreUseCase>,
    delete_store_use_case: Arc<DeleteStoreUseCase>,
    catalog: Arc<CatalogQueries>,
}

impl StoreHandler {
    pub fn new(
        create_store_use_case: Arc<CreateStoreUseCase>,
        delete_store_use_case: Arc<DeleteStoreUseCase>,
        catalog: Arc<CatalogQueries>,
    ) -> Self {
        Self {
            create_store_use_case,
            delete_store_use_case,
            catalog,
        }
    }

    /// Accepts the store as pending; the remote store is created in the background.
    pub async fn create_store(
        State(handler): State<Arc<StoreHandler>>,
        Json(body): Json<CreateStoreDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = CreateStoreRequest {
            owner: Owner::from_tenant_id(body.tenant_id),
            display_name: body.display_name,
            actor_id: body.actor_id,
        };

        match handler.create_store_use_case.execute(request).await {
            Ok(store) => Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(StoreResponseDto::from(store))),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn get_store(
        State(handler): State<Arc<StoreHandler>>,
        Path(store_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.catalog.store(store_id).await {
            Ok(store) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(StoreResponseDto::from(store))),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn delete_store(
        State(handler): State<Arc<StoreHandler>>,
        Path(store_id): Path<Uuid>,
        Query(actor): Query<ActorQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .delete_store_use_case
            .execute(store_id, actor.actor_id)
            .await
        {
            Ok(()) => Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(AcceptedResponseDto {
                    id: store_id,
                    message: "Store deletion requested".to_string(),
                })),
            )),
            Err(e) => Ok(failure(e)),
        }
    }
}
