use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    CatalogQueries, DeleteDocumentUseCase, UploadDocumentRequest, UploadDocumentUseCase,
    UseCaseError,
};
use crate::domain::value_objects::DocumentMetadata;
use crate::presentation::http::dto::{
    AcceptedResponseDto, ApiResponse, DocumentListResponseDto, DocumentResponseDto,
};
use crate::presentation::http::handlers::failure;

pub struct DocumentHandler {
    upload_document_use_case: Arc<UploadDocumentUseCase>,
    delete_document_use_case: Arc<DeleteDocumentUseCase>,
    catalog: Arc<CatalogQueries>,
}

impl DocumentHandler {
    pub fn new(
        upload_document_use_case: Arc<UploadDocumentUseCase>,
        delete_document_use_case: Arc<DeleteDocumentUseCase>,
        catalog: Arc<CatalogQueries>,
    ) -> Self {
        Self {
            upload_document_use_case,
            delete_document_use_case,
            catalog,
        }
    }

    /// Multipart form with a `file` part and an optional `metadata` part
    /// holding a JSON object.
    pub async fn upload_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(store_id): Path<Uuid>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, StatusCode> {
        let mut file: Option<(String, Vec<u8>)> = None;
        let mut metadata: Option<DocumentMetadata> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?
        {
            match field.name() {
                Some("metadata") => {
                    let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                    let parsed = serde_json::from_str::<serde_json::Value>(&text)
                        .map_err(|e| e.to_string())
                        .and_then(DocumentMetadata::try_from);
                    match parsed {
                        Ok(value) => metadata = Some(value),
                        Err(e) => {
                            return Ok(failure(UseCaseError::ValidationError(format!(
                                "Invalid metadata: {}",
                                e
                            ))));
                        }
                    }
                }
                _ => {
                    let Some(file_name) = field.file_name().map(str::to_string) else {
                        continue;
                    };
                    let data = field
                        .bytes()
                        .await
                        .map_err(|_| StatusCode::BAD_REQUEST)?
                        .to_vec();
                    file = Some((file_name, data));
                }
            }
        }

        let Some((file_name, file_data)) = file else {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "NO_FILE_PROVIDED".to_string(),
                    "No file provided in the request".to_string(),
                    None,
                )),
            ));
        };

        let request = UploadDocumentRequest {
            store_id,
            file_name,
            file_data,
            metadata,
        };
        match handler.upload_document_use_case.execute(request).await {
            Ok(document) => Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(DocumentResponseDto::from(document))),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn list_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Path(store_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.catalog.documents(store_id).await {
            Ok(documents) => {
                let dto = DocumentListResponseDto {
                    store_id,
                    documents: documents.into_iter().map(DocumentResponseDto::from).collect(),
                };
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn get_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.catalog.document(document_id).await {
            Ok(document) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(DocumentResponseDto::from(document))),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn delete_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.delete_document_use_case.execute(document_id).await {
            Ok(()) => Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(AcceptedResponseDto {
                    id: document_id,
                    message: "Document deletion requested".to_string(),
                })),
            )),
            Err(e) => Ok(failure(e)),
        }
    }
}
