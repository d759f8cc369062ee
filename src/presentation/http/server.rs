use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::AppContainer;
use crate::infrastructure::messaging::BackgroundProcessor;
use crate::presentation::http::{
    handlers::{ChatHandler, DocumentHandler, HealthHandler, SseHandler, StoreHandler},
    routes::{chat_routes, document_routes, health_routes, store_routes},
};

/// Uploads are buffered in memory before they are staged.
const BODY_LIMIT_BYTES: usize = 250 * 1024 * 1024;

pub struct HttpServer {
    store_handler: Arc<StoreHandler>,
    document_handler: Arc<DocumentHandler>,
    chat_handler: Arc<ChatHandler>,
    sse_handler: Arc<SseHandler>,
    health_handler: Arc<HealthHandler>,
    background_processor: Arc<BackgroundProcessor>,
    port: u16,
}

impl HttpServer {
    pub fn new(container: &AppContainer) -> Self {
        Self {
            store_handler: container.store_handler.clone(),
            document_handler: container.document_handler.clone(),
            chat_handler: container.chat_handler.clone(),
            sse_handler: container.sse_handler.clone(),
            health_handler: container.health_handler.clone(),
            background_processor: container.background_processor.clone(),
            port: container.config.server.port,
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(health_routes(self.health_handler.clone()))
            .merge(store_routes(self.store_handler.clone()))
            .merge(document_routes(self.document_handler.clone()))
            .merge(chat_routes(
                self.chat_handler.clone(),
                self.sse_handler.clone(),
            ))
            .layer(cors)
            .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        // Start background processor
        let background_processor = self.background_processor.clone();
        tokio::spawn(async move {
            background_processor.start().await;
        });

        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!("Listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::infrastructure::AppConfig;
    use crate::infrastructure::container::Repositories;
    use crate::infrastructure::file_system::InMemoryFileStorage;
    use crate::test_support::{FakeChatModel, FakeRemoteStore};

    fn server() -> HttpServer {
        let container = AppContainer::assemble(
            AppConfig::default(),
            Repositories::in_memory(),
            Arc::new(FakeRemoteStore::new()),
            Arc::new(FakeChatModel::new()),
            Arc::new(InMemoryFileStorage::new()),
        );
        HttpServer::new(&container)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_store_is_accepted_as_pending() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/stores")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"display_name":"Annual reports"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["remote_name"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_chat_is_not_found() {
        let uri = format!("/chats/{}/messages", uuid::Uuid::new_v4());
        let response = server()
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_queue_health_reports_counters() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health/queue")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["queue_size"], 0);
        assert_eq!(body["data"]["dead_letters"], 0);
    }
}
