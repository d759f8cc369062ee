use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::StoreHandler;

pub fn store_routes(store_handler: Arc<StoreHandler>) -> Router {
    Router::new()
        .route("/stores", post(StoreHandler::create_store))
        .route(
            "/stores/{store_id}",
            get(StoreHandler::get_store).delete(StoreHandler::delete_store),
        )
        .with_state(store_handler)
}
