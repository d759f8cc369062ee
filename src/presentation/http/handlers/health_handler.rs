use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::ports::JobQueue;
use crate::infrastructure::messaging::DeadLetterQueue;
use crate::presentation::http::dto::{ApiResponse, QueueHealthDto};

pub struct HealthHandler {
    job_queue: Arc<dyn JobQueue>,
    dead_letters: Arc<DeadLetterQueue>,
}

impl HealthHandler {
    pub fn new(job_queue: Arc<dyn JobQueue>, dead_letters: Arc<DeadLetterQueue>) -> Self {
        Self {
            job_queue,
            dead_letters,
        }
    }

    pub async fn queue_health(
        State(handler): State<Arc<HealthHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let health = match handler.job_queue.health_check().await {
            Ok(health) => health,
            Err(e) => {
                return Ok((
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiResponse::error(
                        "QUEUE_UNAVAILABLE".to_string(),
                        e.to_string(),
                        None,
                    )),
                ));
            }
        };

        let status = if health.is_healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        let dto = QueueHealthDto {
            queue_size: health.queue_size,
            total_enqueued: health.total_enqueued,
            total_dequeued: health.total_dequeued,
            total_redelivered: health.total_redelivered,
            dead_letters: handler.dead_letters.len().await,
            is_healthy: health.is_healthy,
            last_activity: health.last_activity.map(|t| t.to_rfc3339()),
        };
        Ok((status, Json(ApiResponse::success(dto))))
    }
}
