use async_trait::async_trait;
use std::time::Duration;

use crate::domain::entities::Job;

#[derive(Debug)]
pub enum JobQueueError {
    ConnectionError(String),
    InvalidJob(String),
}

impl std::fmt::Display for JobQueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobQueueError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            JobQueueError::InvalidJob(msg) => write!(f, "Invalid job: {}", msg),
        }
    }
}

impl std::error::Error for JobQueueError {}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for immediate processing
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Enqueue a job once `delay` has elapsed
    async fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), JobQueueError>;

    /// Jobs enqueued but not yet handed to a worker
    async fn size(&self) -> Result<usize, JobQueueError>;

    /// Queue health/statistics
    async fn health_check(&self) -> Result<QueueHealth, JobQueueError>;
}

#[derive(Debug, Clone)]
pub struct QueueHealth {
    pub queue_size: usize,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub total_redelivered: u64,
    pub is_healthy: bool,
    pub last_activity: Option<chrono::DateTime<chrono::Utc>>,
}
