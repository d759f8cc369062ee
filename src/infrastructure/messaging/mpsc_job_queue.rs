use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::job_queue::{JobQueue, JobQueueError, QueueHealth};
use crate::domain::entities::Job;

/// In-process job queue over an unbounded tokio channel.
///
/// Jobs count as pending from `enqueue` (or `enqueue_after`) until a worker
/// receives them, so delayed redeliveries show up in `size()`.
#[derive(Clone)]
pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<Job>,
    pending_jobs: Arc<Mutex<HashMap<Uuid, Job>>>,
    stats: Arc<Mutex<QueueStats>>,
}

#[derive(Debug, Clone, Default)]
struct QueueStats {
    total_enqueued: u64,
    total_dequeued: u64,
    total_redelivered: u64,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
}

impl MpscJobQueue {
    pub fn create_pair() -> (Self, MpscJobQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending_jobs = Arc::new(Mutex::new(HashMap::new()));
        let stats = Arc::new(Mutex::new(QueueStats::default()));

        let queue = Self {
            sender,
            pending_jobs: pending_jobs.clone(),
            stats: stats.clone(),
        };

        let receiver = MpscJobQueueReceiver {
            receiver: Mutex::new(receiver),
            pending_jobs,
            stats,
        };

        (queue, receiver)
    }

    async fn track(&self, job: &Job) {
        self.pending_jobs.lock().await.insert(job.id(), job.clone());

        let mut stats = self.stats.lock().await;
        stats.total_enqueued += 1;
        if job.attempt() > 1 {
            stats.total_redelivered += 1;
        }
        stats.last_activity = Some(chrono::Utc::now());
    }

    async fn untrack(&self, job_id: Uuid) {
        self.pending_jobs.lock().await.remove(&job_id);
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        self.track(&job).await;

        let job_id = job.id();
        if self.sender.send(job).is_err() {
            self.untrack(job_id).await;
            return Err(JobQueueError::ConnectionError("Channel closed".to_string()));
        }
        Ok(())
    }

    async fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), JobQueueError> {
        if self.sender.is_closed() {
            return Err(JobQueueError::ConnectionError("Channel closed".to_string()));
        }
        self.track(&job).await;

        debug!(
            job_id = %job.id(),
            attempt = job.attempt(),
            delay_ms = delay.as_millis() as u64,
            "Scheduling delayed delivery"
        );

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let job_id = job.id();
            if queue.sender.send(job).is_err() {
                queue.untrack(job_id).await;
            }
        });
        Ok(())
    }

    async fn size(&self) -> Result<usize, JobQueueError> {
        let pending = self.pending_jobs.lock().await;
        Ok(pending.len())
    }

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError> {
        let pending = self.pending_jobs.lock().await;
        let stats = self.stats.lock().await;

        Ok(QueueHealth {
            queue_size: pending.len(),
            total_enqueued: stats.total_enqueued,
            total_dequeued: stats.total_dequeued,
            total_redelivered: stats.total_redelivered,
            is_healthy: !self.sender.is_closed(),
            last_activity: stats.last_activity,
        })
    }
}

/// Consumer side shared by the background workers.
pub struct MpscJobQueueReceiver {
    receiver: Mutex<mpsc::UnboundedReceiver<Job>>,
    pending_jobs: Arc<Mutex<HashMap<Uuid, Job>>>,
    stats: Arc<Mutex<QueueStats>>,
}

impl MpscJobQueueReceiver {
    /// Next job, or `None` once every sender is gone.
    pub async fn recv(&self) -> Option<Job> {
        let job = {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        }?;
        self.mark_dequeued(&job).await;
        Some(job)
    }

    pub async fn try_recv(&self) -> Result<Option<Job>, mpsc::error::TryRecvError> {
        let job = {
            let mut receiver = self.receiver.lock().await;
            match receiver.try_recv() {
                Ok(job) => job,
                Err(mpsc::error::TryRecvError::Empty) => return Ok(None),
                Err(e) => return Err(e),
            }
        };
        self.mark_dequeued(&job).await;
        Ok(Some(job))
    }

    async fn mark_dequeued(&self, job: &Job) {
        self.pending_jobs.lock().await.remove(&job.id());

        let mut stats = self.stats.lock().await;
        stats.total_dequeued += 1;
        stats.last_activity = Some(chrono::Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::JobKind;

    fn job() -> Job {
        Job::new(JobKind::UploadDocument {
            document_id: Uuid::new_v4(),
        })
    }

    #[tokio::test]
    async fn test_pending_until_received() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        let first = job();
        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(job()).await.unwrap();
        assert_eq!(queue.size().await.unwrap(), 2);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.id(), first.id());
        assert_eq!(queue.size().await.unwrap(), 1);

        let health = queue.health_check().await.unwrap();
        assert_eq!(health.total_enqueued, 2);
        assert_eq!(health.total_dequeued, 1);
        assert!(health.is_healthy);
    }

    #[tokio::test]
    async fn test_delayed_redelivery() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        let retry = job().redelivery("timeout".to_string());
        queue
            .enqueue_after(retry.clone(), Duration::from_millis(20))
            .await
            .unwrap();

        assert!(receiver.try_recv().await.unwrap().is_none());
        assert_eq!(queue.size().await.unwrap(), 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.attempt(), 2);
        assert_eq!(queue.size().await.unwrap(), 0);
        assert_eq!(queue.health_check().await.unwrap().total_redelivered, 1);
    }

    #[tokio::test]
    async fn test_enqueue_fails_after_receiver_dropped() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        drop(receiver);
        assert!(queue.enqueue(job()).await.is_err());
        assert!(queue.enqueue_after(job(), Duration::ZERO).await.is_err());
        assert_eq!(queue.size().await.unwrap(), 0);
        assert!(!queue.health_check().await.unwrap().is_healthy);
    }
}
