use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::application::ports::JobQueue;
use crate::application::workers::JobExecutor;
use crate::domain::entities::Job;
use crate::infrastructure::messaging::MpscJobQueueReceiver;

const DEAD_LETTER_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub job: Job,
    pub error: String,
    pub failed_at: chrono::DateTime<chrono::Utc>,
}

/// Jobs that exhausted their delivery budget or failed terminally.
/// Keeps the most recent entries for inspection.
#[derive(Default)]
pub struct DeadLetterQueue {
    entries: Mutex<VecDeque<DeadLetter>>,
}

impl DeadLetterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, job: Job, error: String) {
        error!(
            job_id = %job.id(),
            kind = job.kind().name(),
            subject_id = %job.kind().subject_id(),
            attempt = job.attempt(),
            error = %error,
            "Job dead-lettered"
        );
        let mut entries = self.entries.lock().await;
        if entries.len() >= DEAD_LETTER_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(DeadLetter {
            job,
            error,
            failed_at: chrono::Utc::now(),
        });
    }

    pub async fn entries(&self) -> Vec<DeadLetter> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Worker pool draining the job queue.
///
/// A failed delivery is redelivered through `enqueue_after` while its policy
/// has attempts left and the error is retriable. Nothing retries in-process.
pub struct BackgroundProcessor {
    job_receiver: Arc<MpscJobQueueReceiver>,
    job_queue: Arc<dyn JobQueue>,
    executor: Arc<dyn JobExecutor>,
    dead_letters: Arc<DeadLetterQueue>,
    worker_count: usize,
}

impl BackgroundProcessor {
    pub fn new(
        job_receiver: Arc<MpscJobQueueReceiver>,
        job_queue: Arc<dyn JobQueue>,
        executor: Arc<dyn JobExecutor>,
        dead_letters: Arc<DeadLetterQueue>,
    ) -> Self {
        Self {
            job_receiver,
            job_queue,
            executor,
            dead_letters,
            worker_count: 3,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    pub fn dead_letters(&self) -> Arc<DeadLetterQueue> {
        self.dead_letters.clone()
    }

    pub async fn start(&self) {
        info!(workers = self.worker_count, "Starting background processor");

        let mut handles = Vec::new();
        for worker_id in 0..self.worker_count {
            let processor = self.clone_for_worker();
            handles.push(tokio::spawn(async move {
                processor.worker_loop(worker_id).await;
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker_id = i, error = %e, "Worker panicked");
            }
        }

        info!("Background processor stopped");
    }

    async fn worker_loop(&self, worker_id: usize) {
        info!(worker_id, "Worker started");

        while let Some(job) = self.job_receiver.recv().await {
            self.process_job(job).await;
        }

        info!(worker_id, "Worker stopped, queue closed");
    }

    pub async fn process_job(&self, job: Job) {
        let policy = self.executor.retry_policy(job.kind());
        let ctx = job.context(policy.max_attempts);
        let start_time = std::time::Instant::now();

        info!(
            job_id = %job.id(),
            kind = job.kind().name(),
            attempt = job.attempt(),
            max_attempts = policy.max_attempts,
            "Processing job"
        );

        let err = match self.executor.execute(&job, ctx).await {
            Ok(()) => {
                info!(
                    job_id = %job.id(),
                    kind = job.kind().name(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Job completed"
                );
                return;
            }
            Err(err) => err,
        };

        if !err.is_retriable() {
            self.dead_letters.push(job, err.to_string()).await;
            return;
        }
        if !policy.has_attempts_left(job.attempt()) {
            self.dead_letters
                .push(job, format!("Attempts exhausted: {}", err))
                .await;
            return;
        }

        let delay = policy.delay_after(job.attempt());
        let next = job.redelivery(err.to_string());
        warn!(
            job_id = %job.id(),
            kind = job.kind().name(),
            attempt = job.attempt(),
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Job failed, scheduling redelivery"
        );
        if let Err(e) = self.job_queue.enqueue_after(next, delay).await {
            self.dead_letters
                .push(job, format!("Redelivery failed: {} ({})", e, err))
                .await;
        }
    }

    fn clone_for_worker(&self) -> Self {
        Self {
            job_receiver: self.job_receiver.clone(),
            job_queue: self.job_queue.clone(),
            executor: self.executor.clone(),
            dead_letters: self.dead_letters.clone(),
            worker_count: self.worker_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use crate::application::services::RetryPolicy;
    use crate::application::workers::WorkerError;
    use crate::domain::entities::{JobContext, JobKind};
    use crate::domain::repositories::RepositoryError;
    use crate::infrastructure::messaging::MpscJobQueue;

    /// Fails with a scripted error until the script runs out.
    struct ScriptedExecutor {
        failures: StdMutex<VecDeque<WorkerError>>,
        contexts: StdMutex<Vec<JobContext>>,
        max_attempts: u32,
    }

    impl ScriptedExecutor {
        fn new(max_attempts: u32, failures: Vec<WorkerError>) -> Self {
            Self {
                failures: StdMutex::new(failures.into()),
                contexts: StdMutex::new(Vec::new()),
                max_attempts,
            }
        }

        fn contexts(&self) -> Vec<JobContext> {
            self.contexts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobExecutor for ScriptedExecutor {
        fn retry_policy(&self, _kind: &JobKind) -> RetryPolicy {
            RetryPolicy::fixed(self.max_attempts, Duration::from_millis(1))
        }

        async fn execute(&self, _job: &Job, ctx: JobContext) -> Result<(), WorkerError> {
            self.contexts.lock().unwrap().push(ctx);
            match self.failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn transient() -> WorkerError {
        WorkerError::Repository(RepositoryError::DatabaseError("pool timeout".to_string()))
    }

    fn harness(
        executor: Arc<ScriptedExecutor>,
    ) -> (BackgroundProcessor, Arc<MpscJobQueueReceiver>, Arc<MpscJobQueue>) {
        let (queue, receiver) = MpscJobQueue::create_pair();
        let queue = Arc::new(queue);
        let receiver = Arc::new(receiver);
        let processor = BackgroundProcessor::new(
            receiver.clone(),
            queue.clone(),
            executor,
            Arc::new(DeadLetterQueue::new()),
        );
        (processor, receiver, queue)
    }

    fn job() -> Job {
        Job::new(JobKind::CreateStore {
            store_id: uuid::Uuid::new_v4(),
            actor_id: None,
        })
    }

    #[tokio::test]
    async fn test_retriable_failure_is_redelivered_with_next_attempt() {
        let executor = Arc::new(ScriptedExecutor::new(3, vec![transient()]));
        let (processor, receiver, queue) = harness(executor.clone());

        processor.process_job(job()).await;
        let redelivered = receiver.recv().await.unwrap();
        assert_eq!(redelivered.attempt(), 2);
        assert_eq!(redelivered.last_error(), Some("Database error: pool timeout"));

        processor.process_job(redelivered).await;
        let attempts: Vec<u32> = executor.contexts().iter().map(|c| c.attempt).collect();
        assert_eq!(attempts, vec![1, 2]);
        assert!(processor.dead_letters().is_empty().await);
        assert_eq!(queue.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_attempts_are_capped() {
        let executor = Arc::new(ScriptedExecutor::new(2, vec![transient(), transient()]));
        let (processor, receiver, queue) = harness(executor.clone());

        processor.process_job(job()).await;
        let second = receiver.recv().await.unwrap();
        assert!(executor.contexts()[0].attempt == 1 && !executor.contexts()[0].is_final_attempt());

        processor.process_job(second).await;
        assert!(executor.contexts()[1].is_final_attempt());
        assert_eq!(queue.size().await.unwrap(), 0);

        let dead = processor.dead_letters().entries().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].job.attempt(), 2);
        assert!(dead[0].error.starts_with("Attempts exhausted"));
    }

    #[tokio::test]
    async fn test_terminal_failure_is_not_redelivered() {
        let executor = Arc::new(ScriptedExecutor::new(
            5,
            vec![WorkerError::InvalidResponse("missing documentName".to_string())],
        ));
        let (processor, _receiver, queue) = harness(executor);

        processor.process_job(job()).await;
        assert_eq!(queue.size().await.unwrap(), 0);
        assert_eq!(processor.dead_letters().len().await, 1);
    }

    #[tokio::test]
    async fn test_workers_drain_queue_until_closed() {
        let executor = Arc::new(ScriptedExecutor::new(1, vec![]));
        let (queue, receiver) = MpscJobQueue::create_pair();
        let (redeliveries, _unused) = MpscJobQueue::create_pair();
        let processor = BackgroundProcessor::new(
            Arc::new(receiver),
            Arc::new(redeliveries),
            executor.clone(),
            Arc::new(DeadLetterQueue::new()),
        )
        .with_worker_count(2);

        queue.enqueue(job()).await.unwrap();
        queue.enqueue(job()).await.unwrap();
        // Dropping the only sender closes the channel once the jobs are drained.
        drop(queue);
        processor.start().await;

        assert_eq!(executor.contexts().len(), 2);
    }
}
