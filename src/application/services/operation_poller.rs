use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::RemoteStoreClient;
use crate::application::ports::remote_store::{
    OperationHandle, RemoteOperationError, RemoteStoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollError {
    Timeout {
        handle: OperationHandle,
        attempts: u32,
    },
    Remote(RemoteOperationError),
    Api(RemoteStoreError),
}

impl PollError {
    pub fn is_retriable(&self) -> bool {
        match self {
            PollError::Timeout { .. } | PollError::Remote(_) => true,
            PollError::Api(e) => e.is_retriable(),
        }
    }
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::Timeout { handle, attempts } => write!(
                f,
                "Operation {} did not complete after {} checks",
                handle, attempts
            ),
            PollError::Remote(e) => write!(f, "{}", e),
            PollError::Api(e) => write!(f, "Failed to check operation: {}", e),
        }
    }
}

impl std::error::Error for PollError {}

impl From<RemoteStoreError> for PollError {
    fn from(err: RemoteStoreError) -> Self {
        PollError::Api(err)
    }
}

/// Waits for a remote long-running operation to settle.
pub struct OperationPoller {
    client: Arc<dyn RemoteStoreClient>,
    config: PollerConfig,
}

impl OperationPoller {
    pub fn new(client: Arc<dyn RemoteStoreClient>, config: PollerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Checks the operation up to `max_attempts` times, sleeping `interval`
    /// between checks. Returns the response payload of a successful operation
    /// (an empty object when the service sent none).
    pub async fn poll_until_complete(
        &self,
        handle: &OperationHandle,
    ) -> Result<serde_json::Value, PollError> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let status = self.client.get_operation(handle).await?;

            if let Some(error) = status.error {
                warn!(operation = %handle, attempt, error = %error, "Remote operation failed");
                return Err(PollError::Remote(error));
            }

            if status.done {
                debug!(operation = %handle, attempt, "Remote operation completed");
                return Ok(status
                    .result
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())));
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        warn!(operation = %handle, attempts = max_attempts, "Remote operation timed out");
        Err(PollError::Timeout {
            handle: handle.clone(),
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::remote_store::OperationStatus;
    use crate::test_support::{FakeRemoteStore, RemoteCall, api_error, pending_operation};
    use std::time::Instant;

    fn poller(fake: Arc<FakeRemoteStore>, max_attempts: u32, interval_ms: u64) -> OperationPoller {
        OperationPoller::new(
            fake,
            PollerConfig {
                max_attempts,
                interval: Duration::from_millis(interval_ms),
            },
        )
    }

    fn polls(fake: &FakeRemoteStore) -> usize {
        fake.count(|c| matches!(c, RemoteCall::GetOperation(_)))
    }

    #[tokio::test]
    async fn test_returns_result_when_done() {
        let fake = Arc::new(FakeRemoteStore::new());
        fake.push_operation(Ok(pending_operation()));
        fake.push_operation(Ok(OperationStatus {
            done: true,
            error: None,
            result: Some(serde_json::json!({"documentName": "fileSearchStores/s/documents/d"})),
        }));

        let result = poller(fake.clone(), 5, 1)
            .poll_until_complete(&OperationHandle("op".to_string()))
            .await
            .unwrap();

        assert_eq!(result["documentName"], "fileSearchStores/s/documents/d");
        assert_eq!(polls(&fake), 2);
    }

    #[tokio::test]
    async fn test_remote_error_returns_immediately() {
        let fake = Arc::new(FakeRemoteStore::new());
        fake.push_operation(Ok(OperationStatus {
            done: false,
            error: Some(RemoteOperationError {
                code: Some(3),
                message: "unsupported file".to_string(),
            }),
            result: None,
        }));

        let err = poller(fake.clone(), 5, 1)
            .poll_until_complete(&OperationHandle("op".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Remote(ref e) if e.message == "unsupported file"));
        assert_eq!(polls(&fake), 1);
    }

    #[tokio::test]
    async fn test_times_out_after_exactly_max_attempts() {
        let fake = Arc::new(FakeRemoteStore::new());

        let started = Instant::now();
        let err = poller(fake.clone(), 3, 20)
            .poll_until_complete(&OperationHandle("op".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PollError::Timeout {
                handle: OperationHandle("op".to_string()),
                attempts: 3
            }
        );
        assert_eq!(polls(&fake), 3);
        // Two sleeps between three checks, none after the last.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(40));
        assert!(elapsed < Duration::from_millis(60 + 500));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried_in_loop() {
        let fake = Arc::new(FakeRemoteStore::new());
        fake.push_operation(Err(api_error(503)));

        let err = poller(fake.clone(), 5, 1)
            .poll_until_complete(&OperationHandle("op".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Api(_)));
        assert!(err.is_retriable());
        assert_eq!(polls(&fake), 1);
    }

    #[tokio::test]
    async fn test_done_without_payload_yields_empty_object() {
        let fake = Arc::new(FakeRemoteStore::new());
        fake.push_operation(Ok(OperationStatus {
            done: true,
            error: None,
            result: None,
        }));

        let result = poller(fake, 1, 1)
            .poll_until_complete(&OperationHandle("op".to_string()))
            .await
            .unwrap();

        assert!(result.as_object().is_some_and(|o| o.is_empty()));
    }
}
