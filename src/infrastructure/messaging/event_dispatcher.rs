use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::ports::broadcaster::{Broadcaster, UserNotification};
use crate::application::ports::event_bus::{EventBus, EventBusError};
use crate::application::ports::JobQueue;
use crate::domain::entities::{Job, JobKind};
use crate::domain::DomainEvent;

/// Routes domain events: requests become queued jobs, store outcomes are
/// pushed to the acting user's notification channel.
pub struct EventDispatcher {
    job_queue: Arc<dyn JobQueue>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl EventDispatcher {
    pub fn new(job_queue: Arc<dyn JobQueue>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            job_queue,
            broadcaster,
        }
    }

    fn job_for(event: &DomainEvent) -> Option<JobKind> {
        match event {
            DomainEvent::StoreCreationRequested { store_id, actor_id } => {
                Some(JobKind::CreateStore {
                    store_id: *store_id,
                    actor_id: *actor_id,
                })
            }
            DomainEvent::StoreDeletionRequested { store_id, actor_id } => {
                Some(JobKind::DeleteStore {
                    store_id: *store_id,
                    actor_id: *actor_id,
                })
            }
            DomainEvent::DocumentUploadRequested { document_id } => {
                Some(JobKind::UploadDocument {
                    document_id: *document_id,
                })
            }
            DomainEvent::DocumentDeletionRequested {
                document_id,
                remote_path,
            } => Some(JobKind::DeleteDocument {
                document_id: *document_id,
                remote_path: remote_path.clone(),
            }),
            _ => None,
        }
    }

    fn notification_for(event: &DomainEvent) -> Option<UserNotification> {
        let user_id = event.actor_id()?;
        let (subject_id, message) = match event {
            DomainEvent::StoreCreated {
                store_id,
                remote_name,
                ..
            } => (*store_id, format!("Store is ready ({})", remote_name)),
            DomainEvent::StoreCreationFailed {
                store_id,
                error_message,
                ..
            } => (*store_id, error_message.clone()),
            DomainEvent::StoreDeleted { store_id, .. } => {
                (*store_id, "Store deleted".to_string())
            }
            DomainEvent::StoreDeletionFailed {
                store_id,
                error_message,
                ..
            } => (*store_id, error_message.clone()),
            _ => return None,
        };

        Some(UserNotification {
            user_id,
            event: event.name().to_string(),
            subject_id,
            message,
        })
    }
}

#[async_trait]
impl EventBus for EventDispatcher {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        if let Some(kind) = Self::job_for(&event) {
            let job = Job::new(kind);
            info!(event = event.name(), job_id = %job.id(), "Queueing job for event");
            return self
                .job_queue
                .enqueue(job)
                .await
                .map_err(|e| EventBusError::DispatchFailed(e.to_string()));
        }

        match Self::notification_for(&event) {
            Some(notification) => self.broadcaster.notify_user(notification),
            None => debug!(event = event.name(), "Event has no subscriber"),
        }
        Ok(())
    }
}
