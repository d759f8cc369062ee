use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobKind {
    CreateStore {
        store_id: Uuid,
        actor_id: Option<Uuid>,
    },
    DeleteStore {
        store_id: Uuid,
        actor_id: Option<Uuid>,
    },
    UploadDocument {
        document_id: Uuid,
    },
    DeleteDocument {
        document_id: Uuid,
        remote_path: Option<String>,
    },
    ProcessChatTurn {
        message_id: Uuid,
    },
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::CreateStore { .. } => "create_store",
            JobKind::DeleteStore { .. } => "delete_store",
            JobKind::UploadDocument { .. } => "upload_document",
            JobKind::DeleteDocument { .. } => "delete_document",
            JobKind::ProcessChatTurn { .. } => "process_chat_turn",
        }
    }

    /// Id of the entity the job operates on.
    pub fn subject_id(&self) -> Uuid {
        match self {
            JobKind::CreateStore { store_id, .. } | JobKind::DeleteStore { store_id, .. } => {
                *store_id
            }
            JobKind::UploadDocument { document_id }
            | JobKind::DeleteDocument { document_id, .. } => *document_id,
            JobKind::ProcessChatTurn { message_id } => *message_id,
        }
    }
}

/// A unit of background work plus its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: Uuid,
    kind: JobKind,
    attempt: u32,
    enqueued_at: DateTime<Utc>,
    last_error: Option<String>,
}

impl Job {
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            attempt: 1,
            enqueued_at: Utc::now(),
            last_error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &JobKind {
        &self.kind
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The same job, scheduled for its next delivery.
    pub fn redelivery(&self, error: String) -> Self {
        Self {
            id: self.id,
            kind: self.kind.clone(),
            attempt: self.attempt + 1,
            enqueued_at: Utc::now(),
            last_error: Some(error),
        }
    }

    pub fn context(&self, max_attempts: u32) -> JobContext {
        JobContext {
            job_id: self.id,
            attempt: self.attempt,
            max_attempts,
        }
    }
}

/// Delivery information handed to job handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobContext {
    pub job_id: Uuid,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl JobContext {
    pub fn single_attempt() -> Self {
        Self {
            job_id: Uuid::new_v4(),
            attempt: 1,
            max_attempts: 1,
        }
    }

    pub fn is_final_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    pub fn is_redelivery(&self) -> bool {
        self.attempt > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redelivery_keeps_identity() {
        let job = Job::new(JobKind::UploadDocument {
            document_id: Uuid::new_v4(),
        });
        let next = job.redelivery("timeout".to_string());

        assert_eq!(next.id(), job.id());
        assert_eq!(next.attempt(), 2);
        assert_eq!(next.last_error(), Some("timeout"));
        assert_eq!(next.kind(), job.kind());
    }

    #[test]
    fn test_context_final_attempt() {
        let mut job = Job::new(JobKind::ProcessChatTurn {
            message_id: Uuid::new_v4(),
        });
        assert!(!job.context(3).is_final_attempt());
        assert!(!job.context(3).is_redelivery());

        job = job.redelivery("e".to_string()).redelivery("e".to_string());
        let ctx = job.context(3);
        assert!(ctx.is_final_attempt());
        assert!(ctx.is_redelivery());
    }

    #[test]
    fn test_job_kind_serialization() {
        let kind = JobKind::DeleteDocument {
            document_id: Uuid::nil(),
            remote_path: Some("fileSearchStores/a/documents/b".to_string()),
        };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(value["type"], "delete_document");
        assert_eq!(kind.name(), "delete_document");
    }
}
