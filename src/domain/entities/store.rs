use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Owner, StoreStatus};

/// Local record of a remote vector-search collection.
///
/// The remote name is assigned when the creation job succeeds and is kept
/// after deletion for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    id: Uuid,
    owner: Owner,
    display_name: String,
    remote_name: Option<String>,
    status: StoreStatus,
    error_message: Option<String>,
    size_bytes: i64,
    active_document_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Store {
    pub fn new(owner: Owner, display_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            display_name,
            remote_name: None,
            status: StoreStatus::Pending,
            error_message: None,
            size_bytes: 0,
            active_document_count: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Rebuild a store from persisted values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        owner: Owner,
        display_name: String,
        remote_name: Option<String>,
        status: StoreStatus,
        error_message: Option<String>,
        size_bytes: i64,
        active_document_count: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            owner,
            display_name,
            remote_name,
            status,
            error_message,
            size_bytes,
            active_document_count,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn remote_name(&self) -> Option<&str> {
        self.remote_name.as_deref()
    }

    pub fn status(&self) -> StoreStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn size_bytes(&self) -> i64 {
        self.size_bytes
    }

    pub fn active_document_count(&self) -> i32 {
        self.active_document_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_active(&self) -> bool {
        self.status == StoreStatus::Active
    }

    pub fn is_deleted(&self) -> bool {
        self.status == StoreStatus::Deleted
    }

    pub fn activate(&mut self, remote_name: String) -> Result<(), String> {
        self.transition(StoreStatus::Active)?;
        self.remote_name = Some(remote_name);
        self.error_message = None;
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), String> {
        self.transition(StoreStatus::Failed)?;
        self.error_message = Some(error);
        Ok(())
    }

    pub fn mark_deleted(&mut self) -> Result<(), String> {
        self.transition(StoreStatus::Deleted)?;
        self.deleted_at = Some(self.updated_at);
        Ok(())
    }

    pub fn has_capacity_for(&self, bytes: i64, capacity_bytes: i64) -> bool {
        self.size_bytes + bytes <= capacity_bytes
    }

    /// Apply a usage delta. Both counters saturate at zero.
    pub fn adjust_usage(&mut self, size_delta: i64, active_count_delta: i32) {
        self.size_bytes = (self.size_bytes + size_delta).max(0);
        self.active_document_count = (self.active_document_count + active_count_delta).max(0);
        self.updated_at = Utc::now();
    }

    fn transition(&mut self, next: StoreStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Store {} cannot move from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
