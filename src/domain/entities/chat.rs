use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Owner;

pub const MAX_AUXILIARY_STORES: usize = 5;

/// A conversation grounded on one primary store plus a few shared stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    id: Uuid,
    owner: Owner,
    title: String,
    primary_store_id: Uuid,
    auxiliary_store_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(
        owner: Owner,
        title: String,
        primary_store_id: Uuid,
        auxiliary_store_ids: Vec<Uuid>,
    ) -> Result<Self, String> {
        let mut auxiliary = Vec::with_capacity(auxiliary_store_ids.len());
        for store_id in auxiliary_store_ids {
            if store_id != primary_store_id && !auxiliary.contains(&store_id) {
                auxiliary.push(store_id);
            }
        }

        if auxiliary.len() > MAX_AUXILIARY_STORES {
            return Err(format!(
                "A chat can bind at most {} auxiliary stores",
                MAX_AUXILIARY_STORES
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            title,
            primary_store_id,
            auxiliary_store_ids: auxiliary,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn from_database(
        id: Uuid,
        owner: Owner,
        title: String,
        primary_store_id: Uuid,
        auxiliary_store_ids: Vec<Uuid>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            title,
            primary_store_id,
            auxiliary_store_ids,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn primary_store_id(&self) -> Uuid {
        self.primary_store_id
    }

    pub fn auxiliary_store_ids(&self) -> &[Uuid] {
        &self.auxiliary_store_ids
    }

    /// Primary store first, then auxiliary stores in binding order.
    pub fn store_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(1 + self.auxiliary_store_ids.len());
        ids.push(self.primary_store_id);
        ids.extend_from_slice(&self.auxiliary_store_ids);
        ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
