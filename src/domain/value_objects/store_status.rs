use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    #[default]
    Pending,
    Active,
    Failed,
    Deleted,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Pending => "pending",
            StoreStatus::Active => "active",
            StoreStatus::Failed => "failed",
            StoreStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StoreStatus::Pending),
            "active" => Ok(StoreStatus::Active),
            "failed" => Ok(StoreStatus::Failed),
            "deleted" => Ok(StoreStatus::Deleted),
            other => Err(format!("Invalid store status: {}", other)),
        }
    }

    pub fn can_transition_to(&self, next: StoreStatus) -> bool {
        match (self, next) {
            (StoreStatus::Pending, StoreStatus::Active) => true,
            (StoreStatus::Failed, StoreStatus::Active) => true,
            (StoreStatus::Pending, StoreStatus::Failed) => true,
            (StoreStatus::Active, StoreStatus::Failed) => true,
            (StoreStatus::Failed, StoreStatus::Failed) => true,
            (StoreStatus::Deleted, _) => false,
            (_, StoreStatus::Deleted) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
