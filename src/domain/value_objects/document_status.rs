use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Processing,
    Active,
    Failed,
    Deleted,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Active => "active",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DocumentStatus::Pending),
            "processing" => Ok(DocumentStatus::Processing),
            "active" => Ok(DocumentStatus::Active),
            "failed" => Ok(DocumentStatus::Failed),
            "deleted" => Ok(DocumentStatus::Deleted),
            other => Err(format!("Invalid document status: {}", other)),
        }
    }

    /// Failed documents stay claimable so a redelivered upload can start over.
    pub fn is_claimable(&self) -> bool {
        matches!(self, DocumentStatus::Pending | DocumentStatus::Failed)
    }

    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        match (self, next) {
            (DocumentStatus::Pending, DocumentStatus::Processing) => true,
            (DocumentStatus::Failed, DocumentStatus::Processing) => true,
            (DocumentStatus::Processing, DocumentStatus::Active) => true,
            (DocumentStatus::Processing, DocumentStatus::Failed) => true,
            (DocumentStatus::Deleted, _) => false,
            (_, DocumentStatus::Deleted) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(DocumentStatus::Pending.can_transition_to(DocumentStatus::Processing));
        assert!(DocumentStatus::Failed.can_transition_to(DocumentStatus::Processing));
        assert!(DocumentStatus::Processing.can_transition_to(DocumentStatus::Active));
        assert!(DocumentStatus::Processing.can_transition_to(DocumentStatus::Failed));
        assert!(DocumentStatus::Active.can_transition_to(DocumentStatus::Deleted));

        assert!(!DocumentStatus::Active.can_transition_to(DocumentStatus::Processing));
        assert!(!DocumentStatus::Pending.can_transition_to(DocumentStatus::Active));
        assert!(!DocumentStatus::Deleted.can_transition_to(DocumentStatus::Pending));
    }

    #[test]
    fn test_claimable() {
        assert!(DocumentStatus::Pending.is_claimable());
        assert!(DocumentStatus::Failed.is_claimable());
        assert!(!DocumentStatus::Processing.is_claimable());
        assert!(!DocumentStatus::Active.is_claimable());
    }
}
