use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How strongly a citation's evidence supports the answer, for display grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStrength {
    Strong,
    Supporting,
    Unscored,
}

impl EvidenceStrength {
    pub fn classify(confidence: Option<f64>, high_confidence: f64) -> Self {
        match confidence {
            Some(score) if score >= high_confidence => EvidenceStrength::Strong,
            Some(_) => EvidenceStrength::Supporting,
            None => EvidenceStrength::Unscored,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceStrength::Strong => "strong",
            EvidenceStrength::Supporting => "supporting",
            EvidenceStrength::Unscored => "unscored",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "strong" => Ok(EvidenceStrength::Strong),
            "supporting" => Ok(EvidenceStrength::Supporting),
            "unscored" => Ok(EvidenceStrength::Unscored),
            other => Err(format!("Invalid evidence strength: {}", other)),
        }
    }
}

/// Consolidated evidence linking one assistant message to one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    id: Uuid,
    message_id: Uuid,
    document_id: Uuid,
    pages: Vec<i32>,
    snippet: Option<String>,
    confidence: Option<f64>,
    strength: EvidenceStrength,
    created_at: DateTime<Utc>,
}

impl Citation {
    pub fn new(
        message_id: Uuid,
        document_id: Uuid,
        mut pages: Vec<i32>,
        snippet: Option<String>,
        confidence: Option<f64>,
        strength: EvidenceStrength,
    ) -> Self {
        pages.sort_unstable();
        pages.dedup();
        Self {
            id: Uuid::new_v4(),
            message_id,
            document_id,
            pages,
            snippet,
            confidence: confidence.map(|c| c.clamp(0.0, 1.0)),
            strength,
            created_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        message_id: Uuid,
        document_id: Uuid,
        pages: Vec<i32>,
        snippet: Option<String>,
        confidence: Option<f64>,
        strength: EvidenceStrength,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            message_id,
            document_id,
            pages,
            snippet,
            confidence,
            strength,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn pages(&self) -> &[i32] {
        &self.pages
    }

    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn strength(&self) -> EvidenceStrength {
        self.strength
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
