use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form key/value metadata attached to a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    properties: HashMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.properties.insert(key.into(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_property(key).and_then(|v| v.as_str())
    }

    pub fn properties(&self) -> &HashMap<String, serde_json::Value> {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn merge(&mut self, other: DocumentMetadata) {
        self.properties.extend(other.properties);
    }
}

impl From<HashMap<String, serde_json::Value>> for DocumentMetadata {
    fn from(properties: HashMap<String, serde_json::Value>) -> Self {
        Self { properties }
    }
}

impl From<DocumentMetadata> for serde_json::Value {
    fn from(metadata: DocumentMetadata) -> Self {
        serde_json::Value::Object(metadata.properties.into_iter().collect())
    }
}

impl TryFrom<serde_json::Value> for DocumentMetadata {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Object(map) => Ok(Self {
                properties: map.into_iter().collect(),
            }),
            serde_json::Value::Null => Ok(Self::default()),
            _ => Err("Metadata must be a JSON object".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion() {
        let metadata = DocumentMetadata::new()
            .with_property("source", json!("upload"))
            .with_property("pages", json!(12));

        let value: serde_json::Value = metadata.clone().into();
        let parsed = DocumentMetadata::try_from(value).unwrap();
        assert_eq!(parsed, metadata);
        assert_eq!(parsed.get_str("source"), Some("upload"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(DocumentMetadata::try_from(json!([1, 2])).is_err());
        assert!(DocumentMetadata::try_from(json!(null)).unwrap().is_empty());
    }

    #[test]
    fn test_merge_overwrites() {
        let mut a = DocumentMetadata::new().with_property("k", json!(1));
        a.merge(DocumentMetadata::new().with_property("k", json!(2)));
        assert_eq!(a.get_property("k"), Some(&json!(2)));
    }
}
