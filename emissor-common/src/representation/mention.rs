//! Mentions and annotations
//!
//! A mention sits on a segment of some container: a signal, or a nested
//! container carried by an earlier mention's annotation. Containers are
//! flagged explicitly through [`Annotation::container`].

use super::signal::Segment;
use crate::time::now_millis;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Where the nested container of an annotation lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerScope {
    /// The annotation itself is the container (e.g. a token)
    Annotation,
    /// The annotation's value is the container
    Value,
}

/// Capability flag: the annotation hosts a container mentions can attach to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRef {
    pub id: String,
    pub scope: ContainerScope,
}

/// A typed value attached to a mention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerRef>,
}

impl Annotation {
    /// Plain (non-container) annotation
    pub fn new(
        kind: impl Into<String>,
        value: impl Into<Value>,
        source: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            source: source.into(),
            timestamp,
            container: None,
        }
    }

    /// Token annotation; the token is itself a container spanning its text
    pub fn token(text: &str) -> Self {
        let id = Uuid::new_v4().to_string();
        Self {
            kind: "Token".to_string(),
            value: json!({ "id": id, "value": text, "length": text.chars().count() }),
            source: String::new(),
            timestamp: now_millis(),
            container: Some(ContainerRef {
                id,
                scope: ContainerScope::Annotation,
            }),
        }
    }

    /// Mark the annotation's value as a container with the given id
    pub fn with_value_container(mut self, id: impl Into<String>) -> Self {
        self.container = Some(ContainerRef {
            id: id.into(),
            scope: ContainerScope::Value,
        });
        self
    }

    /// Id of the nested container, if this annotation hosts one
    pub fn nested_container_id(&self) -> Option<&str> {
        self.container.as_ref().map(|c| c.id.as_str())
    }

    /// Segment covering the nested container, for mentions on this annotation
    pub fn container_segment(&self) -> Option<Segment> {
        let container = self.container.as_ref()?;
        let bounds = self
            .value
            .get("length")
            .and_then(Value::as_i64)
            .map(|length| vec![0, length])
            .unwrap_or_default();
        Some(Segment::new(container.id.clone(), bounds))
    }
}

/// An annotation attached to a position within a signal or another annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    #[serde(default)]
    pub segment: Vec<Segment>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Mention {
    pub fn new(id: impl Into<String>, segment: Vec<Segment>, annotations: Vec<Annotation>) -> Self {
        Self {
            id: id.into(),
            segment,
            annotations,
        }
    }

    /// Id of the container the mention sits on (its first segment)
    pub fn container_id(&self) -> Option<&str> {
        self.segment.first().map(|s| s.container_id.as_str())
    }

    /// Ids of all nested containers carried by this mention's annotations
    pub fn nested_container_ids(&self) -> impl Iterator<Item = &str> {
        self.annotations
            .iter()
            .filter_map(Annotation::nested_container_id)
    }
}
