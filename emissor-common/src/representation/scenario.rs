//! Scenario and modality types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Time span of a scenario or signal, in epoch milliseconds
///
/// `container_id` names the scenario the span belongs to. `end` stays unset
/// while the scenario or signal is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalRuler {
    pub container_id: String,
    pub start: i64,
    #[serde(default)]
    pub end: Option<i64>,
}

impl TemporalRuler {
    pub fn new(container_id: impl Into<String>, start: i64, end: Option<i64>) -> Self {
        Self {
            container_id: container_id.into(),
            start,
            end,
        }
    }
}

/// Signal modality
///
/// Video is part of the format but has no storage support in the data
/// service; video signals are rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
    Image,
    Video,
}

impl Modality {
    /// All modalities, in storage order
    pub const ALL: [Modality; 4] = [
        Modality::Text,
        Modality::Audio,
        Modality::Image,
        Modality::Video,
    ];

    /// Lowercase name, also used as the per-modality file stem on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Audio => "audio",
            Modality::Image => "image",
            Modality::Video => "video",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded recording session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    /// Free-form context, replaced wholesale by scenario updates
    #[serde(default)]
    pub context: Value,
    /// Modality name -> source locator of the initial signal files
    #[serde(default)]
    pub signals: BTreeMap<String, String>,
    pub ruler: TemporalRuler,
}

impl Scenario {
    /// Create a scenario whose ruler is contained in the scenario itself
    pub fn new_instance(
        id: impl Into<String>,
        start: i64,
        end: Option<i64>,
        context: impl Into<Value>,
        signals: BTreeMap<String, String>,
    ) -> Self {
        let id = id.into();
        Self {
            ruler: TemporalRuler::new(id.clone(), start, end),
            id,
            context: context.into(),
            signals,
        }
    }

    pub fn start(&self) -> i64 {
        self.ruler.start
    }

    pub fn end(&self) -> Option<i64> {
        self.ruler.end
    }
}
