//! Signals and the segments that address positions inside them

use super::mention::Mention;
use super::scenario::{Modality, TemporalRuler};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A region on a container (signal, mention annotation, ...)
///
/// `bounds` follow the emissor ruler conventions: audio
/// `[start_sample, 0, end_sample, channels]`, image `[x0, y0, x1, y1]`,
/// text `[start, end]`. Atomic segments have no bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub container_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounds: Vec<i64>,
}

impl Segment {
    pub fn new(container_id: impl Into<String>, bounds: Vec<i64>) -> Self {
        Self {
            container_id: container_id.into(),
            bounds,
        }
    }

    /// Segment covering a whole container
    pub fn atomic(container_id: impl Into<String>) -> Self {
        Self::new(container_id, Vec::new())
    }

    /// Rectangular sub-area on the same container
    pub fn bounding_box(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self::new(self.container_id.clone(), vec![x0, y0, x1, y1])
    }

    /// First and third bound, i.e. the sample range of an audio ruler
    pub fn span(&self) -> Option<(i64, i64)> {
        match self.bounds.as_slice() {
            [start, _, end, ..] => Some((*start, *end)),
            _ => None,
        }
    }
}

/// A timestamped unit of sensory data within a scenario
///
/// A signal usually arrives twice: first open (`time.end` unset) and later
/// finalized with the same id, `time.end` set and its files ready to store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub modality: Modality,
    /// Scenario-relative time span; `container_id` is the scenario id
    pub time: TemporalRuler,
    /// The signal's own ruler; `container_id` is the signal id
    pub ruler: Segment,
    /// Source locators on arrival, stored relative paths once persisted
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Signal {
    /// Create a signal with a fresh id for the given scenario
    pub fn for_scenario(
        scenario_id: impl Into<String>,
        start: i64,
        end: Option<i64>,
        modality: Modality,
        bounds: Vec<i64>,
        files: Vec<String>,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        Self {
            ruler: Segment::new(id.clone(), bounds),
            id,
            modality,
            time: TemporalRuler::new(scenario_id, start, end),
            files,
            mentions: Vec::new(),
            text: None,
        }
    }

    /// Text signal; the ruler spans the characters of `text`
    pub fn text_for_scenario(
        scenario_id: impl Into<String>,
        start: i64,
        end: Option<i64>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let length = text.chars().count() as i64;
        let mut signal = Self::for_scenario(
            scenario_id,
            start,
            end,
            Modality::Text,
            vec![0, length],
            Vec::new(),
        );
        signal.text = Some(text);
        signal
    }

    /// Audio signal of `length` samples on `channels` channels
    ///
    /// An empty `file` means no source locator is attached yet.
    pub fn audio_for_scenario(
        scenario_id: impl Into<String>,
        start: i64,
        end: Option<i64>,
        file: &str,
        length: i64,
        channels: i64,
    ) -> Self {
        Self::for_scenario(
            scenario_id,
            start,
            end,
            Modality::Audio,
            vec![0, 0, length, channels],
            locators(file),
        )
    }

    /// Image signal covering `bounds` (`[x0, y0, x1, y1]`)
    pub fn image_for_scenario(
        scenario_id: impl Into<String>,
        start: i64,
        end: Option<i64>,
        file: &str,
        bounds: [i64; 4],
    ) -> Self {
        Self::for_scenario(
            scenario_id,
            start,
            end,
            Modality::Image,
            bounds.to_vec(),
            locators(file),
        )
    }

    /// Re-key the signal, e.g. to build the finalizing event for an open signal
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.ruler.container_id = id.clone();
        self.id = id;
        self
    }

    /// Id of the scenario this signal belongs to
    pub fn scenario_id(&self) -> &str {
        &self.time.container_id
    }

    /// True once the end of the signal is known
    pub fn is_finalized(&self) -> bool {
        self.time.end.is_some()
    }
}

fn locators(file: &str) -> Vec<String> {
    if file.is_empty() {
        Vec::new()
    } else {
        vec![file.to_string()]
    }
}
