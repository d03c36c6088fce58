//! Ingestion engine
//!
//! [`EmissorDataStore`] applies scenario, signal and mention events to the
//! open [`ScenarioSession`], materializes media of finalized signals and
//! persists the document according to the [`FlushPolicy`].
//!
//! Inputs are expected one at a time; the service serializes them behind a
//! single lock together with the flush ticks.

use crate::error::{DataError, DataResult};
use crate::flush::{FlushPolicy, FlushScheduler};
use crate::media::{materialize_files, LocalMediaSource, MediaSource};
use crate::rdf::RdfArchiver;
use crate::session::ScenarioSession;
use crate::storage::{FileScenarioStore, ScenarioStore};
use emissor_common::config::{MediaConfig, StorageConfig};
use emissor_common::events::{EmissorEvent, ProcessorInput};
use emissor_common::time::now_millis;
use emissor_common::{Mention, Modality, Scenario, Signal};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct EmissorDataStore {
    store: Arc<dyn ScenarioStore>,
    media: Arc<dyn MediaSource>,
    session: ScenarioSession,
    scheduler: FlushScheduler,
    rdf: Option<RdfArchiver>,
}

impl EmissorDataStore {
    pub fn new(store: Arc<dyn ScenarioStore>, media: Arc<dyn MediaSource>, policy: FlushPolicy) -> Self {
        Self {
            store,
            media,
            session: ScenarioSession::new(),
            scheduler: FlushScheduler::new(policy),
            rdf: None,
        }
    }

    /// Archive brain logs into each scenario when it stops
    pub fn with_rdf_archiver(mut self, archiver: RdfArchiver) -> Self {
        self.rdf = Some(archiver);
        self
    }

    /// File backed engine for the configured storage and media roots
    pub fn from_config(storage: &StorageConfig, media: &MediaConfig) -> DataResult<Self> {
        let store = FileScenarioStore::open(&storage.path)?;
        let media_root = media
            .source_root
            .clone()
            .unwrap_or_else(|| storage.path.join(".."));
        let policy = FlushPolicy::from_settings(storage.immediate_flush, storage.flush_interval_ms);

        info!(
            "Emissor storage at {}, media from {}, flush policy {:?}",
            storage.path.display(),
            media_root.display(),
            policy
        );

        Ok(Self::new(
            Arc::new(store),
            Arc::new(LocalMediaSource::new(media_root)),
            policy,
        )
        .with_rdf_archiver(RdfArchiver::new(storage.rdf_source())))
    }

    pub fn session(&self) -> &ScenarioSession {
        &self.session
    }

    pub fn store(&self) -> &dyn ScenarioStore {
        self.store.as_ref()
    }

    pub fn flush_policy(&self) -> FlushPolicy {
        self.scheduler.policy()
    }

    /// Apply one input, then flush if the policy says so
    ///
    /// An error of the input is returned after the flush check, so partial
    /// progress (e.g. the mentions of a batch before a failing one) is still
    /// persisted on schedule.
    pub fn process(&mut self, input: ProcessorInput) -> DataResult<()> {
        let applied = match input {
            ProcessorInput::Event(event) => self.apply(event),
            ProcessorInput::Tick => Ok(()),
        };
        let flushed = self.flush_if_due();

        applied.and(flushed.map(|_| ()))
    }

    fn apply(&mut self, event: EmissorEvent) -> DataResult<()> {
        match event {
            EmissorEvent::ScenarioStarted { scenario } => self.start_scenario(scenario),
            EmissorEvent::ScenarioUpdated { scenario } => self.update_scenario(scenario),
            EmissorEvent::ScenarioStopped { scenario } => self.stop_scenario(scenario),
            EmissorEvent::SignalEvent { signal } => self.add_signal(signal),
            EmissorEvent::AnnotationEvent { mentions } => self.add_mentions(mentions),
        }
    }

    pub fn start_scenario(&mut self, scenario: Scenario) -> DataResult<()> {
        self.session.open(scenario, self.store.as_ref())?;
        self.scheduler.record_flush(Instant::now());
        Ok(())
    }

    /// Replace the context of the open scenario
    pub fn update_scenario(&mut self, scenario: Scenario) -> DataResult<()> {
        self.session.update_context(&scenario.id, scenario.context)
    }

    /// Seal the open scenario and archive its brain logs
    ///
    /// A stop event without end time is sealed at the current time.
    pub fn stop_scenario(&mut self, scenario: Scenario) -> DataResult<()> {
        let end = scenario.end().unwrap_or_else(now_millis);
        let closed = self.session.close(&scenario.id, end, self.store.as_ref())?;
        self.scheduler.record_flush(Instant::now());

        if let Some(rdf) = &self.rdf {
            let scenario_dir = self.store.scenario_path(&closed.id);
            if let Err(e) = rdf.archive(&closed, &scenario_dir) {
                error!("Failed to archive rdf logs for scenario {}: {}", closed.id, e);
            }
        }

        Ok(())
    }

    /// Add a new signal or merge an update into a known one
    pub fn add_signal(&mut self, signal: Signal) -> DataResult<()> {
        let Some(scenario_id) = self.session.current_id().map(str::to_string) else {
            warn!(
                "Skipping signal {} for stopped scenario {}",
                signal.id,
                signal.scenario_id()
            );
            return Ok(());
        };

        if signal.scenario_id() != scenario_id {
            return Err(DataError::ScenarioMismatch {
                signal_scenario: signal.scenario_id().to_string(),
                signal_id: signal.id,
                current: scenario_id,
            });
        }

        let signal = canonical_copy(&signal).map_err(|e| {
            error!("Serialization failed for signal {}: {}", signal.id, e);
            e
        })?;

        let files = match signal.modality {
            Modality::Video => {
                error!(
                    "Skip signal {} with unsupported modality {}",
                    signal.id, signal.modality
                );
                return Ok(());
            }
            _ if !signal.is_finalized() => None,
            Modality::Text => Some(Vec::new()),
            Modality::Audio | Modality::Image => {
                let scenario_dir = self.store.scenario_path(&scenario_id);
                Some(materialize_files(self.media.as_ref(), &signal, &scenario_dir))
            }
        };

        let signal_id = signal.id.clone();
        let element_ids = match self.session.signal_mut(&signal_id) {
            Some(existing) => {
                debug!("Merging update into signal {}", signal_id);
                merge_signal(existing, signal, files)
            }
            None => {
                let mut signal = signal;
                signal.files = files.unwrap_or_default();
                let ids: Vec<String> = signal.mentions.iter().flat_map(element_ids).collect();
                self.session.insert_signal(signal)?;
                debug!("Added signal {} to scenario {}", signal_id, scenario_id);
                ids
            }
        };

        for id in element_ids {
            self.session.register(id, signal_id.clone());
        }
        self.session.mark_dirty();
        Ok(())
    }

    pub fn add_mention(&mut self, mention: Mention) -> DataResult<()> {
        self.add_mentions(vec![mention])
    }

    /// Attach a batch of mentions in order
    ///
    /// The first mention that does not resolve aborts the rest of the batch;
    /// the mentions before it stay attached.
    pub fn add_mentions(&mut self, mentions: Vec<Mention>) -> DataResult<()> {
        let Some(scenario_id) = self.session.current_id().map(str::to_string) else {
            warn!(
                "Skipping {} mentions for stopped scenario",
                mentions.len()
            );
            return Ok(());
        };

        for mention in mentions {
            self.attach_mention(&scenario_id, mention)?;
        }

        Ok(())
    }

    fn attach_mention(&mut self, scenario_id: &str, mention: Mention) -> DataResult<()> {
        let owner = mention
            .container_id()
            .and_then(|container_id| self.session.resolve_owner(container_id))
            .map(str::to_string);

        let Some(owner) = owner else {
            return Err(DataError::UnknownContainer {
                container_id: mention.container_id().unwrap_or_default().to_string(),
                scenario_id: scenario_id.to_string(),
                mention_id: mention.id,
            });
        };

        let ids: Vec<String> = element_ids(&mention).collect();
        self.session.push_mention(&owner, mention)?;
        for id in ids {
            debug!("Indexed element {} on signal {}", id, owner);
            self.session.register(id, owner.clone());
        }

        Ok(())
    }

    /// Persist the open scenario if it has unsaved changes
    pub fn flush(&mut self) -> DataResult<bool> {
        let flushed = self.session.flush(self.store.as_ref())?;
        if flushed {
            self.scheduler.record_flush(Instant::now());
        }
        Ok(flushed)
    }

    fn flush_if_due(&mut self) -> DataResult<bool> {
        if self.scheduler.due(self.session.is_dirty(), Instant::now()) {
            self.flush()
        } else {
            Ok(false)
        }
    }

    pub fn get_signal(&self, signal_id: &str) -> Option<&Signal> {
        self.session.signal(signal_id)
    }
}

/// Deep copy through the wire format
fn canonical_copy(signal: &Signal) -> DataResult<Signal> {
    Ok(serde_json::from_value(serde_json::to_value(signal)?)?)
}

/// Ids a mention makes resolvable: its own and its nested containers'
fn element_ids(mention: &Mention) -> impl Iterator<Item = String> + '_ {
    std::iter::once(mention.id.as_str())
        .chain(mention.nested_container_ids())
        .map(str::to_string)
}

/// Merge an update for a known signal into the stored one
///
/// `end`, `ruler` bounds and `text` are overwritten when present on the
/// update, `files` when given. Identity fields are kept. Mentions are
/// unioned by id in arrival order; returns the element ids of the mentions
/// that were new.
fn merge_signal(existing: &mut Signal, update: Signal, files: Option<Vec<String>>) -> Vec<String> {
    if let Some(end) = update.time.end {
        existing.time.end = Some(end);
    }
    if let Some(files) = files {
        existing.files = files;
    }
    if !update.ruler.bounds.is_empty() {
        existing.ruler.bounds = update.ruler.bounds;
    }
    if update.text.is_some() {
        existing.text = update.text;
    }

    let mut added = Vec::new();
    for mention in update.mentions {
        if existing.mentions.iter().any(|m| m.id == mention.id) {
            continue;
        }
        added.extend(element_ids(&mention));
        existing.mentions.push(mention);
    }

    added
}
