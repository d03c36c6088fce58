//! Scenario session: the state of the currently open scenario
//!
//! A session is either Closed (no document) or Open (one scenario document,
//! its signal table and the element index). Opening clears any state left
//! from a previous scenario, so ids never leak across scenarios.

use crate::error::{DataError, DataResult};
use crate::index::ElementIndex;
use crate::storage::{ScenarioDocument, ScenarioStore};
use emissor_common::{Mention, Scenario, Signal};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ScenarioSession {
    document: Option<ScenarioDocument>,
    /// Signal id -> position in the document's append log
    signals: HashMap<String, usize>,
    index: ElementIndex,
    dirty: bool,
}

impl ScenarioSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `scenario` and persist its initial document
    ///
    /// Fails if any scenario is open, including one with the same id.
    pub fn open(&mut self, scenario: Scenario, store: &dyn ScenarioStore) -> DataResult<()> {
        if let Some(current) = self.current_id() {
            return Err(DataError::AlreadyOpen {
                current: current.to_string(),
                requested: scenario.id,
            });
        }

        self.signals.clear();
        self.index.clear();

        let scenario_id = scenario.id.clone();
        let document = store.create_document(scenario)?;
        store.save_document(&document)?;

        self.document = Some(document);
        self.dirty = false;
        info!("Started scenario {}", scenario_id);
        Ok(())
    }

    /// Replace the context of the open scenario
    pub fn update_context(&mut self, scenario_id: &str, context: Value) -> DataResult<()> {
        let document = self.open_document_mut(scenario_id)?;
        document.scenario.context = context;
        self.dirty = true;
        debug!("Updated context of scenario {}", scenario_id);
        Ok(())
    }

    /// Seal the open scenario with `end`, persist it and close the session
    ///
    /// Returns the sealed scenario.
    pub fn close(
        &mut self,
        scenario_id: &str,
        end: i64,
        store: &dyn ScenarioStore,
    ) -> DataResult<Scenario> {
        let document = self.open_document_mut(scenario_id)?;
        document.scenario.ruler.end = Some(end);
        self.dirty = true;
        self.flush(store)?;

        let scenario = self
            .document
            .take()
            .map(|document| document.scenario)
            .ok_or_else(|| DataError::Internal(format!("Scenario {} vanished on close", scenario_id)))?;

        self.signals.clear();
        self.index.clear();
        self.dirty = false;
        info!("Stopped scenario {}", scenario_id);
        Ok(scenario)
    }

    /// Id of the open scenario, if any
    pub fn current_id(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.scenario.id.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    pub fn scenario(&self) -> Option<&Scenario> {
        self.document.as_ref().map(|d| &d.scenario)
    }

    pub fn signal(&self, signal_id: &str) -> Option<&Signal> {
        let position = *self.signals.get(signal_id)?;
        self.document.as_ref()?.signal(position)
    }

    pub fn signal_mut(&mut self, signal_id: &str) -> Option<&mut Signal> {
        let position = *self.signals.get(signal_id)?;
        self.document.as_mut()?.signal_mut(position)
    }

    /// Append a new signal to the open document
    pub fn insert_signal(&mut self, signal: Signal) -> DataResult<()> {
        let document = self
            .document
            .as_mut()
            .ok_or_else(|| DataError::Internal(format!("No open scenario for signal {}", signal.id)))?;

        let signal_id = signal.id.clone();
        let position = document.append_signal(signal);
        self.signals.insert(signal_id, position);
        self.dirty = true;
        Ok(())
    }

    /// Owning signal of `element_id`: a signal id directly, else the index
    pub fn resolve_owner(&self, element_id: &str) -> Option<&str> {
        if let Some((id, _)) = self.signals.get_key_value(element_id) {
            return Some(id.as_str());
        }
        self.index.resolve(element_id)
    }

    /// Register an element id against its owning signal
    pub fn register(&mut self, element_id: impl Into<String>, owner_signal_id: impl Into<String>) {
        self.index.register(element_id, owner_signal_id);
    }

    /// Append `mention` to the signal `owner_signal_id`
    pub fn push_mention(&mut self, owner_signal_id: &str, mention: Mention) -> DataResult<()> {
        let signal = self.signal_mut(owner_signal_id).ok_or_else(|| {
            DataError::Internal(format!("Indexed signal {} is not in the table", owner_signal_id))
        })?;
        signal.mentions.push(mention);
        self.dirty = true;
        Ok(())
    }

    pub fn index(&self) -> &ElementIndex {
        &self.index
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist the document if open and dirty; returns whether it wrote
    pub fn flush(&mut self, store: &dyn ScenarioStore) -> DataResult<bool> {
        let Some(document) = self.document.as_ref() else {
            return Ok(false);
        };
        if !self.dirty {
            return Ok(false);
        }

        store.save_document(document)?;
        self.dirty = false;
        debug!(
            "Flushed scenario {} ({} signals)",
            document.scenario.id,
            document.signals().len()
        );
        Ok(true)
    }

    fn open_document_mut(&mut self, scenario_id: &str) -> DataResult<&mut ScenarioDocument> {
        match self.document.as_mut() {
            Some(document) if document.scenario.id == scenario_id => Ok(document),
            other => Err(DataError::NotOpen {
                requested: scenario_id.to_string(),
                current: other.map(|d| d.scenario.id.clone()),
            }),
        }
    }
}
