//! Event types for the emissor event system
//!
//! Provides shared event definitions and the EventBus the data services
//! subscribe to.

use crate::representation::{Mention, Scenario, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Emissor event types
///
/// Events are published on named topics and consumed by the data service,
/// which matches on this enum exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EmissorEvent {
    /// A scenario was started
    ///
    /// Triggers:
    /// - Data service: open a scenario session and persist the initial document
    ScenarioStarted {
        /// Scenario as started (end unset)
        scenario: Scenario,
    },

    /// The context of a running scenario changed
    ScenarioUpdated {
        /// Scenario carrying the new context
        scenario: Scenario,
    },

    /// A scenario was stopped
    ///
    /// Triggers:
    /// - Data service: seal the scenario, final persist, archive rdf logs
    ScenarioStopped {
        /// Scenario carrying the end timestamp
        scenario: Scenario,
    },

    /// A signal was opened or finalized
    SignalEvent {
        /// The signal; a finalizing event repeats the id of the open one
        signal: Signal,
    },

    /// A batch of annotations on earlier signals or annotations
    AnnotationEvent {
        /// Mentions in arrival order
        mentions: Vec<Mention>,
    },
}

impl EmissorEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            EmissorEvent::ScenarioStarted { .. } => "ScenarioStarted",
            EmissorEvent::ScenarioUpdated { .. } => "ScenarioUpdated",
            EmissorEvent::ScenarioStopped { .. } => "ScenarioStopped",
            EmissorEvent::SignalEvent { .. } => "SignalEvent",
            EmissorEvent::AnnotationEvent { .. } => "AnnotationEvent",
        }
    }
}

/// Input to an event processor: a delivered event or a payload-less timer tick
#[derive(Debug, Clone)]
pub enum ProcessorInput {
    Event(EmissorEvent),
    Tick,
}

impl From<EmissorEvent> for ProcessorInput {
    fn from(event: EmissorEvent) -> Self {
        ProcessorInput::Event(event)
    }
}

/// An event as carried on the bus, together with its topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub event: EmissorEvent,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, event: EmissorEvent) -> Self {
        Self {
            topic: topic.into(),
            event,
            timestamp: crate::time::now(),
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// Ordering is preserved per publisher; a subscriber that lags behind the
/// channel capacity loses the oldest events.
///
/// # Examples
///
/// ```
/// use emissor_common::events::{EmissorEvent, Envelope, EventBus};
/// use emissor_common::Scenario;
/// use std::collections::BTreeMap;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// let scenario = Scenario::new_instance("sc_1", 0, None, "", BTreeMap::new());
/// event_bus
///     .emit(Envelope::new("cltl.topic.scenario", EmissorEvent::ScenarioStarted { scenario }))
///     .ok();
///
/// let received = rx.try_recv().unwrap();
/// assert_eq!(received.event.event_type(), "ScenarioStarted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Envelope>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all topics
    ///
    /// Topic filtering is up to the subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, envelope: Envelope) -> Result<usize, broadcast::error::SendError<Envelope>> {
        self.tx.send(envelope)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, envelope: Envelope) {
        let _ = self.tx.send(envelope);
    }

    /// Convenience wrapper around [`EventBus::emit_lossy`]
    pub fn publish(&self, topic: &str, event: EmissorEvent) {
        self.emit_lossy(Envelope::new(topic, event));
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
