//! Event bus consumer driving the ingestion engine
//!
//! One worker task receives envelopes from the [`EventBus`], keeps those on
//! the subscribed topics and applies them to the shared
//! [`EmissorDataStore`] one at a time on the blocking pool. Flush ticks go
//! through the same loop, so they never race with event processing.

use crate::ingest::EmissorDataStore;
use emissor_common::events::{Envelope, EventBus, ProcessorInput};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Ingestion engine shared between the worker (writer) and HTTP lookups
pub type SharedStore = Arc<RwLock<EmissorDataStore>>;

pub struct EmissorDataService {
    store: SharedStore,
    event_bus: EventBus,
    topics: HashSet<String>,
    tick_period: Option<Duration>,
    worker: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl EmissorDataService {
    /// Service consuming `topics`; the tick period follows the store's flush policy
    pub async fn new(store: SharedStore, event_bus: EventBus, topics: impl IntoIterator<Item = String>) -> Self {
        let tick_period = store.read().await.flush_policy().tick_period();
        Self {
            store,
            event_bus,
            topics: topics.into_iter().collect(),
            tick_period,
            worker: None,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Subscribe to the bus and spawn the worker
    ///
    /// Events published after this call returns are received.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            warn!("Emissor data service already started");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = Worker {
            store: self.store.clone(),
            events: self.event_bus.subscribe(),
            topics: self.topics.clone(),
            ticker: self.tick_period.map(|period| {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            }),
            shutdown: shutdown_rx,
        };

        info!(
            "Started emissor data service on topics {:?} (tick {:?})",
            self.topics, self.tick_period
        );
        self.worker = Some((shutdown_tx, tokio::spawn(worker.run())));
    }

    /// Stop the worker and wait for its final flush
    pub async fn stop(&mut self) {
        let Some((shutdown_tx, handle)) = self.worker.take() else {
            return;
        };

        let _ = shutdown_tx.send(true);
        if let Err(e) = handle.await {
            error!("Emissor data worker failed: {}", e);
        }
        info!("Stopped emissor data service");
    }
}

struct Worker {
    store: SharedStore,
    events: broadcast::Receiver<Envelope>,
    topics: HashSet<String>,
    ticker: Option<Interval>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    debug!("Emissor data worker received shutdown");
                    break;
                }

                received = self.events.recv() => match received {
                    Ok(envelope) => {
                        if !self.topics.contains(&envelope.topic) {
                            continue;
                        }
                        debug!(
                            "Processing {} from {}",
                            envelope.event.event_type(),
                            envelope.topic
                        );
                        process(&self.store, ProcessorInput::Event(envelope.event)).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Emissor data worker lagged, {} events skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Event bus closed");
                        break;
                    }
                },

                _ = next_tick(&mut self.ticker) => {
                    process(&self.store, ProcessorInput::Tick).await;
                }
            }
        }

        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.blocking_write().flush()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => error!("Final flush failed: {}", e),
            Err(e) => error!("Final flush task failed: {}", e),
        }
    }
}

/// Apply `input` on the blocking pool
///
/// Media copies and scenario saves are synchronous file IO. A panic while
/// processing is logged like an error and the worker carries on.
async fn process(store: &SharedStore, input: ProcessorInput) {
    let store = store.clone();
    match tokio::task::spawn_blocking(move || store.blocking_write().process(input)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Failed to process event: {}", e),
        Err(e) => error!("Event processing task failed: {}", e),
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
