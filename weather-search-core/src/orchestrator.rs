//! The search orchestrator: turns typed text into weather lookups.
//!
//! One tokio task owns the [`SearchState`] and processes a queue of events.
//! Debounce timers and lookups run as their own tasks and report back through
//! that queue, so every state change happens on the orchestrator task and
//! observers see changes in the order they were made.
//!
//! Only the most recently issued lookup may touch the state. Each lookup is
//! tagged with a generation number; issuing a new one aborts the previous
//! task, and any completion that still arrives with an older generation is
//! dropped.

use std::{fmt, sync::Arc};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::SearchSettings,
    error::{LookupError, OrchestratorError},
    lookup::WeatherLookup,
    model::{SearchState, WeatherSnapshot},
    storage::LocationStore,
};

/// Callback invoked with the new state after every change.
pub type Observer = Box<dyn FnMut(&SearchState) + Send>;

#[derive(Debug)]
enum Event {
    TextChanged(String),
    Submit,
    DebounceElapsed { ticket: u64, text: String },
    LookupSettled {
        generation: u64,
        query: String,
        outcome: Result<WeatherSnapshot, LookupError>,
    },
    State(oneshot::Sender<SearchState>),
    Shutdown(oneshot::Sender<()>),
}

/// Builder for the orchestrator task.
pub struct SearchOrchestrator {
    lookup: Arc<dyn WeatherLookup>,
    store: Arc<dyn LocationStore>,
    settings: SearchSettings,
    observers: Vec<Observer>,
}

impl fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("lookup", &self.lookup)
            .field("store", &self.store)
            .field("settings", &self.settings)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl SearchOrchestrator {
    pub fn new(
        lookup: Arc<dyn WeatherLookup>,
        store: Arc<dyn LocationStore>,
        settings: SearchSettings,
    ) -> Self {
        Self { lookup, store, settings, observers: Vec::new() }
    }

    /// Registers a callback that receives every state change.
    pub fn observe(mut self, observer: impl FnMut(&SearchState) + Send + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Starts the orchestrator on the current tokio runtime.
    ///
    /// The saved location, if any, is looked up before any queued input is
    /// handled. The task stops on [`OrchestratorHandle::shutdown`] or once
    /// every handle has been dropped.
    pub fn spawn(self) -> OrchestratorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.into_actor(tx.downgrade()).run(rx));

        OrchestratorHandle { events: tx }
    }

    fn into_actor(self, events: mpsc::WeakUnboundedSender<Event>) -> Actor {
        Actor {
            state: SearchState::default(),
            lookup: self.lookup,
            store: self.store,
            settings: self.settings,
            observers: self.observers,
            events,
            // The empty search box counts as the first debounced value.
            last_emitted: Some(String::new()),
            debounce_ticket: 0,
            pending_debounce: None,
            generation: 0,
            in_flight: None,
        }
    }
}

/// Cloneable handle used by the presentation layer to drive the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    events: mpsc::UnboundedSender<Event>,
}

impl OrchestratorHandle {
    /// The search text changed (one call per edit).
    pub fn text_changed(&self, text: impl Into<String>) -> Result<(), OrchestratorError> {
        self.send(Event::TextChanged(text.into()))
    }

    /// Looks up the current search text now, skipping the quiet period.
    pub fn submit(&self) -> Result<(), OrchestratorError> {
        self.send(Event::Submit)
    }

    pub async fn state(&self) -> Result<SearchState, OrchestratorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::State(tx))?;
        rx.await.map_err(|_| OrchestratorError::Closed)
    }

    /// Stops the orchestrator, abandoning any pending timer or lookup.
    pub async fn shutdown(&self) -> Result<(), OrchestratorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Shutdown(tx))?;
        rx.await.map_err(|_| OrchestratorError::Closed)
    }

    fn send(&self, event: Event) -> Result<(), OrchestratorError> {
        self.events.send(event).map_err(|_| OrchestratorError::Closed)
    }
}

struct Actor {
    state: SearchState,
    lookup: Arc<dyn WeatherLookup>,
    store: Arc<dyn LocationStore>,
    settings: SearchSettings,
    observers: Vec<Observer>,
    // Weak so that dropping every handle ends the run loop.
    events: mpsc::WeakUnboundedSender<Event>,
    last_emitted: Option<String>,
    debounce_ticket: u64,
    pending_debounce: Option<JoinHandle<()>>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl Actor {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        self.restore_saved_location();

        while let Some(event) = events.recv().await {
            match event {
                Event::TextChanged(text) => self.text_changed(text),
                Event::Submit => self.submit(),
                Event::DebounceElapsed { ticket, text } => self.debounce_elapsed(ticket, text),
                Event::LookupSettled { generation, query, outcome } => {
                    self.lookup_settled(generation, query, outcome)
                }
                Event::State(reply) => {
                    let _ = reply.send(self.state.clone());
                }
                Event::Shutdown(done) => {
                    self.stop();
                    let _ = done.send(());
                    return;
                }
            }
        }

        self.stop();
    }

    fn restore_saved_location(&mut self) {
        match self.store.load() {
            Some(place) => {
                info!(place = %place, "restoring saved location");
                self.request(place);
            }
            None => debug!("no saved location"),
        }
    }

    fn text_changed(&mut self, text: String) {
        if self.state.query_text != text {
            self.state.query_text.clone_from(&text);
            self.notify();
        }
        self.schedule_debounce(text);
    }

    fn submit(&mut self) {
        self.cancel_debounce();
        let query = self.state.query_text.clone();
        self.last_emitted = Some(query.clone());
        self.request(query);
    }

    fn schedule_debounce(&mut self, text: String) {
        self.cancel_debounce();

        let ticket = self.debounce_ticket;
        let quiet_period = self.settings.quiet_period();
        let events = self.events.clone();

        self.pending_debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if let Some(events) = events.upgrade() {
                let _ = events.send(Event::DebounceElapsed { ticket, text });
            }
        }));
    }

    /// Aborts the pending timer; an expiry already queued is invalidated by
    /// the ticket bump.
    fn cancel_debounce(&mut self) {
        if let Some(timer) = self.pending_debounce.take() {
            timer.abort();
        }
        self.debounce_ticket += 1;
    }

    fn debounce_elapsed(&mut self, ticket: u64, text: String) {
        if ticket != self.debounce_ticket {
            debug!(ticket, "ignoring cancelled debounce timer");
            return;
        }
        self.pending_debounce = None;

        if self.last_emitted.as_deref() == Some(text.as_str()) {
            debug!(query = %text, "search text unchanged since last lookup");
            return;
        }
        self.last_emitted = Some(text.clone());
        self.request(text);
    }

    fn request(&mut self, query: String) {
        if query.chars().count() < self.settings.min_query_chars {
            debug!(query = %query, min = self.settings.min_query_chars, "query too short");
            return;
        }

        if let Some(previous) = self.in_flight.take() {
            debug!(generation = self.generation, "superseding in-flight lookup");
            previous.abort();
        }

        self.generation += 1;
        let generation = self.generation;
        debug!(query = %query, generation, "starting lookup");

        self.state.is_loading = true;
        self.notify();

        let lookup = Arc::clone(&self.lookup);
        let events = self.events.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = lookup.fetch(&query).await;
            if let Some(events) = events.upgrade() {
                let _ = events.send(Event::LookupSettled { generation, query, outcome });
            }
        }));
    }

    fn lookup_settled(
        &mut self,
        generation: u64,
        query: String,
        outcome: Result<WeatherSnapshot, LookupError>,
    ) {
        if generation != self.generation {
            debug!(query = %query, generation, latest = self.generation, "discarding stale lookup");
            return;
        }
        self.in_flight = None;
        self.state.is_loading = false;

        match outcome {
            Ok(snapshot) => {
                debug!(query = %query, place = %snapshot.place, "lookup succeeded");
                let place = snapshot.place.clone();
                self.state.current_weather = Some(snapshot);
                self.state.error_message = None;
                self.notify();
                self.store.save(&place);
            }
            Err(e) => {
                warn!(query = %query, error = %e, "lookup failed");
                self.state.current_weather = None;
                self.state.error_message = Some(e.to_string());
                self.notify();
            }
        }
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.state);
        }
    }

    fn stop(&mut self) {
        self.cancel_debounce();
        if let Some(lookup) = self.in_flight.take() {
            lookup.abort();
        }
    }
}
