use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{error::LookupError, model::WeatherSnapshot};

use super::WeatherLookup;

#[derive(Debug, Clone)]
struct Scripted {
    outcome: Result<WeatherSnapshot, LookupError>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct Inner {
    responses: HashMap<String, Scripted>,
    calls: Vec<String>,
}

/// In-memory [`WeatherLookup`] with scripted outcomes per query.
///
/// Unscripted queries fail with a decode error, the way the real service
/// answers unknown places. Clones share the same script and call log.
#[derive(Debug, Clone, Default)]
pub struct MemoryLookup {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `query` with `snapshot` after `delay`.
    pub fn respond(&self, query: &str, snapshot: WeatherSnapshot, delay: Duration) -> &Self {
        self.script(query, Ok(snapshot), delay)
    }

    /// Fails `query` with `error` after `delay`.
    pub fn fail(&self, query: &str, error: LookupError, delay: Duration) -> &Self {
        self.script(query, Err(error), delay)
    }

    fn script(
        &self,
        query: &str,
        outcome: Result<WeatherSnapshot, LookupError>,
        delay: Duration,
    ) -> &Self {
        self.lock().responses.insert(query.to_string(), Scripted { outcome, delay });
        self
    }

    /// Queries fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the call log from the rest.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl WeatherLookup for MemoryLookup {
    async fn fetch(&self, place_query: &str) -> Result<WeatherSnapshot, LookupError> {
        let scripted = {
            let mut inner = self.lock();
            inner.calls.push(place_query.to_string());
            inner.responses.get(place_query).cloned()
        };

        match scripted {
            Some(Scripted { outcome, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                outcome
            }
            None => Err(LookupError::decode(format!("no matching location for '{place_query}'"))),
        }
    }
}

/// Snapshot with plausible readings, for tests and demos.
pub fn sample_snapshot(place: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        place: place.to_string(),
        temperature: 58,
        icon_url: "https://cdn.weatherapi.com/weather/128x128/day/116.png".to_string(),
        humidity_percent: 64,
        uv_index: 3,
        feels_like: 56,
        observed_at: None,
    }
}
