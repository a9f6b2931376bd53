use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized current weather for one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Display name of the resolved location.
    pub place: String,
    /// Current temperature in °F.
    pub temperature: i32,
    /// Fully-qualified URL of the condition icon.
    pub icon_url: String,
    pub humidity_percent: i32,
    pub uv_index: i32,
    /// Feels-like temperature in °F.
    pub feels_like: i32,
    /// When the provider last refreshed this reading, if it said so.
    pub observed_at: Option<DateTime<Utc>>,
}

/// UI-facing search state, owned by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query_text: String,
    pub is_loading: bool,
    pub current_weather: Option<WeatherSnapshot>,
    pub error_message: Option<String>,
}

/// Which view the presentation layer should show for a [`SearchState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayView<'a> {
    Loading,
    /// Full layout, used for the restored location (empty search text).
    Detail(&'a WeatherSnapshot),
    /// Compact card under an active search.
    CompactResult(&'a WeatherSnapshot),
    Error(&'a str),
    Empty,
}

impl SearchState {
    pub fn display(&self) -> DisplayView<'_> {
        if self.is_loading {
            return DisplayView::Loading;
        }

        match (&self.current_weather, &self.error_message) {
            (Some(weather), _) if self.query_text.is_empty() => DisplayView::Detail(weather),
            (Some(weather), _) => DisplayView::CompactResult(weather),
            (None, Some(message)) => DisplayView::Error(message),
            (None, None) => DisplayView::Empty,
        }
    }
}
