//! Normalization of WeatherAPI.com responses into [`WeatherSnapshot`]s.

use chrono::DateTime;
use reqwest::Url;
use serde::Deserialize;

use crate::{error::LookupError, model::WeatherSnapshot};

const ICON_HOST_SHORTHAND: &str = "//cdn";
const ICON_HOST_REPLACEMENT: &str = "https://cdn";
const ICON_SIZE_SHORTHAND: &str = "64x64";
const ICON_SIZE_REPLACEMENT: &str = "128x128";

#[derive(Debug, Deserialize)]
pub(crate) struct WaLocation {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaCondition {
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaCurrent {
    pub temp_f: f64,
    pub feelslike_f: f64,
    pub humidity: f64,
    pub uv: f64,
    pub condition: WaCondition,
    pub last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaResponse {
    pub location: WaLocation,
    pub current: WaCurrent,
}

/// Error envelope WeatherAPI.com sends with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct WaErrorEnvelope {
    pub error: WaErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaErrorBody {
    pub message: String,
}

pub(crate) fn map_response(response: WaResponse) -> Result<WeatherSnapshot, LookupError> {
    let current = &response.current;

    let temperature = truncate_reading("temperature", current.temp_f)?;
    let feels_like = truncate_reading("feels-like temperature", current.feelslike_f)?;
    let humidity_percent = truncate_reading("humidity", current.humidity)?;
    let uv_index = truncate_reading("UV index", current.uv)?;
    let icon_url = normalize_icon_url(&current.condition.icon);

    Url::parse(&icon_url).map_err(|e| {
        LookupError::mapping(format!("condition icon '{}' is not a valid URL ({e})", icon_url))
    })?;

    let observed_at = current.last_updated_epoch.and_then(|ts| DateTime::from_timestamp(ts, 0));

    Ok(WeatherSnapshot {
        place: response.location.name,
        temperature,
        icon_url,
        humidity_percent,
        uv_index,
        feels_like,
        observed_at,
    })
}

/// Makes protocol-relative `//cdn` references absolute and swaps 64px icon
/// sizes for 128px. References with neither are returned unchanged.
pub fn normalize_icon_url(icon: &str) -> String {
    let absolute = match icon.strip_prefix(ICON_HOST_SHORTHAND) {
        Some(rest) => format!("{ICON_HOST_REPLACEMENT}{rest}"),
        None => icon.to_string(),
    };
    absolute.replace(ICON_SIZE_SHORTHAND, ICON_SIZE_REPLACEMENT)
}

/// Truncates toward zero; non-finite or out-of-range readings are rejected.
fn truncate_reading(field: &str, value: f64) -> Result<i32, LookupError> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX)
    {
        return Err(LookupError::mapping(format!("{field} reading {value} is out of range")));
    }
    Ok(truncated as i32)
}
