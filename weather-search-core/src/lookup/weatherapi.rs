use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::{
    error::LookupError,
    mapper::{WaErrorEnvelope, WaResponse, map_response},
    model::WeatherSnapshot,
};

use super::WeatherLookup;

/// Current-conditions lookup against WeatherAPI.com.
#[derive(Debug, Clone)]
pub struct WeatherApiLookup {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl WeatherApiLookup {
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self { api_key, endpoint, http: Client::new() }
    }

    fn request_url(&self, place_query: &str) -> Result<Url, LookupError> {
        if place_query.trim().is_empty() {
            return Err(LookupError::invalid_query("enter a place name to search for"));
        }

        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            LookupError::invalid_query(format!(
                "weather endpoint '{}' is not a URL ({e})",
                self.endpoint
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", place_query);

        Ok(url)
    }
}

#[async_trait]
impl WeatherLookup for WeatherApiLookup {
    async fn fetch(&self, place_query: &str) -> Result<WeatherSnapshot, LookupError> {
        let url = self.request_url(place_query)?;
        debug!(query = place_query, endpoint = %self.endpoint, "requesting current weather");

        let res = self.http.get(url).send().await.map_err(|e| {
            warn!(query = place_query, error = %e, "weather request failed");
            LookupError::transport(e.without_url().to_string())
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            LookupError::transport(format!("failed to read response body: {}", e.without_url()))
        })?;

        parse_body(status, &body).inspect_err(|e| {
            warn!(query = place_query, %status, error = %e, "weather response rejected");
        })
    }
}

fn parse_body(status: StatusCode, body: &str) -> Result<WeatherSnapshot, LookupError> {
    if !status.is_success() {
        let detail = match serde_json::from_str::<WaErrorEnvelope>(body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => truncate_body(body),
        };
        return Err(LookupError::decode(format!("{status}: {detail}")));
    }

    let parsed: WaResponse =
        serde_json::from_str(body).map_err(|e| LookupError::decode(e.to_string()))?;

    map_response(parsed)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
