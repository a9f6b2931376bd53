use crate::{
    Config, error::LookupError, lookup::weatherapi::WeatherApiLookup, model::WeatherSnapshot,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod memory;
pub mod weatherapi;

/// Resolves a free-text place query into current weather.
///
/// Implementations make a single attempt; retrying is left to the caller.
#[async_trait]
pub trait WeatherLookup: Send + Sync + Debug {
    async fn fetch(&self, place_query: &str) -> Result<WeatherSnapshot, LookupError>;
}

/// Construct the WeatherAPI.com lookup from config.
pub fn lookup_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherLookup>> {
    let api_key = config.require_api_key()?;
    Ok(Arc::new(WeatherApiLookup::new(api_key, config.endpoint.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_from_config_works_with_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(lookup_from_config(&cfg).is_ok());
    }
}
