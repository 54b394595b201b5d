use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{
    Config,
    client::openweather::OpenWeatherClient,
    error::NetworkError,
    model::{LocationSuggestion, WeatherResponse},
};

pub mod openweather;

/// The three remote lookups the app needs. One request per call, no retries.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    async fn fetch_by_name(&self, name: &str) -> Result<WeatherResponse, NetworkError>;

    async fn fetch_by_coordinates(&self, lat: f64, lon: f64)
    -> Result<WeatherResponse, NetworkError>;

    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<LocationSuggestion>, NetworkError>;
}

/// Construct the production client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherService>> {
    let api_key = config.api_key()?;
    let client = OpenWeatherClient::with_host(api_key, config.host().to_string());
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = client_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn client_from_config_works_when_key_set() {
        let cfg = Config { api_key: Some("KEY".to_string()), ..Config::default() };
        assert!(client_from_config(&cfg).is_ok());
    }
}
