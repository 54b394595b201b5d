use async_trait::async_trait;
use reqwest::{
    Client, Url,
    header::{CONTENT_TYPE, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::{
    error::NetworkError,
    model::{LocationSuggestion, WeatherResponse},
};

use super::WeatherService;

pub const DEFAULT_HOST: &str = "https://api.openweathermap.org";

const WEATHER_PATH: &str = "/data/2.5/weather";
const GEOCODING_PATH: &str = "/geo/1.0/direct";
const UNITS: &str = "imperial";
const SUGGESTION_LIMIT: &str = "5";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    host: String,
    user_agent: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn with_host(api_key: String, host: String) -> Self {
        Self {
            api_key,
            host,
            user_agent: format!(
                "weather-core/{} ({})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ),
            http: Client::new(),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, NetworkError> {
        let base = format!("{}{}", self.host.trim_end_matches('/'), path);
        Url::parse_with_params(&base, params)
            .map_err(|e| NetworkError::BadRequest(format!("{base}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, NetworkError> {
        info!(url = %redact_api_key(&url), "OpenWeather request");

        let res = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .map_err(|e| {
                NetworkError::Service(format!("Failed to send request to OpenWeather: {e}"))
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| {
                NetworkError::Service(format!("Failed to read OpenWeather response body: {e}"))
            })?;

        debug!(%status, body = %truncate_body(&body), "OpenWeather response");

        if !status.is_success() {
            return Err(NetworkError::Service(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| NetworkError::Service(format!("Failed to parse OpenWeather JSON: {e}")))
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn fetch_by_name(&self, name: &str) -> Result<WeatherResponse, NetworkError> {
        let url = self.endpoint(
            WEATHER_PATH,
            &[("q", name), ("units", UNITS), ("appid", self.api_key.as_str())],
        )?;
        self.get(url).await
    }

    async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherResponse, NetworkError> {
        let lat = lat.to_string();
        let lon = lon.to_string();
        let url = self.endpoint(
            WEATHER_PATH,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", UNITS),
                ("appid", self.api_key.as_str()),
            ],
        )?;
        self.get(url).await
    }

    async fn fetch_suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<LocationSuggestion>, NetworkError> {
        let url = self.endpoint(
            GEOCODING_PATH,
            &[("q", query), ("limit", SUGGESTION_LIMIT), ("appid", self.api_key.as_str())],
        )?;
        self.get(url).await
    }
}

fn redact_api_key(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
