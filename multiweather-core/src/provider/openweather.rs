use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::Kelvin;

use super::{WeatherProvider, truncate_body};

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";

/// openweathermap.org adapter. Upstream already reports Kelvin.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn fetch(&self, city: &str) -> Result<Kelvin> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        // APPID travels in the query string; keep the URL out of errors.
        let res = self
            .http
            .get(&url)
            .query(&[("APPID", self.api_key.as_str()), ("q", city)])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to weather provider")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read weather provider response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Weather provider request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwResponse =
            serde_json::from_str(&body).context("Failed to parse weather provider JSON")?;

        Ok(parsed.main.temp)
    }
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwResponse {
    main: OwMain,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn query_temperature(&self, city: &str) -> Result<Kelvin> {
        match self.fetch(city).await {
            Ok(kelvin) => {
                tracing::info!(provider = "openweather", city, kelvin, "temperature received");
                Ok(kelvin)
            }
            Err(err) => {
                tracing::warn!(provider = "openweather", city, error = %format!("{err:#}"), "query failed");
                Err(err)
            }
        }
    }
}
