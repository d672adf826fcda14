use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::model::{Kelvin, celsius_to_kelvin};

use super::{WeatherProvider, truncate_body};

pub const DEFAULT_BASE_URL: &str = "http://api.wunderground.com";

/// wunderground.com adapter. Upstream reports Celsius, converted here.
#[derive(Clone)]
pub struct WeatherUndergroundProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherUndergroundProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self { api_key, base_url: base_url.into().trim_end_matches('/').to_string(), http: Client::new() }
    }

    /// `{base}/api/{key}/conditions/q/{city}.json`. Each `/`-separated part of
    /// the city is percent-encoded as its own path segment.
    fn conditions_url(&self, city: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).context("Invalid weather provider base URL")?;

        let mut parts: Vec<String> = city.split('/').map(str::to_string).collect();
        if let Some(last) = parts.last_mut() {
            last.push_str(".json");
        }

        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Invalid weather provider base URL"))?
            .pop_if_empty()
            .extend(["api", self.api_key.as_str(), "conditions", "q"])
            .extend(&parts);

        Ok(url)
    }

    async fn fetch(&self, city: &str) -> Result<Kelvin> {
        // The key is part of the path, so reqwest errors must not carry the URL.
        let res = self
            .http
            .get(self.conditions_url(city)?)
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
            return Err(anyhow::anyhow!(
                "Weather provider request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: WuResponse =
            serde_json::from_str(&body).context("Failed to parse weather provider JSON")?;

        Ok(celsius_to_kelvin(parsed.current_observation.temp_c))
    }
}

impl std::fmt::Debug for WeatherUndergroundProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherUndergroundProvider").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct WuObservation {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WuResponse {
    current_observation: WuObservation,
}

#[async_trait]
impl WeatherProvider for WeatherUndergroundProvider {
    async fn query_temperature(&self, city: &str) -> Result<Kelvin> {
        match self.fetch(city).await {
            Ok(kelvin) => {
                tracing::info!(provider = "wunderground", city, kelvin, "temperature received");
                Ok(kelvin)
            }
            Err(err) => {
                tracing::warn!(provider = "wunderground", city, error = %format!("{err:#}"), "query failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn converts_celsius_reading_to_kelvin() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/KEY/conditions/q/Paris.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"current_observation":{"temp_c":20.0,"weather":"Clear"}}"#)
            .create_async()
            .await;

        let provider = WeatherUndergroundProvider::with_base_url("KEY".into(), server.url());
        let temp = provider.query_temperature("Paris").await.unwrap();

        assert!((temp - 293.15).abs() < 1e-9);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_observation_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/KEY/conditions/q/Nowhere.json")
            .with_status(200)
            .with_body(r#"{"response":{"error":{"type":"querynotfound"}}}"#)
            .create_async()
            .await;

        let provider = WeatherUndergroundProvider::with_base_url("KEY".into(), server.url());
        let err = provider.query_temperature("Nowhere").await.unwrap_err();

        assert!(err.to_string().contains("Failed to parse weather provider JSON"));
    }

    #[tokio::test]
    async fn server_error_status_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/KEY/conditions/q/Paris.json")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let provider = WeatherUndergroundProvider::with_base_url("KEY".into(), server.url());
        let err = provider.query_temperature("Paris").await.unwrap_err();

        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn unreachable_host_error_hides_api_key() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let provider =
            WeatherUndergroundProvider::with_base_url("WU_SECRET_456".into(), "http://127.0.0.1:9");
        let err = provider.query_temperature("Paris").await.unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("Failed to send request to weather provider"));
        assert!(!msg.contains("WU_SECRET_456"), "api key in error: {msg}");
        assert!(!msg.to_lowercase().contains("underground"));
    }

    #[test]
    fn debug_output_omits_api_key() {
        let provider = WeatherUndergroundProvider::new("WU_SECRET_456".into());
        assert!(!format!("{provider:?}").contains("WU_SECRET_456"));
    }

    #[test]
    fn city_is_encoded_into_path_segments() {
        let provider = WeatherUndergroundProvider::with_base_url("KEY".into(), "http://example.test/");

        let url = provider.conditions_url("a?b#c").unwrap();
        assert_eq!(url.as_str(), "http://example.test/api/KEY/conditions/q/a%3Fb%23c.json");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        let url = provider.conditions_url("CA/San Francisco").unwrap();
        assert_eq!(url.as_str(), "http://example.test/api/KEY/conditions/q/CA/San%20Francisco.json");
    }
}
