use crate::{
    Config, Kelvin,
    provider::{openweather::OpenWeatherProvider, wunderground::WeatherUndergroundProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openweather;
pub mod wunderground;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherUnderground,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherUnderground => "wunderground",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherUnderground]
    }

    /// Environment variable that overrides the configured API key.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "MULTIWEATHER_OPENWEATHER_API_KEY",
            ProviderId::WeatherUnderground => "MULTIWEATHER_WUNDERGROUND_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "wunderground" => Ok(ProviderId::WeatherUnderground),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, wunderground."
            )),
        }
    }
}

/// A source of temperature readings for a city.
///
/// Implementations hold only immutable configuration and are shared across
/// concurrent requests. Every failure (transport, status, decoding) is
/// reported as one opaque error.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn query_temperature(&self, city: &str) -> anyhow::Result<Kelvin>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider_cfg = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `multiweather configure {id}` or set {}.",
            id.api_key_env_var()
        )
    })?;

    let api_key = provider_cfg.api_key.clone();
    let base_url = provider_cfg.base_url.as_deref();

    let boxed: Box<dyn WeatherProvider> = match (id, base_url) {
        (ProviderId::OpenWeather, Some(url)) => {
            Box::new(OpenWeatherProvider::with_base_url(api_key, url))
        }
        (ProviderId::OpenWeather, None) => Box::new(OpenWeatherProvider::new(api_key)),
        (ProviderId::WeatherUnderground, Some(url)) => {
            Box::new(WeatherUndergroundProvider::with_base_url(api_key, url))
        }
        (ProviderId::WeatherUnderground, None) => {
            Box::new(WeatherUndergroundProvider::new(api_key))
        }
    };

    Ok(boxed)
}

/// Construct every configured provider, in `ProviderId::all()` order.
/// Providers without credentials are skipped.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Vec<Arc<dyn WeatherProvider>>> {
    let mut providers: Vec<Arc<dyn WeatherProvider>> = Vec::new();

    for id in config.configured_providers() {
        providers.push(Arc::from(provider_from_config(id, config)?));
    }

    Ok(providers)
}

/// Truncate an upstream body so error messages stay readable.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_parse_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("WUnderground").unwrap(), ProviderId::WeatherUnderground);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured for provider 'openweather'"));
        assert!(msg.contains("MULTIWEATHER_OPENWEATHER_API_KEY"));
    }

    #[test]
    fn providers_from_config_skips_unconfigured() {
        let mut cfg = Config::default();
        assert!(providers_from_config(&cfg).unwrap().is_empty());

        cfg.upsert_provider_api_key(ProviderId::WeatherUnderground, "KEY".to_string());
        assert_eq!(providers_from_config(&cfg).unwrap().len(), 1);

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".to_string());
        assert_eq!(providers_from_config(&cfg).unwrap().len(), 2);
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("short"), "short");

        let long = "x".repeat(250);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }
}
