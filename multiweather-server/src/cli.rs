use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use multiweather_core::{
    Config, MultiWeatherProvider, ProviderId, TemperatureReport, provider::providers_from_config,
};

use crate::routes;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "multiweather", version, about = "Averaged temperatures from several weather providers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `GET /weather/{city}` over HTTP.
    Serve {
        /// Address to bind, overriding config and MULTIWEATHER_LISTEN_ADDR.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "wunderground".
        provider: String,
    },

    /// Query every configured provider once and print the average.
    Show {
        /// City name as understood by the upstream services.
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { listen } => serve(listen).await,
            Command::Configure { provider } => configure(&provider),
            Command::Show { city } => show(&city).await,
        }
    }
}

fn build_aggregator(config: &Config) -> anyhow::Result<MultiWeatherProvider> {
    let providers = providers_from_config(config)?;
    let aggregator = MultiWeatherProvider::new(providers).with_context(|| {
        format!(
            "No providers configured.\n\
             Hint: run `multiweather configure <provider>` or set one of {}.",
            ProviderId::all().iter().map(|id| id.api_key_env_var()).collect::<Vec<_>>().join(", ")
        )
    })?;

    Ok(aggregator)
}

async fn serve(listen: Option<String>) -> anyhow::Result<()> {
    let config = Config::load_with_env()?;
    let aggregator = build_aggregator(&config)?;
    let addr = listen.unwrap_or_else(|| config.listen_addr().to_string());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        providers = ?config.configured_providers(),
        "multiweather listening"
    );

    axum::serve(listener, routes::router(Arc::new(aggregator)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved credentials for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: &str) -> anyhow::Result<()> {
    let config = Config::load_with_env()?;
    let aggregator = build_aggregator(&config)?;

    let begin = std::time::Instant::now();
    let temp = aggregator.get_temperature(city).await?;
    let report = TemperatureReport::new(city, temp, begin.elapsed());

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
