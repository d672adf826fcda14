//! Fan-out/fan-in aggregation over a fixed set of providers.
//!
//! Every provider is queried on its own tokio task. Readings and failures
//! come back over two separate channels and are consumed in arrival order:
//! readings are summed, and the first failure is returned to the caller as
//! is. Nothing is cancelled on early return; workers still in flight finish
//! on their own and their results are discarded.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;

use crate::{Kelvin, WeatherProvider};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AggregatorError {
    #[error("at least one weather provider must be configured")]
    NoProviders,
}

/// Ordered, immutable collection of providers averaged per request.
#[derive(Debug, Clone)]
pub struct MultiWeatherProvider {
    providers: Vec<Arc<dyn WeatherProvider>>,
}

impl MultiWeatherProvider {
    /// An empty provider list is rejected so the mean is always defined.
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>) -> Result<Self, AggregatorError> {
        if providers.is_empty() {
            return Err(AggregatorError::NoProviders);
        }

        Ok(Self { providers })
    }

    /// Average temperature for `city` across all providers, or the first
    /// provider failure observed. There is no partial result.
    pub async fn get_temperature(&self, city: &str) -> Result<Kelvin> {
        let n = self.providers.len();

        // Sized to the provider count: a worker never waits to deliver, even
        // after the collector has stopped listening.
        let (temps_tx, mut temps) = mpsc::channel::<Kelvin>(n);
        let (errs_tx, mut errs) = mpsc::channel::<anyhow::Error>(n);

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let city = city.to_owned();
            let temps_tx = temps_tx.clone();
            let errs_tx = errs_tx.clone();

            tokio::spawn(async move {
                // A closed channel means the request already returned; the
                // result is dropped.
                match provider.query_temperature(&city).await {
                    Ok(temp) => {
                        let _ = temps_tx.try_send(temp);
                    }
                    Err(err) => {
                        let _ = errs_tx.try_send(err);
                    }
                }
            });
        }

        // Only workers hold senders now, so both channels close if every
        // worker exits without reporting (e.g. a panic).
        drop(temps_tx);
        drop(errs_tx);

        let mut sum = 0.0;
        for _ in 0..n {
            tokio::select! {
                Some(temp) = temps.recv() => sum += temp,
                Some(err) = errs.recv() => return Err(err),
                else => return Err(anyhow!("weather provider task exited without a result")),
            }
        }

        Ok(sum / n as f64)
    }
}
