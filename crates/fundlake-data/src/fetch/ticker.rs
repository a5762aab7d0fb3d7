//! Per-ticker fetch: one concurrency slot, bounded retry, normalization.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn, Instrument};

use fundlake_core::{retry_with_policy, EndpointConfig, Normalization, RetryError, RetryPolicy};

use crate::error::FetchError;
use crate::fetch::normalize::{is_empty_payload, normalize, Record};
use crate::provider::finnhub::{endpoint_url, EndpointUrl, FinnhubClient};
use crate::provider::transport::JsonTransport;

/// Result of fetching one ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    /// Non-empty, tagged rows
    Fetched(Vec<Record>),
    /// Endpoint had no data for the ticker
    Empty,
    /// Every attempt failed with a retryable error
    Exhausted { last_error: Option<FetchError> },
    /// Response could not be used; not retried
    Rejected { error: FetchError },
}

/// Outcome plus attempt bookkeeping for one ticker.
#[derive(Debug, Clone)]
pub struct TickerReport {
    pub ticker: String,
    pub outcome: TickerOutcome,
    /// Attempts made
    pub attempts: u32,
    /// Start time of each attempt
    pub calls: Vec<DateTime<Utc>>,
}

/// Everything needed to fetch one endpoint for many tickers.
///
/// Built once per endpoint and shared read-only by every ticker future.
#[derive(Clone)]
pub struct FetchJob {
    transport: Arc<dyn JsonTransport>,
    url: EndpointUrl,
    api_key: SecretString,
    retry: RetryPolicy,
    normalization: Normalization,
    connections: usize,
    dataset: String,
    primary_key: Option<String>,
}

impl FetchJob {
    pub fn new(client: &FinnhubClient, config: &EndpointConfig) -> Self {
        Self::with_transport(
            client.transport_handle(),
            client.base_url(),
            client.api_key().clone(),
            config,
        )
    }

    pub fn with_transport(
        transport: Arc<dyn JsonTransport>,
        base_url: &str,
        api_key: SecretString,
        config: &EndpointConfig,
    ) -> Self {
        Self {
            transport,
            url: endpoint_url(base_url, &config.endpoint, &config.params),
            api_key,
            retry: RetryPolicy::new(config.api.query_max, config.api.api_delay),
            normalization: config.normalization.clone(),
            connections: config.api.simultaneous_connections,
            dataset: config.dataset_name(),
            primary_key: config.data_keys.primary_key.clone(),
        }
    }

    /// Size of the concurrency limiter.
    pub fn connections(&self) -> usize {
        self.connections
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch one ticker while holding a `limiter` slot for every attempt
    /// and its pacing delay.
    pub async fn fetch_ticker(&self, limiter: &Semaphore, ticker: &str) -> TickerReport {
        let span = fundlake_core::fetch_span!(self.dataset, ticker);
        self.fetch_ticker_inner(limiter, ticker).instrument(span).await
    }

    async fn fetch_ticker_inner(&self, limiter: &Semaphore, ticker: &str) -> TickerReport {
        let Ok(_permit) = limiter.acquire().await else {
            error!(ticker, "Concurrency limiter closed");
            return TickerReport {
                ticker: ticker.to_string(),
                outcome: TickerOutcome::Exhausted { last_error: None },
                attempts: 0,
                calls: Vec::new(),
            };
        };

        let url = self.url.render(ticker, &self.api_key);
        let redacted = self.url.redacted(ticker);
        let transport = self.transport.as_ref();
        let mut calls = Vec::new();

        let result = retry_with_policy(&self.retry, FetchError::is_retryable, |attempt| {
            calls.push(Utc::now());
            debug!(ticker, attempt, url = %redacted, "Requesting");
            let url = url.as_str();
            async move { transport.get_json(url).await }
        })
        .await;

        let (outcome, attempts) = match result {
            Ok((payload, attempts)) => (self.interpret(payload, ticker), attempts),
            Err(RetryError::Exhausted { attempts, last }) => {
                warn!(
                    ticker,
                    attempts,
                    error = ?last.as_ref().map(ToString::to_string),
                    "Giving up on ticker"
                );
                (TickerOutcome::Exhausted { last_error: last }, attempts)
            }
            Err(RetryError::Aborted { attempt, error }) => {
                error!(ticker, attempt, error = %error, "Unusable response, skipping ticker");
                (TickerOutcome::Rejected { error }, attempt)
            }
        };

        TickerReport {
            ticker: ticker.to_string(),
            outcome,
            attempts,
            calls,
        }
    }

    fn interpret(&self, payload: serde_json::Value, ticker: &str) -> TickerOutcome {
        if is_empty_payload(&payload) {
            info!(ticker, "No data");
            return TickerOutcome::Empty;
        }

        match normalize(payload, &self.normalization, ticker) {
            Ok(rows) if rows.is_empty() => {
                info!(ticker, "No data");
                TickerOutcome::Empty
            }
            Ok(rows) => {
                debug!(ticker, rows = rows.len(), "Fetched");
                TickerOutcome::Fetched(rows)
            }
            Err(error) => {
                error!(ticker, error = %error, "Unexpected response shape, skipping ticker");
                TickerOutcome::Rejected { error }
            }
        }
    }
}
