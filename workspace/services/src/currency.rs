//! Exchange-rate lookup against a Frankfurter-style rate table service.
//!
//! This is a best-effort, fail-fast lookup: one request, a short timeout,
//! no retries. Callers treat `None` as "conversion unavailable" and apply
//! their own fallback; a failed lookup never aborts a write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

/// Rate lookups are bounded by a short timeout to avoid stalling a save.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_RATE_URL: &str = "https://api.frankfurter.app";

/// Source of multiplicative currency conversion rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Latest rate from `from` to `to`, or `None` when unavailable.
    ///
    /// Identical currency codes short-circuit to `1.0` without any
    /// external call.
    async fn convert_rate(&self, from: &str, to: &str) -> Option<Decimal>;
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    rates: HashMap<String, Decimal>,
}

/// Client for the Frankfurter exchange-rate API.
pub struct FrankfurterClient {
    client: Client,
    base_url: String,
}

impl FrankfurterClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }
}

#[async_trait]
impl RateProvider for FrankfurterClient {
    async fn convert_rate(&self, from: &str, to: &str) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }

        let url = format!("{}/latest?from={}&to={}", self.base_url, from, to);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("exchange rate request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "exchange rate request for {}->{} returned {}",
                from,
                to,
                response.status()
            );
            return None;
        }

        let body: RateResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("exchange rate response was malformed: {}", e);
                return None;
            }
        };

        let rate = body.rates.get(to).copied();
        if rate.is_none() {
            warn!("exchange rate response had no {} rate", to);
        }
        rate
    }
}

/// Test double with a fixed rate and an external-call counter.
pub struct FakeRateProvider {
    rate: Option<Decimal>,
    calls: AtomicUsize,
}

impl FakeRateProvider {
    /// Always answers with the given rate.
    pub fn with_rate(rate: Decimal) -> Self {
        Self {
            rate: Some(rate),
            calls: AtomicUsize::new(0),
        }
    }

    /// Simulates an unreachable or rate-less service.
    pub fn unavailable() -> Self {
        Self {
            rate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many lookups reached this provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for FakeRateProvider {
    async fn convert_rate(&self, from: &str, to: &str) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity_conversion_makes_no_request() {
        // An unroutable base URL: any attempted request would fail and
        // surface as None, so Some(1.0) proves the fast path was taken.
        let client = FrankfurterClient::new("http://127.0.0.1:0".to_string());
        let rate = client.convert_rate("SGD", "SGD").await;
        assert_eq!(rate, Some(Decimal::ONE));
    }

    #[tokio::test]
    async fn test_unreachable_service_yields_none() {
        let client = FrankfurterClient::new("http://127.0.0.1:0".to_string());
        let rate = client.convert_rate("USD", "SGD").await;
        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn test_fake_provider_counts_external_calls() {
        let fake = FakeRateProvider::with_rate(Decimal::new(135, 2));
        assert_eq!(fake.convert_rate("SGD", "SGD").await, Some(Decimal::ONE));
        assert_eq!(fake.calls(), 0);

        assert_eq!(
            fake.convert_rate("USD", "SGD").await,
            Some(Decimal::new(135, 2))
        );
        assert_eq!(fake.calls(), 1);
    }
}
