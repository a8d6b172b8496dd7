//! Confirmation message generation for ingested cards.
//!
//! Asks the completion service for one short sentence per batch and falls
//! back to a deterministic per-card template when the call fails. Exactly
//! one of the two paths runs per call; the fallback cannot fail.

use async_trait::async_trait;
use common::CardCandidate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::extractor::CompletionConfig;

const SERVICE_NAME: &str = "completion service";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Produces a short human-readable summary for a batch of candidates.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// One confirmation sentence for the batch. Infallible: service
    /// failures degrade to the deterministic template.
    async fn summarize(&self, candidates: &[CardCandidate]) -> String;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Summary generator backed by a text-completion endpoint.
pub struct SummaryGenerator {
    client: Client,
    config: CompletionConfig,
}

impl SummaryGenerator {
    pub fn new(config: CompletionConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    async fn generate_with_llm(
        &self,
        candidates: &[CardCandidate],
    ) -> Result<String, ServiceError> {
        // Prices and dates are deliberately left out of the prompt data so
        // the model cannot mention them.
        let cards: Vec<_> = candidates
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "set_name": c.set_name,
                    "rarity": c.rarity,
                    "quantity": c.quantity,
                })
            })
            .collect();

        let prompt = format!(
            "Write one concise, friendly sentence confirming that these trading cards were \
added to the user's collection. Do not mention prices or dates. Cards: {}",
            serde_json::to_string(&cards).unwrap_or_default()
        );

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": prompt },
            ],
        });

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("requesting confirmation message for {} card(s)", candidates.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalService {
                service: SERVICE_NAME,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ExternalService {
                service: SERVICE_NAME,
                message: format!("request failed with status {}", status),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|_| ServiceError::InvalidResponse)?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ServiceError::InvalidResponse)
    }
}

#[async_trait]
impl Summarizer for SummaryGenerator {
    async fn summarize(&self, candidates: &[CardCandidate]) -> String {
        match self.generate_with_llm(candidates).await {
            Ok(message) => message,
            Err(e) => {
                warn!("confirmation generation failed, using fallback: {}", e);
                compose_fallback(candidates)
            }
        }
    }
}

/// Deterministic fallback: one clause per candidate, highlighting special
/// rarities, joined into a single string.
pub fn compose_fallback(candidates: &[CardCandidate]) -> String {
    candidates
        .iter()
        .map(|candidate| {
            let rarity = candidate.rarity.to_lowercase();
            if rarity.contains("parallel") || rarity.contains("alt-art") || rarity.contains("alt art")
            {
                format!(
                    "Successfully added a {} {} from the {} set...",
                    candidate.rarity, candidate.name, candidate.set_name
                )
            } else {
                format!(
                    "Successfully added {} from the {} set.",
                    candidate.name, candidate.set_name
                )
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Test double returning a fixed message or the deterministic fallback.
pub struct FakeSummarizer {
    fixed_message: Option<String>,
}

impl FakeSummarizer {
    pub fn with_message(message: &str) -> Self {
        Self {
            fixed_message: Some(message.to_string()),
        }
    }

    /// Always exercises the fallback path.
    pub fn with_fallback() -> Self {
        Self {
            fixed_message: None,
        }
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, candidates: &[CardCandidate]) -> String {
        match &self.fixed_message {
            Some(message) => message.clone(),
            None => compose_fallback(candidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candidate(name: &str, set_name: &str, rarity: &str) -> CardCandidate {
        let mut candidate =
            CardCandidate::empty(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        candidate.name = name.to_string();
        candidate.set_name = set_name.to_string();
        candidate.rarity = rarity.to_string();
        candidate
    }

    #[test]
    fn test_fallback_plain_rarity() {
        let message = compose_fallback(&[candidate("Zoro", "OP01", "Super Rare")]);
        assert_eq!(message, "Successfully added Zoro from the OP01 set.");
    }

    #[test]
    fn test_fallback_highlights_parallel_and_alt_art() {
        let message = compose_fallback(&[candidate("Zoro", "OP01", "Parallel/Leader")]);
        assert_eq!(
            message,
            "Successfully added a Parallel/Leader Zoro from the OP01 set..."
        );

        let message = compose_fallback(&[candidate("Nami", "OP02", "Alt-Art SR")]);
        assert!(message.starts_with("Successfully added a Alt-Art SR Nami"));
    }

    #[test]
    fn test_fallback_joins_batches() {
        let message = compose_fallback(&[
            candidate("Zoro", "OP01", "Super Rare"),
            candidate("Nami", "OP02", "Rare"),
        ]);
        assert_eq!(
            message,
            "Successfully added Zoro from the OP01 set. Successfully added Nami from the OP02 set."
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        let generator = SummaryGenerator::new(CompletionConfig {
            base_url: "http://127.0.0.1:0".to_string(),
            api_key: "test".to_string(),
            model: "test-model".to_string(),
        });
        let message = generator
            .summarize(&[candidate("Zoro", "OP01", "Super Rare")])
            .await;
        assert_eq!(message, "Successfully added Zoro from the OP01 set.");
    }

    #[tokio::test]
    async fn test_fake_summarizer_fixed_message() {
        let fake = FakeSummarizer::with_message("All done!");
        let message = fake.summarize(&[candidate("Zoro", "OP01", "SR")]).await;
        assert_eq!(message, "All done!");
    }
}
