//! AI card extractor: turns a free-text description and/or card photos
//! into structured [`CardCandidate`]s via one multimodal chat-completion
//! request.
//!
//! The model is instructed to answer with JSON only, but real services
//! wrap their JSON in prose often enough that the first balanced JSON
//! array-or-object substring is extracted before parsing. All
//! normalization (defaults, card-number reassembly, the Parallel/Leader
//! rarity override, per-image quantity forcing) happens here, after the
//! model responds, so the rules hold no matter what the model proposes.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, Utc};
use common::{BASE_CURRENCY, CardCandidate};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Maximum accepted description length for text-only extraction.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Rarity label forced whenever the input or output mentions P/L.
pub const PARALLEL_LEADER: &str = "Parallel/Leader";

const SERVICE_NAME: &str = "completion service";

/// The completion call gets a generous but bounded window; an unbounded
/// synchronous call on the request path would stall ingestion forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts trading card details from \
user descriptions and card photos. Respond with a JSON array of objects, one per card, with the \
fields: 'name', 'set_name', 'card_number', 'rarity', 'color', 'quantity', \
'purchase_price_original', 'original_currency' (3-letter code, inferred from currency symbols in \
the description, e.g. '$' means USD and 'S$' means SGD), 'purchase_date' (YYYY-MM-DD), and \
'image_url'. If a field is not mentioned or inferable, use sensible defaults (quantity: 1, \
prices: 0.0, empty string for text fields). For 'card_number', infer the set code (e.g. 'OP01', \
'ST10') and combine it as '<SET>-<NUMBER>'. If a rarity like 'SP', 'AA' (Alternative Art), \
'P/L' (Parallel Leader) or 'Manga Art' is mentioned, include it in the 'rarity' field. Respond \
with valid JSON only.";

/// Configuration for an OpenAI-style chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL up to but excluding `/chat/completions`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Extracts candidate card records from user input.
#[async_trait]
pub trait CardExtractor: Send + Sync {
    /// Extract zero or more candidates from a description and/or images.
    ///
    /// Fails with [`ServiceError::Validation`] when both inputs are empty
    /// or the text-only description exceeds [`MAX_DESCRIPTION_CHARS`].
    /// Never panics and never partially succeeds.
    async fn extract_cards(
        &self,
        description: Option<&str>,
        images: &[Vec<u8>],
    ) -> Result<Vec<CardCandidate>, ServiceError>;
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

/// One candidate as the model proposed it, before default-filling.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCandidate {
    name: Option<String>,
    set_name: Option<String>,
    card_number: Option<String>,
    rarity: Option<String>,
    color: Option<String>,
    quantity: Option<i64>,
    purchase_price_original: Option<Decimal>,
    original_currency: Option<String>,
    purchase_date: Option<String>,
    image_url: Option<String>,
}

/// Client for a multimodal chat-completion endpoint.
pub struct CompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    async fn request_completion(
        &self,
        description: Option<&str>,
        images: &[Vec<u8>],
    ) -> Result<String, ServiceError> {
        let mut parts = Vec::new();
        if let Some(text) = description {
            parts.push(json!({
                "type": "text",
                "text": format!("Please extract card details from this description: '{}'", text),
            }));
        }
        for image in images {
            parts.push(json!({
                "type": "image_url",
                "image_url": {
                    "url": format!("data:image/jpeg;base64,{}", BASE64.encode(image)),
                },
            }));
        }

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": parts },
            ],
        });

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("requesting card extraction from {}", self.config.model);

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

        let chat: ChatResponse =
            response
                .json()
                .await
                .map_err(|_| ServiceError::InvalidResponse)?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ServiceError::InvalidResponse)
    }
}

#[async_trait]
impl CardExtractor for CompletionClient {
    async fn extract_cards(
        &self,
        description: Option<&str>,
        images: &[Vec<u8>],
    ) -> Result<Vec<CardCandidate>, ServiceError> {
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        if description.is_none() && images.is_empty() {
            return Err(ServiceError::Validation(
                "provide a card description or at least one image".to_string(),
            ));
        }
        if images.is_empty() {
            if let Some(text) = description {
                if text.chars().count() > MAX_DESCRIPTION_CHARS {
                    return Err(ServiceError::Validation(format!(
                        "description is too long (max {} characters)",
                        MAX_DESCRIPTION_CHARS
                    )));
                }
            }
        }

        // The decoded image buffers are owned by this call; they are
        // dropped on success and failure alike.
        let content = self.request_completion(description, images).await?;

        let candidates = parse_candidates(
            &content,
            description.unwrap_or(""),
            images.len() > 1,
            Utc::now().date_naive(),
        )?;

        debug!("extracted {} candidate card(s)", candidates.len());
        Ok(candidates)
    }
}

/// Parse and normalize the model's reply into candidates.
fn parse_candidates(
    content: &str,
    source_text: &str,
    multi_image: bool,
    today: NaiveDate,
) -> Result<Vec<CardCandidate>, ServiceError> {
    let blob = extract_json_blob(content).ok_or(ServiceError::InvalidResponse)?;
    let value: Value = serde_json::from_str(blob).map_err(|_| ServiceError::InvalidResponse)?;

    // A bare object is normalized into a one-element list.
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => return Err(ServiceError::InvalidResponse),
    };

    items
        .into_iter()
        .map(|item| {
            let raw: RawCandidate =
                serde_json::from_value(item).map_err(|_| ServiceError::InvalidResponse)?;
            Ok(normalize_candidate(raw, source_text, multi_image, today))
        })
        .collect()
}

/// Apply the documented defaults and normalization rules to one candidate.
fn normalize_candidate(
    raw: RawCandidate,
    source_text: &str,
    multi_image: bool,
    today: NaiveDate,
) -> CardCandidate {
    let mut candidate = CardCandidate::empty(today);

    if let Some(name) = raw.name.filter(|n| !n.trim().is_empty()) {
        candidate.name = name.trim().to_string();
    }
    if let Some(set_name) = raw.set_name {
        candidate.set_name = set_name.trim().to_string();
    }
    candidate.card_number = combine_card_number(
        &candidate.set_name,
        raw.card_number.as_deref().unwrap_or("").trim(),
    );

    let rarity = raw.rarity.unwrap_or_default();
    if mentions_parallel_leader(source_text) || mentions_parallel_leader(&rarity) {
        candidate.rarity = PARALLEL_LEADER.to_string();
    } else {
        candidate.rarity = rarity.trim().to_string();
    }

    if let Some(color) = raw.color {
        candidate.color = color.trim().to_string();
    }

    // One physical card per image: a multi-image batch overrides whatever
    // quantity the model proposed.
    candidate.quantity = if multi_image {
        1
    } else {
        raw.quantity
            .and_then(|q| i32::try_from(q).ok())
            .filter(|q| *q > 0)
            .unwrap_or(1)
    };

    if let Some(price) = raw.purchase_price_original {
        candidate.purchase_price_original = price;
    }

    match raw.original_currency.map(|c| c.trim().to_uppercase()) {
        Some(code) if !code.is_empty() => candidate.original_currency = code,
        _ => candidate.original_currency = infer_currency(source_text).to_string(),
    }

    if let Some(date) = raw
        .purchase_date
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    {
        candidate.purchase_date = date;
    }

    if let Some(image_url) = raw.image_url {
        candidate.image_url = image_url.trim().to_string();
    }

    candidate
}

/// Reassemble `"{set_name}-{card_number}"` without double-prefixing.
fn combine_card_number(set_name: &str, card_number: &str) -> String {
    if card_number.is_empty() || card_number.contains('-') || set_name.is_empty() {
        return card_number.to_string();
    }

    let set_upper = set_name.to_uppercase();
    let number_upper = card_number.to_uppercase();
    if let Some(rest) = number_upper.strip_prefix(&set_upper) {
        // The model already included the set prefix; just insert the hyphen.
        if rest.is_empty() {
            return number_upper;
        }
        return format!("{}-{}", set_upper, rest);
    }

    format!("{}-{}", set_upper, number_upper)
}

/// Whether the text mentions the Parallel/Leader rarity in any spelling.
fn mentions_parallel_leader(text: &str) -> bool {
    let upper = text.to_uppercase();
    if upper.contains("P/L") || upper.contains("PARALLEL LEADER") {
        return true;
    }
    upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == "PL")
}

/// Best-effort currency inference from symbols in the description.
fn infer_currency(text: &str) -> &'static str {
    if text.contains("S$") {
        return BASE_CURRENCY;
    }
    if text.contains("US$") || text.contains('$') {
        return "USD";
    }
    if text.contains('¥') {
        return "JPY";
    }
    if text.contains('€') {
        return "EUR";
    }
    if text.contains('£') {
        return "GBP";
    }
    BASE_CURRENCY
}

/// Find the first balanced JSON array-or-object substring.
///
/// Completion services regularly wrap their JSON in prose ("Here are the
/// cards: [...]"); this walks the text tracking string and escape state
/// and returns the first top-level `{...}` or `[...]` span.
fn extract_json_blob(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| *b == b'{' || *b == b'[')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    warn!("completion response contained no balanced JSON");
    None
}

/// Test double returning canned candidates or a canned failure.
pub struct FakeCardExtractor {
    candidates: Vec<CardCandidate>,
    error: Option<String>,
}

impl FakeCardExtractor {
    pub fn with_candidates(candidates: Vec<CardCandidate>) -> Self {
        Self {
            candidates,
            error: None,
        }
    }

    /// Simulates a failing completion service.
    pub fn failing(message: &str) -> Self {
        Self {
            candidates: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl CardExtractor for FakeCardExtractor {
    async fn extract_cards(
        &self,
        _description: Option<&str>,
        _images: &[Vec<u8>],
    ) -> Result<Vec<CardCandidate>, ServiceError> {
        match &self.error {
            Some(message) => Err(ServiceError::ExternalService {
                service: SERVICE_NAME,
                message: message.clone(),
            }),
            None => Ok(self.candidates.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn dummy_config() -> CompletionConfig {
        CompletionConfig {
            base_url: "http://127.0.0.1:0".to_string(),
            api_key: "test".to_string(),
            model: "test-model".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_any_request() {
        let client = CompletionClient::new(dummy_config());
        let result = client.extract_cards(Some("   "), &[]).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_oversized_description_is_rejected() {
        let client = CompletionClient::new(dummy_config());
        let long = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        let result = client.extract_cards(Some(&long), &[]).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_oversized_description_is_allowed_with_images() {
        // The length bound applies to the text-only variant; with images
        // the call proceeds (and here fails at the unreachable endpoint).
        let client = CompletionClient::new(dummy_config());
        let long = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        let result = client.extract_cards(Some(&long), &[vec![1, 2, 3]]).await;
        assert!(matches!(
            result,
            Err(ServiceError::ExternalService { .. })
        ));
    }

    #[test]
    fn test_extract_json_blob_from_prose() {
        let text = "Sure! Here are the cards: [{\"name\": \"Zoro\"}] Hope that helps.";
        assert_eq!(extract_json_blob(text), Some("[{\"name\": \"Zoro\"}]"));
    }

    #[test]
    fn test_extract_json_blob_ignores_braces_in_strings() {
        let text = "{\"name\": \"weird } name\", \"set_name\": \"OP01\"}";
        assert_eq!(extract_json_blob(text), Some(text));
    }

    #[test]
    fn test_extract_json_blob_unbalanced() {
        assert_eq!(extract_json_blob("no json here"), None);
        assert_eq!(extract_json_blob("{\"name\": \"Zoro\""), None);
    }

    #[test]
    fn test_bare_object_becomes_one_element_list() {
        let content = r#"{"name": "Zoro", "set_name": "OP01", "card_number": "025"}"#;
        let candidates = parse_candidates(content, "", false, today()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Zoro");
        assert_eq!(candidates[0].card_number, "OP01-025");
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let candidates = parse_candidates("{}", "", false, today()).unwrap();
        let candidate = &candidates[0];
        assert_eq!(candidate.name, "Unknown Card");
        assert_eq!(candidate.quantity, 1);
        assert_eq!(candidate.purchase_price_original, Decimal::ZERO);
        assert_eq!(candidate.original_currency, "SGD");
        assert_eq!(candidate.purchase_date, today());
    }

    #[test]
    fn test_card_number_not_double_prefixed() {
        assert_eq!(combine_card_number("OP01", "OP01025"), "OP01-025");
        assert_eq!(combine_card_number("OP01", "025"), "OP01-025");
        assert_eq!(combine_card_number("OP01", "OP01-025"), "OP01-025");
        assert_eq!(combine_card_number("", "025"), "025");
        assert_eq!(combine_card_number("OP01", ""), "");
    }

    #[test]
    fn test_parallel_leader_override_from_output() {
        let content = r#"[{"name": "Zoro", "rarity": "P/L"}]"#;
        let candidates = parse_candidates(content, "", false, today()).unwrap();
        assert_eq!(candidates[0].rarity, PARALLEL_LEADER);
    }

    #[test]
    fn test_parallel_leader_override_from_input() {
        let content = r#"[{"name": "Zoro", "rarity": "Rare"}]"#;
        let description = "got the PL Zoro today";
        let candidates = parse_candidates(content, description, false, today()).unwrap();
        assert_eq!(candidates[0].rarity, PARALLEL_LEADER);

        let description = "a Parallel Leader print";
        let candidates = parse_candidates(content, description, false, today()).unwrap();
        assert_eq!(candidates[0].rarity, PARALLEL_LEADER);
    }

    #[test]
    fn test_pl_must_be_a_standalone_token() {
        assert!(!mentions_parallel_leader("a plain description"));
        assert!(mentions_parallel_leader("the P/L version"));
        assert!(mentions_parallel_leader("rarity: PL"));
    }

    #[test]
    fn test_multi_image_forces_quantity_one() {
        let content = r#"[{"name": "Zoro", "quantity": 4}, {"name": "Luffy", "quantity": 2}]"#;
        let candidates = parse_candidates(content, "", true, today()).unwrap();
        assert!(candidates.iter().all(|c| c.quantity == 1));

        // Without the multi-image override the proposed quantity stands.
        let candidates = parse_candidates(content, "", false, today()).unwrap();
        assert_eq!(candidates[0].quantity, 4);
    }

    #[test]
    fn test_currency_inferred_from_symbols() {
        assert_eq!(infer_currency("paid $25 each"), "USD");
        assert_eq!(infer_currency("paid S$30"), "SGD");
        assert_eq!(infer_currency("paid ¥1200"), "JPY");
        assert_eq!(infer_currency("paid €10"), "EUR");
        assert_eq!(infer_currency("no price mentioned"), "SGD");
    }

    #[test]
    fn test_explicit_currency_wins_over_inference() {
        let content = r#"[{"name": "Zoro", "original_currency": "jpy"}]"#;
        let candidates = parse_candidates(content, "paid $25", false, today()).unwrap();
        assert_eq!(candidates[0].original_currency, "JPY");
    }

    #[test]
    fn test_example_scenario_two_zoro_copies() {
        // Mirrors the model's expected answer for: "I got 2 copies of Zoro
        // from OP01, a Super Rare for $25 each".
        let content = r#"[{
            "name": "Zoro",
            "set_name": "OP01",
            "card_number": "025",
            "rarity": "Super Rare",
            "quantity": 2,
            "purchase_price_original": 25.0
        }]"#;
        let description = "I got 2 copies of Zoro from OP01, a Super Rare for $25 each";
        let candidates = parse_candidates(content, description, false, today()).unwrap();
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.name, "Zoro");
        assert_eq!(candidate.set_name, "OP01");
        assert_eq!(candidate.rarity, "Super Rare");
        assert_eq!(candidate.quantity, 2);
        assert_eq!(candidate.original_currency, "USD");
        assert_eq!(candidate.purchase_price_original, Decimal::new(2500, 2));
    }

    #[test]
    fn test_garbage_content_is_invalid_response() {
        assert!(matches!(
            parse_candidates("the model rambled with no JSON", "", false, today()),
            Err(ServiceError::InvalidResponse)
        ));
        assert!(matches!(
            parse_candidates("42", "", false, today()),
            Err(ServiceError::InvalidResponse)
        ));
    }
}
