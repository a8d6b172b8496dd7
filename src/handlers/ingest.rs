use crate::handlers::cards::CardResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, error_response};
use crate::store::{self, cards::CardInput};
use axum::{extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use common::CardCandidate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use services::ServiceError;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for AI-assisted card ingestion
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct IngestRequest {
    /// Free-text description of the cards (max 500 characters)
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Base64-encoded card photos, one physical card per image
    pub images: Option<Vec<String>>,
    /// Look up live marketplace listings to seed the current value
    /// (default: false)
    pub enrich: Option<bool>,
}

/// Result of an ingestion run
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    /// The cards that were persisted
    pub cards: Vec<CardResponse>,
    /// Human-readable confirmation message
    pub confirmation: String,
    /// Non-fatal degradations, e.g. a failed currency conversion
    pub warnings: Vec<String>,
}

fn opt(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn candidate_input(candidate: &CardCandidate, current_value_sgd: Decimal) -> CardInput {
    CardInput {
        name: candidate.name.clone(),
        set_name: opt(candidate.set_name.clone()),
        card_number: opt(candidate.card_number.clone()),
        rarity: opt(candidate.rarity.clone()),
        color: opt(candidate.color.clone()),
        quantity: candidate.quantity,
        purchase_price_original: candidate.purchase_price_original,
        original_currency: candidate.original_currency.clone(),
        current_value_sgd,
        image_url: opt(candidate.image_url.clone()),
        purchase_date: candidate.purchase_date,
        collection_id: None,
    }
}

fn service_error_response(e: &ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    error_response(status, e.code(), &e.to_string())
}

/// Ingest cards from a description and/or photos
///
/// The full pipeline: extract candidates via the completion service,
/// convert each purchase price to SGD, optionally enrich the current
/// value from live listings, persist everything in one transaction, and
/// generate a confirmation message.
#[utoipa::path(
    post,
    path = "/api/v1/cards/ingest",
    tag = "cards",
    request_body = IngestRequest,
    responses(
        (status = 201, description = "Cards ingested successfully", body = ApiResponse<IngestResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "AI extraction failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn ingest_cards(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<IngestRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<IngestResponse>>), (StatusCode, Json<ErrorResponse>)> {
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    // Decode the uploaded images up front. The buffers live only for this
    // request and are dropped on every path out of it.
    let mut images = Vec::new();
    for (index, encoded) in request.images.iter().flatten().enumerate() {
        let decoded = BASE64.decode(encoded.as_bytes()).map_err(|_| {
            warn!("rejected ingestion: image {} is not valid base64", index);
            error_response(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                &format!("Image {} is not valid base64", index),
            )
        })?;
        images.push(decoded);
    }

    if description.is_none() && images.is_empty() {
        warn!("rejected ingestion: no description and no images");
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Provide a card description or at least one image",
        ));
    }

    debug!(
        "ingesting cards from {} image(s) and description: {:?}",
        images.len(),
        description
    );

    let candidates = state
        .services
        .extractor
        .extract_cards(description, &images)
        .await
        .map_err(|e| {
            warn!("card extraction failed: {}", e);
            service_error_response(&e)
        })?;

    if candidates.is_empty() {
        warn!("extraction produced no candidates");
        return Err(error_response(
            StatusCode::BAD_GATEWAY,
            "INVALID_RESPONSE",
            "The AI did not recognize any cards",
        ));
    }

    // Best-effort enrichment: a listing price seeds the current value,
    // and any lookup failure changes nothing.
    let enrich = request.enrich.unwrap_or(false);
    let mut inputs = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let mut current_value_sgd = Decimal::ZERO;
        if enrich && !candidate.card_number.is_empty() {
            if let Some(listings) = state
                .services
                .prices
                .lookup_price(&candidate.card_number)
                .await
            {
                if let Some(listing) = listings.first() {
                    debug!(
                        "seeding current value of {} from listing at {}",
                        candidate.card_number, listing.price
                    );
                    current_value_sgd = Decimal::from(listing.price);
                }
            }
        }
        inputs.push(candidate_input(candidate, current_value_sgd));
    }

    let (models, warnings) =
        store::cards::create_cards(&state.db, state.services.rates.as_ref(), inputs)
            .await
            .map_err(|e| {
                error!("failed to persist ingested cards: {}", e);
                error_response(e.status(), e.code(), &e.to_string())
            })?;

    let confirmation = state.services.summarizer.summarize(&candidates).await;
    info!("ingested {} card(s)", models.len());

    let response = ApiResponse {
        data: IngestResponse {
            cards: models.into_iter().map(CardResponse::from).collect(),
            confirmation,
            warnings,
        },
        message: "Cards ingested successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}
