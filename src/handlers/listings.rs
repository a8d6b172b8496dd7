use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Query, State},
    response::Json,
};
use common::PriceListing;
use serde::{Deserialize, Serialize};
use services::pricing::normalize_card_number;
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the live price lookup
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ListingsQuery {
    /// Card number, raw ("OP01025") or normalized ("OP01-025")
    pub card_number: String,
}

/// Live marketplace listings for one card number
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListingsResponse {
    /// The normalized card number that was searched
    pub card_number: String,
    pub listings: Vec<PriceListing>,
}

/// Look up live marketplace listings for a card number
///
/// Best-effort: an unreachable marketplace or zero matches yields an
/// empty list, never an error.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    tag = "listings",
    params(ListingsQuery),
    responses(
        (status = 200, description = "Listings retrieved", body = ApiResponse<ListingsResponse>),
    )
)]
#[instrument(skip(state))]
pub async fn get_listings(
    Query(query): Query<ListingsQuery>,
    State(state): State<AppState>,
) -> Json<ApiResponse<ListingsResponse>> {
    let card_number = normalize_card_number(&query.card_number);
    let listings = state
        .services
        .prices
        .lookup_price(&query.card_number)
        .await
        .unwrap_or_default();

    debug!("{} listing(s) for {}", listings.len(), card_number);
    let message = if listings.is_empty() {
        "No matching listings found".to_string()
    } else {
        "Listings retrieved successfully".to_string()
    };

    Json(ApiResponse {
        data: ListingsResponse {
            card_number,
            listings,
        },
        message,
        success: true,
    })
}
