use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Json;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use services::currency::RateProvider;
use services::extractor::CardExtractor;
use services::pricing::PriceSource;
use services::summary::Summarizer;
use utoipa::{OpenApi, ToSchema};

/// The external collaborators, behind trait objects so tests can inject
/// deterministic fakes. Constructed once at startup and shared.
pub struct ServiceRegistry {
    pub rates: Arc<dyn RateProvider>,
    pub extractor: Arc<dyn CardExtractor>,
    pub prices: Arc<dyn PriceSource>,
    pub summarizer: Arc<dyn Summarizer>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// External service clients
    pub services: Arc<ServiceRegistry>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error kind, for programmatic handling
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Build a typed error reply for a handler.
pub fn error_response(
    status: StatusCode,
    code: &str,
    message: &str,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::collections::create_collection,
        crate::handlers::collections::get_collections,
        crate::handlers::collections::get_collection,
        crate::handlers::collections::update_collection,
        crate::handlers::collections::delete_collection,
        crate::handlers::cards::create_card,
        crate::handlers::cards::get_cards,
        crate::handlers::cards::get_card,
        crate::handlers::cards::update_card,
        crate::handlers::cards::delete_card,
        crate::handlers::ingest::ingest_cards,
        crate::handlers::listings::get_listings,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::get_expenses,
        crate::handlers::expenses::get_expense_summary,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::wishlist::create_wishlist_item,
        crate::handlers::wishlist::get_wishlist_items,
        crate::handlers::wishlist::get_wishlist_item,
        crate::handlers::wishlist::update_wishlist_item,
        crate::handlers::wishlist::delete_wishlist_item,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            common::CardCandidate,
            common::PriceListing,
            crate::handlers::collections::CreateCollectionRequest,
            crate::handlers::collections::UpdateCollectionRequest,
            crate::handlers::collections::CollectionResponse,
            crate::handlers::collections::CollectionDetailResponse,
            crate::handlers::cards::CardRequest,
            crate::handlers::cards::CardResponse,
            crate::handlers::ingest::IngestRequest,
            crate::handlers::ingest::IngestResponse,
            crate::handlers::listings::ListingsResponse,
            crate::handlers::expenses::ExpenseRequest,
            crate::handlers::expenses::ExpenseResponse,
            crate::handlers::expenses::CategoryTotal,
            crate::handlers::wishlist::WishlistItemRequest,
            crate::handlers::wishlist::WishlistItemResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "collections", description = "Collection management endpoints"),
        (name = "cards", description = "Card management and AI ingestion endpoints"),
        (name = "listings", description = "Live marketplace price lookup"),
        (name = "expenses", description = "Expense bookkeeping endpoints"),
        (name = "wishlist", description = "Wishlist endpoints"),
    ),
    info(
        title = "Cardfolio API",
        description = "Personal trading-card collection tracker with multi-currency valuation and AI-assisted card ingestion",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
