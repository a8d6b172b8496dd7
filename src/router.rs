use crate::handlers::{
    cards::{create_card, delete_card, get_card, get_cards, update_card},
    collections::{
        create_collection, delete_collection, get_collection, get_collections, update_collection,
    },
    expenses::{
        create_expense, delete_expense, get_expense, get_expense_summary, get_expenses,
        update_expense,
    },
    health::health_check,
    ingest::ingest_cards,
    listings::get_listings,
    wishlist::{
        create_wishlist_item, delete_wishlist_item, get_wishlist_item, get_wishlist_items,
        update_wishlist_item,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Collection CRUD routes
        .route("/api/v1/collections", post(create_collection))
        .route("/api/v1/collections", get(get_collections))
        .route("/api/v1/collections/:collection_id", get(get_collection))
        .route("/api/v1/collections/:collection_id", put(update_collection))
        .route("/api/v1/collections/:collection_id", delete(delete_collection))
        // Card CRUD routes
        .route("/api/v1/cards", post(create_card))
        .route("/api/v1/cards", get(get_cards))
        // AI ingestion pipeline
        .route("/api/v1/cards/ingest", post(ingest_cards))
        .route("/api/v1/cards/:card_id", get(get_card))
        .route("/api/v1/cards/:card_id", put(update_card))
        .route("/api/v1/cards/:card_id", delete(delete_card))
        // Live marketplace price lookup
        .route("/api/v1/listings", get(get_listings))
        // Expense CRUD routes
        .route("/api/v1/expenses", post(create_expense))
        .route("/api/v1/expenses", get(get_expenses))
        .route("/api/v1/expenses/summary", get(get_expense_summary))
        .route("/api/v1/expenses/:expense_id", get(get_expense))
        .route("/api/v1/expenses/:expense_id", put(update_expense))
        .route("/api/v1/expenses/:expense_id", delete(delete_expense))
        // Wishlist CRUD routes
        .route("/api/v1/wishlist", post(create_wishlist_item))
        .route("/api/v1/wishlist", get(get_wishlist_items))
        .route("/api/v1/wishlist/:item_id", get(get_wishlist_item))
        .route("/api/v1/wishlist/:item_id", put(update_wishlist_item))
        .route("/api/v1/wishlist/:item_id", delete(delete_wishlist_item))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
