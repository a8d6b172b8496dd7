use crate::schemas::{ApiResponse, AppState, ErrorResponse, error_response};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::wishlist_item::{self, Priority};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating or replacing a wishlist item
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct WishlistItemRequest {
    /// Name of the wanted card
    #[validate(length(min = 1))]
    pub card_name: String,
    /// Set the card belongs to
    pub set_name: Option<String>,
    /// Price at which buying feels right, in SGD (default: 0)
    pub target_price_sgd: Option<Decimal>,
    /// "High", "Medium" or "Low" (default: "Medium")
    pub priority: Option<String>,
}

/// Wishlist item response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WishlistItemResponse {
    pub id: i32,
    pub card_name: String,
    pub set_name: Option<String>,
    pub target_price_sgd: Decimal,
    pub priority: String,
}

impl From<wishlist_item::Model> for WishlistItemResponse {
    fn from(model: wishlist_item::Model) -> Self {
        Self {
            id: model.id,
            card_name: model.card_name,
            set_name: model.set_name,
            target_price_sgd: model.target_price_sgd,
            priority: format!("{:?}", model.priority),
        }
    }
}

// Helper function to parse a priority label
fn parse_priority(label: Option<&str>) -> Result<Priority, String> {
    match label {
        None => Ok(Priority::default()),
        Some("High") => Ok(Priority::High),
        Some("Medium") => Ok(Priority::Medium),
        Some("Low") => Ok(Priority::Low),
        Some(other) => Err(format!(
            "Invalid priority '{}'. Valid values: High, Medium, Low",
            other
        )),
    }
}

/// Add a card to the wishlist
#[utoipa::path(
    post,
    path = "/api/v1/wishlist",
    tag = "wishlist",
    request_body = WishlistItemRequest,
    responses(
        (status = 201, description = "Wishlist item added successfully", body = ApiResponse<WishlistItemResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_wishlist_item(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<WishlistItemRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<WishlistItemResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    let priority = parse_priority(request.priority.as_deref()).map_err(|message| {
        warn!("rejected wishlist item: {}", message);
        error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", &message)
    })?;

    let new_item = wishlist_item::ActiveModel {
        card_name: Set(request.card_name),
        set_name: Set(request.set_name),
        target_price_sgd: Set(request.target_price_sgd.unwrap_or(Decimal::ZERO)),
        priority: Set(priority),
        ..Default::default()
    };

    match new_item.insert(&state.db).await {
        Ok(model) => {
            info!("wishlist item {} added", model.id);
            let response = ApiResponse {
                data: WishlistItemResponse::from(model),
                message: "Wishlist item added successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => {
            error!("failed to add wishlist item: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to add wishlist item",
            ))
        }
    }
}

/// Get the wishlist, highest priority first
#[utoipa::path(
    get,
    path = "/api/v1/wishlist",
    tag = "wishlist",
    responses(
        (status = 200, description = "Wishlist retrieved successfully", body = ApiResponse<Vec<WishlistItemResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_wishlist_items(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<WishlistItemResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let mut items = wishlist_item::Entity::find()
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("failed to retrieve wishlist: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve wishlist",
            )
        })?;

    // Priority is stored as a label; rank it in code so High sorts first.
    items.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| a.card_name.cmp(&b.card_name))
    });

    let response = ApiResponse {
        data: items.into_iter().map(WishlistItemResponse::from).collect(),
        message: "Wishlist retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific wishlist item by ID
#[utoipa::path(
    get,
    path = "/api/v1/wishlist/{item_id}",
    tag = "wishlist",
    params(
        ("item_id" = i32, Path, description = "Wishlist item ID"),
    ),
    responses(
        (status = 200, description = "Wishlist item retrieved successfully", body = ApiResponse<WishlistItemResponse>),
        (status = 404, description = "Wishlist item not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_wishlist_item(
    Path(item_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WishlistItemResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match wishlist_item::Entity::find_by_id(item_id).one(&state.db).await {
        Ok(Some(model)) => {
            let response = ApiResponse {
                data: WishlistItemResponse::from(model),
                message: "Wishlist item retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("Wishlist item with ID {} not found", item_id),
        )),
        Err(e) => {
            error!("failed to retrieve wishlist item {}: {}", item_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve wishlist item",
            ))
        }
    }
}

/// Replace a wishlist item
#[utoipa::path(
    put,
    path = "/api/v1/wishlist/{item_id}",
    tag = "wishlist",
    params(
        ("item_id" = i32, Path, description = "Wishlist item ID"),
    ),
    request_body = WishlistItemRequest,
    responses(
        (status = 200, description = "Wishlist item updated successfully", body = ApiResponse<WishlistItemResponse>),
        (status = 404, description = "Wishlist item not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_wishlist_item(
    Path(item_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<WishlistItemRequest>>,
) -> Result<Json<ApiResponse<WishlistItemResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let priority = parse_priority(request.priority.as_deref()).map_err(|message| {
        error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", &message)
    })?;

    let existing = match wishlist_item::Entity::find_by_id(item_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Wishlist item with ID {} not found", item_id),
            ));
        }
        Err(e) => {
            error!("failed to look up wishlist item {}: {}", item_id, e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to look up wishlist item",
            ));
        }
    };

    let mut active: wishlist_item::ActiveModel = existing.into();
    active.card_name = Set(request.card_name);
    active.set_name = Set(request.set_name);
    active.target_price_sgd = Set(request.target_price_sgd.unwrap_or(Decimal::ZERO));
    active.priority = Set(priority);

    match active.update(&state.db).await {
        Ok(model) => {
            info!("wishlist item {} updated", item_id);
            let response = ApiResponse {
                data: WishlistItemResponse::from(model),
                message: "Wishlist item updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(e) => {
            error!("failed to update wishlist item {}: {}", item_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to update wishlist item",
            ))
        }
    }
}

/// Delete a wishlist item
#[utoipa::path(
    delete,
    path = "/api/v1/wishlist/{item_id}",
    tag = "wishlist",
    params(
        ("item_id" = i32, Path, description = "Wishlist item ID"),
    ),
    responses(
        (status = 200, description = "Wishlist item deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Wishlist item not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_wishlist_item(
    Path(item_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    match wishlist_item::Entity::delete_by_id(item_id).exec(&state.db).await {
        Ok(result) if result.rows_affected > 0 => {
            info!("wishlist item {} deleted", item_id);
            let response = ApiResponse {
                data: format!("Wishlist item {} deleted", item_id),
                message: "Wishlist item deleted successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(_) => Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("Wishlist item with ID {} not found", item_id),
        )),
        Err(e) => {
            error!("failed to delete wishlist item {}: {}", item_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to delete wishlist item",
            ))
        }
    }
}
