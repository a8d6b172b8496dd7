use crate::handlers::cards::CardResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, error_response};
use crate::store;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::{card, collection};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new collection
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCollectionRequest {
    /// Collection name (must be unique and non-empty)
    #[validate(length(min = 1))]
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
}

/// Request body for updating a collection
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCollectionRequest {
    /// Collection name (must stay unique)
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
}

/// Collection response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollectionResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<collection::Model> for CollectionResponse {
    fn from(model: collection::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

/// A collection together with its cards and total purchase value
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollectionDetailResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub cards: Vec<CardResponse>,
    /// Sum of SGD purchase price times quantity over the owned cards
    pub total_purchase_sgd: Decimal,
}

/// Create a new collection
#[utoipa::path(
    post,
    path = "/api/v1/collections",
    tag = "collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created successfully", body = ApiResponse<CollectionResponse>),
        (status = 409, description = "Collection name already exists", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_collection(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateCollectionRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CollectionResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    debug!("creating collection '{}'", request.name);

    let model = store::collections::create_collection(&state.db, &request.name, request.description)
        .await
        .map_err(|e| {
            warn!("failed to create collection '{}': {}", request.name, e);
            error_response(e.status(), e.code(), &e.to_string())
        })?;

    info!("collection {} created", model.id);
    let response = ApiResponse {
        data: CollectionResponse::from(model),
        message: "Collection created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all collections, ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/collections",
    tag = "collections",
    responses(
        (status = 200, description = "Collections retrieved successfully", body = ApiResponse<Vec<CollectionResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_collections(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CollectionResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let collections = collection::Entity::find()
        .order_by_asc(collection::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("failed to retrieve collections: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve collections",
            )
        })?;

    let response = ApiResponse {
        data: collections
            .into_iter()
            .map(CollectionResponse::from)
            .collect(),
        message: "Collections retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get one collection with its cards and total purchase value
#[utoipa::path(
    get,
    path = "/api/v1/collections/{collection_id}",
    tag = "collections",
    params(
        ("collection_id" = i32, Path, description = "Collection ID"),
    ),
    responses(
        (status = 200, description = "Collection retrieved successfully", body = ApiResponse<CollectionDetailResponse>),
        (status = 404, description = "Collection not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_collection(
    Path(collection_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CollectionDetailResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let model = match collection::Entity::find_by_id(collection_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("collection {} not found", collection_id);
            return Err(error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Collection with ID {} not found", collection_id),
            ));
        }
        Err(e) => {
            error!("failed to retrieve collection {}: {}", collection_id, e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve collection",
            ));
        }
    };

    let cards = card::Entity::find()
        .filter(card::Column::CollectionId.eq(collection_id))
        .order_by_asc(card::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("failed to retrieve collection cards: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve collection cards",
            )
        })?;

    let total_purchase_sgd: Decimal = cards
        .iter()
        .map(|c| c.purchase_price_sgd * Decimal::from(c.quantity))
        .sum();

    debug!(
        "collection {} holds {} card(s) worth {} SGD at purchase",
        collection_id,
        cards.len(),
        total_purchase_sgd
    );

    let response = ApiResponse {
        data: CollectionDetailResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            cards: cards.into_iter().map(CardResponse::from).collect(),
            total_purchase_sgd,
        },
        message: "Collection retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a collection
#[utoipa::path(
    put,
    path = "/api/v1/collections/{collection_id}",
    tag = "collections",
    params(
        ("collection_id" = i32, Path, description = "Collection ID"),
    ),
    request_body = UpdateCollectionRequest,
    responses(
        (status = 200, description = "Collection updated successfully", body = ApiResponse<CollectionResponse>),
        (status = 404, description = "Collection not found", body = ErrorResponse),
        (status = 409, description = "Collection name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_collection(
    Path(collection_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCollectionRequest>,
) -> Result<Json<ApiResponse<CollectionResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("updating collection {}", collection_id);

    let model = store::collections::update_collection(
        &state.db,
        collection_id,
        request.name,
        request.description,
    )
    .await
    .map_err(|e| {
        warn!("failed to update collection {}: {}", collection_id, e);
        error_response(e.status(), e.code(), &e.to_string())
    })?;

    info!("collection {} updated", collection_id);
    let response = ApiResponse {
        data: CollectionResponse::from(model),
        message: "Collection updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a collection and all cards it owns
#[utoipa::path(
    delete,
    path = "/api/v1/collections/{collection_id}",
    tag = "collections",
    params(
        ("collection_id" = i32, Path, description = "Collection ID"),
    ),
    responses(
        (status = 200, description = "Collection and cards deleted", body = ApiResponse<String>),
        (status = 404, description = "Collection not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_collection(
    Path(collection_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    let cards_deleted = store::collections::delete_collection(&state.db, collection_id)
        .await
        .map_err(|e| {
            warn!("failed to delete collection {}: {}", collection_id, e);
            error_response(e.status(), e.code(), &e.to_string())
        })?;

    info!(
        "collection {} deleted along with {} card(s)",
        collection_id, cards_deleted
    );
    let response = ApiResponse {
        data: format!(
            "Collection {} and {} card(s) deleted",
            collection_id, cards_deleted
        ),
        message: "Collection and cards deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
