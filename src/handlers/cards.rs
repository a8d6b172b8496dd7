use crate::schemas::{ApiResponse, AppState, ErrorResponse, error_response};
use crate::store::{self, cards::CardInput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use model::entities::card;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating or replacing a card
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CardRequest {
    /// Card name
    #[validate(length(min = 1))]
    pub name: String,
    /// Set the card belongs to, e.g. "OP01"
    pub set_name: Option<String>,
    /// Card number, ideally in "<SET>-<NUMBER>" form
    pub card_number: Option<String>,
    /// Rarity label
    pub rarity: Option<String>,
    /// Color label
    pub color: Option<String>,
    /// Number of identical copies (default: 1)
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    /// Price paid, in the original currency (default: 0)
    pub purchase_price_original: Option<Decimal>,
    /// ISO 4217 code of the purchase currency (default: "SGD")
    #[validate(length(equal = 3))]
    pub original_currency: Option<String>,
    /// Current estimated value in SGD (default: 0)
    pub current_value_sgd: Option<Decimal>,
    /// Image reference
    pub image_url: Option<String>,
    /// Purchase date (YYYY-MM-DD)
    pub purchase_date: NaiveDate,
    /// Owning collection, if any
    pub collection_id: Option<i32>,
}

impl From<CardRequest> for CardInput {
    fn from(request: CardRequest) -> Self {
        Self {
            name: request.name,
            set_name: request.set_name,
            card_number: request.card_number,
            rarity: request.rarity,
            color: request.color,
            quantity: request.quantity.unwrap_or(1),
            purchase_price_original: request.purchase_price_original.unwrap_or(Decimal::ZERO),
            original_currency: request
                .original_currency
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| common::BASE_CURRENCY.to_string()),
            current_value_sgd: request.current_value_sgd.unwrap_or(Decimal::ZERO),
            image_url: request.image_url,
            purchase_date: request.purchase_date,
            collection_id: request.collection_id,
        }
    }
}

/// Card response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CardResponse {
    pub id: i32,
    pub name: String,
    pub set_name: Option<String>,
    pub card_number: Option<String>,
    pub rarity: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub purchase_price_original: Decimal,
    pub original_currency: String,
    pub purchase_price_sgd: Decimal,
    pub current_value_sgd: Decimal,
    pub image_url: Option<String>,
    pub purchase_date: NaiveDate,
    pub collection_id: Option<i32>,
}

impl From<card::Model> for CardResponse {
    fn from(model: card::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            set_name: model.set_name,
            card_number: model.card_number,
            rarity: model.rarity,
            color: model.color,
            quantity: model.quantity,
            purchase_price_original: model.purchase_price_original,
            original_currency: model.original_currency,
            purchase_price_sgd: model.purchase_price_sgd,
            current_value_sgd: model.current_value_sgd,
            image_url: model.image_url,
            purchase_date: model.purchase_date,
            collection_id: model.collection_id,
        }
    }
}

/// Create a new card
#[utoipa::path(
    post,
    path = "/api/v1/cards",
    tag = "cards",
    request_body = CardRequest,
    responses(
        (status = 201, description = "Card created successfully", body = ApiResponse<CardResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_card(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CardRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CardResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("creating card '{}'", request.name);

    let saved = store::cards::create_card(&state.db, state.services.rates.as_ref(), request.into())
        .await
        .map_err(|e| {
            error!("failed to create card: {}", e);
            error_response(e.status(), e.code(), &e.to_string())
        })?;

    if let Some(warning) = &saved.warning {
        warn!("card {} saved with degraded valuation", saved.card.id);
        let response = ApiResponse {
            data: CardResponse::from(saved.card),
            message: warning.clone(),
            success: true,
        };
        return Ok((StatusCode::CREATED, Json(response)));
    }

    info!("card {} created", saved.card.id);
    let response = ApiResponse {
        data: CardResponse::from(saved.card),
        message: "Card created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all cards, ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/cards",
    tag = "cards",
    responses(
        (status = 200, description = "Cards retrieved successfully", body = ApiResponse<Vec<CardResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_cards(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CardResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let cards = card::Entity::find()
        .order_by_asc(card::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("failed to retrieve cards: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve cards",
            )
        })?;

    debug!("retrieved {} card(s)", cards.len());
    let response = ApiResponse {
        data: cards.into_iter().map(CardResponse::from).collect(),
        message: "Cards retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific card by ID
#[utoipa::path(
    get,
    path = "/api/v1/cards/{card_id}",
    tag = "cards",
    params(
        ("card_id" = i32, Path, description = "Card ID"),
    ),
    responses(
        (status = 200, description = "Card retrieved successfully", body = ApiResponse<CardResponse>),
        (status = 404, description = "Card not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_card(
    Path(card_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CardResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match card::Entity::find_by_id(card_id).one(&state.db).await {
        Ok(Some(model)) => {
            let response = ApiResponse {
                data: CardResponse::from(model),
                message: "Card retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("card {} not found", card_id);
            Err(error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Card with ID {} not found", card_id),
            ))
        }
        Err(e) => {
            error!("failed to retrieve card {}: {}", card_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve card",
            ))
        }
    }
}

/// Replace a card's fields
///
/// The cached SGD purchase price is recomputed whenever the original
/// price or currency changed.
#[utoipa::path(
    put,
    path = "/api/v1/cards/{card_id}",
    tag = "cards",
    params(
        ("card_id" = i32, Path, description = "Card ID"),
    ),
    request_body = CardRequest,
    responses(
        (status = 200, description = "Card updated successfully", body = ApiResponse<CardResponse>),
        (status = 404, description = "Card not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_card(
    Path(card_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CardRequest>>,
) -> Result<Json<ApiResponse<CardResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("updating card {}", card_id);

    let saved = store::cards::update_card(
        &state.db,
        state.services.rates.as_ref(),
        card_id,
        request.into(),
    )
    .await
    .map_err(|e| {
        error!("failed to update card {}: {}", card_id, e);
        error_response(e.status(), e.code(), &e.to_string())
    })?;

    let message = match &saved.warning {
        Some(warning) => warning.clone(),
        None => "Card updated successfully".to_string(),
    };

    info!("card {} updated", card_id);
    let response = ApiResponse {
        data: CardResponse::from(saved.card),
        message,
        success: true,
    };
    Ok(Json(response))
}

/// Delete a card
#[utoipa::path(
    delete,
    path = "/api/v1/cards/{card_id}",
    tag = "cards",
    params(
        ("card_id" = i32, Path, description = "Card ID"),
    ),
    responses(
        (status = 200, description = "Card deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Card not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_card(
    Path(card_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    match card::Entity::delete_by_id(card_id).exec(&state.db).await {
        Ok(result) if result.rows_affected > 0 => {
            info!("card {} deleted", card_id);
            let response = ApiResponse {
                data: format!("Card {} deleted", card_id),
                message: "Card deleted successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(_) => {
            warn!("card {} not found for deletion", card_id);
            Err(error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Card with ID {} not found", card_id),
            ))
        }
        Err(e) => {
            error!("failed to delete card {}: {}", card_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to delete card",
            ))
        }
    }
}
