use crate::schemas::{ApiResponse, AppState, ErrorResponse, error_response};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use model::entities::{card, expense};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating or replacing an expense
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ExpenseRequest {
    /// What the money was spent on
    #[validate(length(min = 1))]
    pub description: String,
    /// Amount in SGD
    pub amount_sgd: Decimal,
    /// Category label, e.g. "Supplies" or "Shipping"
    #[validate(length(min = 1))]
    pub category: String,
    /// Expense date (YYYY-MM-DD)
    pub expense_date: NaiveDate,
    /// Card this expense relates to, if any
    pub card_id: Option<i32>,
}

/// Expense response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: i32,
    pub description: String,
    pub amount_sgd: Decimal,
    pub category: String,
    pub expense_date: NaiveDate,
    pub card_id: Option<i32>,
}

impl From<expense::Model> for ExpenseResponse {
    fn from(model: expense::Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            amount_sgd: model.amount_sgd,
            category: model.category,
            expense_date: model.expense_date,
            card_id: model.card_id,
        }
    }
}

/// Total spend for one expense category
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryTotal {
    pub category: String,
    pub total_sgd: Decimal,
}

/// Validate that a referenced card exists.
async fn check_card_exists(
    state: &AppState,
    card_id: i32,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    match card::Entity::find_by_id(card_id).one(&state.db).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            warn!("linked card {} not found", card_id);
            Err(error_response(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                &format!("Card with ID {} not found", card_id),
            ))
        }
        Err(e) => {
            error!("failed to validate linked card {}: {}", card_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to validate linked card",
            ))
        }
    }
}

/// Record a new expense
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    tag = "expenses",
    request_body = ExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded successfully", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_expense(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ExpenseRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), (StatusCode, Json<ErrorResponse>)> {
    if let Some(card_id) = request.card_id {
        check_card_exists(&state, card_id).await?;
    }

    let new_expense = expense::ActiveModel {
        description: Set(request.description),
        amount_sgd: Set(request.amount_sgd),
        category: Set(request.category),
        expense_date: Set(request.expense_date),
        card_id: Set(request.card_id),
        ..Default::default()
    };

    match new_expense.insert(&state.db).await {
        Ok(model) => {
            info!("expense {} recorded", model.id);
            let response = ApiResponse {
                data: ExpenseResponse::from(model),
                message: "Expense recorded successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => {
            error!("failed to record expense: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to record expense",
            ))
        }
    }
}

/// Get all expenses, newest first
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    tag = "expenses",
    responses(
        (status = 200, description = "Expenses retrieved successfully", body = ApiResponse<Vec<ExpenseResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expenses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ExpenseResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let expenses = expense::Entity::find()
        .order_by_desc(expense::Column::ExpenseDate)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("failed to retrieve expenses: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve expenses",
            )
        })?;

    let response = ApiResponse {
        data: expenses.into_iter().map(ExpenseResponse::from).collect(),
        message: "Expenses retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get per-category expense totals
#[utoipa::path(
    get,
    path = "/api/v1/expenses/summary",
    tag = "expenses",
    responses(
        (status = 200, description = "Expense summary retrieved successfully", body = ApiResponse<Vec<CategoryTotal>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expense_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryTotal>>>, (StatusCode, Json<ErrorResponse>)> {
    let expenses = expense::Entity::find().all(&state.db).await.map_err(|e| {
        error!("failed to retrieve expenses for summary: {}", e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORE_ERROR",
            "Failed to retrieve expenses",
        )
    })?;

    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert(Decimal::ZERO) += expense.amount_sgd;
    }

    debug!("summarized {} expense categories", totals.len());
    let response = ApiResponse {
        data: totals
            .into_iter()
            .map(|(category, total_sgd)| CategoryTotal {
                category,
                total_sgd,
            })
            .collect(),
        message: "Expense summary retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific expense by ID
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ApiResponse<ExpenseResponse>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match expense::Entity::find_by_id(expense_id).one(&state.db).await {
        Ok(Some(model)) => {
            let response = ApiResponse {
                data: ExpenseResponse::from(model),
                message: "Expense retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("Expense with ID {} not found", expense_id),
        )),
        Err(e) => {
            error!("failed to retrieve expense {}: {}", expense_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to retrieve expense",
            ))
        }
    }
}

/// Replace an expense
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    request_body = ExpenseRequest,
    responses(
        (status = 200, description = "Expense updated successfully", body = ApiResponse<ExpenseResponse>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ExpenseRequest>>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let existing = match expense::Entity::find_by_id(expense_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Expense with ID {} not found", expense_id),
            ));
        }
        Err(e) => {
            error!("failed to look up expense {}: {}", expense_id, e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to look up expense",
            ));
        }
    };

    if let Some(card_id) = request.card_id {
        check_card_exists(&state, card_id).await?;
    }

    let mut active: expense::ActiveModel = existing.into();
    active.description = Set(request.description);
    active.amount_sgd = Set(request.amount_sgd);
    active.category = Set(request.category);
    active.expense_date = Set(request.expense_date);
    active.card_id = Set(request.card_id);

    match active.update(&state.db).await {
        Ok(model) => {
            info!("expense {} updated", expense_id);
            let response = ApiResponse {
                data: ExpenseResponse::from(model),
                message: "Expense updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(e) => {
            error!("failed to update expense {}: {}", expense_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to update expense",
            ))
        }
    }
}

/// Delete an expense
#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    match expense::Entity::delete_by_id(expense_id).exec(&state.db).await {
        Ok(result) if result.rows_affected > 0 => {
            info!("expense {} deleted", expense_id);
            let response = ApiResponse {
                data: format!("Expense {} deleted", expense_id),
                message: "Expense deleted successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(_) => Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("Expense with ID {} not found", expense_id),
        )),
        Err(e) => {
            error!("failed to delete expense {}: {}", expense_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to delete expense",
            ))
        }
    }
}
