//! API handlers for the synchronizer HTTP endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use common::{AccountId, UserId};

use crate::accounts::AccountManager;
use crate::api::models::*;
use crate::coordinator::SettlementCoordinator;
use crate::error::SyncError;
use crate::payload::CallbackPayload;
use crate::stats::StatsWindow;

pub struct SyncApiState {
    pub manager: Arc<AccountManager>,
    pub coordinator: Arc<SettlementCoordinator>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(error: SyncError) -> ApiError {
    let (status, code) = match &error {
        SyncError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        SyncError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
        SyncError::EngineUnavailable(_) => (StatusCode::BAD_GATEWAY, "ENGINE_UNAVAILABLE"),
        SyncError::ResolutionUnavailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "RESOLUTION_UNAVAILABLE")
        }
        SyncError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: error.to_string(),
                details: None,
            },
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    error_response(SyncError::Validation(message.into()))
}

/// Health check handler
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "accountsync".to_string(),
    })
}

/// Link a new account
pub async fn create_account(
    State(state): State<Arc<SyncApiState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let pair = state
        .manager
        .create_account(
            UserId(user_id),
            req.name,
            &req.access_token,
            req.notify_chat_id,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(AccountResponse::from(pair)))
}

/// List a user's accounts
pub async fn list_accounts(
    State(state): State<Arc<SyncApiState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state
        .manager
        .list_accounts(UserId(user_id))
        .await
        .map_err(error_response)?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// Get one account
pub async fn get_account(
    State(state): State<Arc<SyncApiState>>,
    Path((user_id, account_id)): Path<(i64, i64)>,
) -> Result<Json<AccountResponse>, ApiError> {
    let pair = state
        .manager
        .get_account(UserId(user_id), AccountId(account_id))
        .await
        .map_err(error_response)?;
    Ok(Json(AccountResponse::from(pair)))
}

/// Unlink an account
pub async fn delete_account(
    State(state): State<Arc<SyncApiState>>,
    Path((user_id, account_id)): Path<(i64, i64)>,
) -> Result<Json<AckResponse>, ApiError> {
    state
        .manager
        .delete_account(UserId(user_id), AccountId(account_id))
        .await
        .map_err(error_response)?;
    Ok(Json(AckResponse { success: true }))
}

/// Set the fiat amount filter
pub async fn set_filter(
    State(state): State<Arc<SyncApiState>>,
    Path((user_id, account_id)): Path<(i64, i64)>,
    Json(req): Json<SetFilterRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    state
        .manager
        .set_filter(
            UserId(user_id),
            AccountId(account_id),
            req.min_amount,
            req.max_amount,
        )
        .await
        .map_err(error_response)?;
    let pair = state
        .manager
        .get_account(UserId(user_id), AccountId(account_id))
        .await
        .map_err(error_response)?;
    Ok(Json(AccountResponse::from(pair)))
}

/// Flip auto-acceptance
pub async fn toggle_auto(
    State(state): State<Arc<SyncApiState>>,
    Path((user_id, account_id)): Path<(i64, i64)>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let enabled = state
        .manager
        .toggle_auto(UserId(user_id), AccountId(account_id))
        .await
        .map_err(error_response)?;
    Ok(Json(ToggleResponse {
        success: true,
        enabled,
    }))
}

/// Flip the active flag
pub async fn toggle_active(
    State(state): State<Arc<SyncApiState>>,
    Path((user_id, account_id)): Path<(i64, i64)>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let enabled = state
        .manager
        .toggle_active(UserId(user_id), AccountId(account_id))
        .await
        .map_err(error_response)?;
    Ok(Json(ToggleResponse {
        success: true,
        enabled,
    }))
}

/// Advance a settlement handshake by one step
pub async fn handle_callback(
    State(state): State<Arc<SyncApiState>>,
    Json(req): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, ApiError> {
    let payload = CallbackPayload::decode(&req.payload).map_err(error_response)?;
    let step = state
        .coordinator
        .handle(payload)
        .await
        .map_err(error_response)?;
    Ok(Json(CallbackResponse {
        success: true,
        step: StepView::from(step),
    }))
}

/// Take an order for manual processing
pub async fn take_order(
    State(state): State<Arc<SyncApiState>>,
    Json(req): Json<TakeOrderRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    state
        .coordinator
        .take_order(AccountId(req.account_id), &req.external_id)
        .await
        .map_err(error_response)?;
    Ok(Json(AckResponse { success: true }))
}

/// Settlement statistics over a window (default: day)
pub async fn get_stats(
    State(state): State<Arc<SyncApiState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse>, ApiError> {
    let window = match params.window.as_deref() {
        None => StatsWindow::Day,
        Some(raw) => StatsWindow::parse(raw)
            .ok_or_else(|| bad_request(format!("unknown stats window: '{}'", raw)))?,
    };

    let stats = state
        .manager
        .stats(UserId(user_id), window)
        .await
        .map_err(error_response)?;
    Ok(Json(StatsResponse {
        success: true,
        window: window.to_string(),
        empty: stats.is_none(),
        stats,
    }))
}
