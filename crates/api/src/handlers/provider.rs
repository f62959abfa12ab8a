use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use slotbook_core::models::provider::{
    CreateProviderRequest, ProviderResponse, VerifyPasswordRequest, VerifyPasswordResponse,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{middleware::{auth, error_handling::AppError}, ApiState};

#[axum::debug_handler]
pub async fn create_provider(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateProviderRequest>,
) -> Result<(StatusCode, Json<ProviderResponse>), AppError> {
    // Hash password if provided
    let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(auth::hash_password(password)?),
        None => None,
    };

    let provider = state
        .service
        .register_provider(&payload.name, password_hash)
        .await?;
    info!("Registered provider {} ({})", provider.id, provider.name);

    Ok((StatusCode::CREATED, Json(provider.into())))
}

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProviderResponse>, AppError> {
    let provider = state.service.provider(id).await?;
    Ok(Json(provider.into()))
}

#[axum::debug_handler]
pub async fn verify_password(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerifyPasswordRequest>,
) -> Result<Json<VerifyPasswordResponse>, AppError> {
    let provider = state.service.provider(id).await?;
    let valid = auth::provider_accepts(&provider, &payload.password)?;

    Ok(Json(VerifyPasswordResponse { valid }))
}
