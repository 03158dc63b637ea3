// src/handlers/access.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, extract::AppJson, i18n::Locale},
    models::access::{PermissionCheck, PermissionCheckPayload, ResolvedAccess, UserContext},
};

// GET /api/me/access
#[utoipa::path(
    get,
    path = "/api/me/access",
    tag = "Access",
    responses(
        (status = 200, description = "Locais acessíveis e tokens de contexto para a sessão", body = ResolvedAccess)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_access(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let access = app_state
        .access_service
        .resolve_accessible_locations(user.0.user_id, user.0.organization_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(access))
}

// GET /api/users/{user_id}/contexts
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/contexts",
    tag = "Access",
    params(("user_id" = Uuid, Path, description = "ID do usuário")),
    responses((status = 200, body = [UserContext])),
    security(("api_jwt" = []))
)]
pub async fn list_user_contexts(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let contexts = app_state
        .access_service
        .get_user_contexts(user.0.organization_id, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(contexts))
}

// POST /api/permissions/check
#[utoipa::path(
    post,
    path = "/api/permissions/check",
    tag = "Access",
    request_body = PermissionCheckPayload,
    responses((status = 200, description = "Decisão (sempre 200; negar não é erro)", body = PermissionCheck)),
    security(("api_jwt" = []))
)]
pub async fn check_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<PermissionCheckPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let check = app_state
        .permission_service
        .check(
            user.0.organization_id,
            payload.user_id,
            payload.context_type,
            payload.context_id,
            &payload.permission,
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(check))
}
