// src/handlers/locations.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::AppJson,
        i18n::Locale,
        rbac::{PermLocationsWrite, RequirePermission},
    },
    models::organization::{CreateLocationPayload, CreateProjectPayload, Location, LocationCreated, Project},
};

// =============================================================================
//  LOCAIS
// =============================================================================

// GET /api/locations
#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Locations",
    responses((status = 200, description = "Locais que o usuário pode ver", body = [Location])),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let locations = app_state
        .location_service
        .list_accessible_locations(user.0.organization_id, user.0.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(locations))
}

// POST /api/locations
#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "Locations",
    request_body = CreateLocationPayload,
    responses(
        (status = 201, description = "Local criado (com o cargo do criador, se pedido)", body = LocationCreated)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermLocationsWrite>,
    AppJson(payload): AppJson<CreateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let created = app_state
        .location_service
        .create_location_with_manager(user.0.organization_id, user.0.user_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// =============================================================================
//  OBRAS
// =============================================================================

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Locations",
    responses((status = 200, body = [Project])),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let projects = app_state
        .location_service
        .list_accessible_projects(user.0.organization_id, user.0.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(projects))
}

// POST /api/projects
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Locations",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, body = Project),
        (status = 404, description = "Local não existe nesta organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermLocationsWrite>,
    AppJson(payload): AppJson<CreateProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let project = app_state
        .location_service
        .create_project(user.0.organization_id, user.0.user_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(project)))
}
