// src/handlers/assignments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{AppJson, AppQuery},
        i18n::Locale,
        rbac::{PermAssignmentsWrite, RequirePermission},
    },
    models::assignment::{
        AssignmentListQuery, AssignmentResponse, BulkCreateAssignmentsPayload, ContextType,
        CreateAssignmentPayload, TransferAssignmentsPayload, TransferResult,
        UpdateAssignmentPayload, UserAssignment, ValidateContextPayload,
    },
};

// =============================================================================
//  1. CRIAÇÃO
// =============================================================================

// POST /api/assignments
#[utoipa::path(
    post,
    path = "/api/assignments",
    tag = "Assignments",
    request_body = CreateAssignmentPayload,
    responses(
        (status = 201, description = "Atribuição criada", body = AssignmentResponse),
        (status = 404, description = "Contexto, cargo ou usuário inexistente"),
        (status = 409, description = "Atribuição idêntica já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermAssignmentsWrite>,
    AppJson(payload): AppJson<CreateAssignmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let assignment = app_state
        .assignment_service
        .create_assignment(user.0.organization_id, user.0.user_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

// POST /api/assignments/bulk
#[utoipa::path(
    post,
    path = "/api/assignments/bulk",
    tag = "Assignments",
    request_body = BulkCreateAssignmentsPayload,
    responses(
        (status = 201, description = "Atribuições criadas (tudo ou nada)", body = [AssignmentResponse])
    ),
    security(("api_jwt" = []))
)]
pub async fn create_bulk_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermAssignmentsWrite>,
    AppJson(payload): AppJson<BulkCreateAssignmentsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let assignments = app_state
        .assignment_service
        .create_bulk_assignments(user.0.organization_id, user.0.user_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(assignments)))
}

// =============================================================================
//  2. LEITURA
// =============================================================================

// GET /api/assignments
#[utoipa::path(
    get,
    path = "/api/assignments",
    tag = "Assignments",
    params(AssignmentListQuery),
    responses(
        (status = 200, description = "Página de atribuições: { data, total, page, page_size }"),
        (status = 403, description = "organization_id diferente da organização do usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppQuery(query): AppQuery<AssignmentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .assignment_service
        .get_assignments(user.0.organization_id, query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(page))
}

// GET /api/assignments/{id}
#[utoipa::path(
    get,
    path = "/api/assignments/{id}",
    tag = "Assignments",
    params(("id" = Uuid, Path, description = "ID da atribuição")),
    responses(
        (status = 200, body = AssignmentResponse),
        (status = 404, description = "Atribuição não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = app_state
        .assignment_service
        .get_assignment(user.0.organization_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignment))
}

// GET /api/users/{user_id}/assignments
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/assignments",
    tag = "Assignments",
    params(("user_id" = Uuid, Path, description = "ID do usuário")),
    responses((status = 200, body = [AssignmentResponse])),
    security(("api_jwt" = []))
)]
pub async fn list_user_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = app_state
        .assignment_service
        .get_user_assignments(user.0.organization_id, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignments))
}

// GET /api/users/{user_id}/assignments/active
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/assignments/active",
    tag = "Assignments",
    params(("user_id" = Uuid, Path, description = "ID do usuário")),
    responses((status = 200, description = "Atribuições ativas hoje", body = [UserAssignment])),
    security(("api_jwt" = []))
)]
pub async fn list_active_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = app_state
        .access_service
        .get_active_assignments(user.0.organization_id, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignments))
}

// GET /api/contexts/{context_type}/{context_id}/assignments
#[utoipa::path(
    get,
    path = "/api/contexts/{context_type}/{context_id}/assignments",
    tag = "Assignments",
    params(
        ("context_type" = String, Path, description = "organization | location | project"),
        ("context_id" = Uuid, Path, description = "ID do contexto")
    ),
    responses(
        (status = 200, body = [AssignmentResponse]),
        (status = 400, description = "Tipo de contexto desconhecido"),
        (status = 403, description = "Usuário sem acesso ao contexto")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_context_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((context_type, context_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let context_type: ContextType = context_type.parse().map_err(|e: AppError| e.to_api_error(&locale))?;

    let allowed = app_state
        .access_service
        .can_view_context(&user.0, context_type, context_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    if !allowed {
        return Err(AppError::ContextAccessDenied { context_type, context_id }.to_api_error(&locale));
    }

    let assignments = app_state
        .assignment_service
        .get_context_assignments(user.0.organization_id, context_type, context_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignments))
}

// POST /api/assignments/validate-context
#[utoipa::path(
    post,
    path = "/api/assignments/validate-context",
    tag = "Assignments",
    request_body = ValidateContextPayload,
    responses(
        (status = 200, description = "Contexto válido"),
        (status = 404, description = "Contexto não existe nesta organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_context(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<ValidateContextPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .assignment_service
        .validate_assignment_context(user.0.organization_id, payload.context_type, payload.context_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({ "valid": true })))
}

// =============================================================================
//  3. ATUALIZAÇÃO / EXCLUSÃO / TRANSFERÊNCIA
// =============================================================================

// PUT /api/assignments/{id}
#[utoipa::path(
    put,
    path = "/api/assignments/{id}",
    tag = "Assignments",
    params(("id" = Uuid, Path, description = "ID da atribuição")),
    request_body = UpdateAssignmentPayload,
    responses(
        (status = 200, body = AssignmentResponse),
        (status = 400, description = "Nenhum campo para atualizar"),
        (status = 404, description = "Atribuição não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermAssignmentsWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateAssignmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let assignment = app_state
        .assignment_service
        .update_assignment(user.0.organization_id, user.0.user_id, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignment))
}

// DELETE /api/assignments/{id}
#[utoipa::path(
    delete,
    path = "/api/assignments/{id}",
    tag = "Assignments",
    params(("id" = Uuid, Path, description = "ID da atribuição")),
    responses(
        (status = 204, description = "Atribuição excluída"),
        (status = 404, description = "Atribuição não encontrada ou já excluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermAssignmentsWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .assignment_service
        .delete_assignment(user.0.organization_id, user.0.user_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/assignments/transfer
#[utoipa::path(
    post,
    path = "/api/assignments/transfer",
    tag = "Assignments",
    request_body = TransferAssignmentsPayload,
    responses(
        (status = 200, body = TransferResult),
        (status = 409, description = "Nada para transferir")
    ),
    security(("api_jwt" = []))
)]
pub async fn transfer_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermAssignmentsWrite>,
    AppJson(payload): AppJson<TransferAssignmentsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .assignment_service
        .transfer_assignments(user.0.organization_id, user.0.user_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(result))
}
