// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::assignment::ContextType,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
///
/// Avalia a permissão na organização do usuário autenticado. Superadmin passa direto.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        // A. Extrai Usuário
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        let identity = &user.0;

        // B. Superadmin
        let is_superadmin = app_state
            .access_service
            .is_superadmin(identity.user_id)
            .await
            .map_err(|e| e.to_api_error(&locale))?;
        if is_superadmin {
            return Ok(RequirePermission(PhantomData));
        }

        // C. Verifica no Banco (nunca nos tokens da credencial)
        let required_perm = T::slug();
        let check = app_state
            .permission_service
            .check(
                identity.organization_id,
                identity.user_id,
                ContextType::Organization,
                identity.organization_id,
                required_perm,
            )
            .await
            .map_err(|e| e.to_api_error(&locale))?;

        if !check.allowed {
            return Err(AppError::PermissionDenied(required_perm.to_string()).to_api_error(&locale));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermAssignmentsWrite;
impl PermissionDef for PermAssignmentsWrite {
    fn slug() -> &'static str { "assignments:write" }
}

pub struct PermRolesWrite;
impl PermissionDef for PermRolesWrite {
    fn slug() -> &'static str { "roles:write" }
}

pub struct PermLocationsWrite;
impl PermissionDef for PermLocationsWrite {
    fn slug() -> &'static str { "locations:write" }
}
