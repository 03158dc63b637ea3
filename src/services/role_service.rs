// src/services/role_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::RoleRepository;
use crate::models::role::{CreateRolePayload, Role};

#[derive(Clone)]
pub struct RoleService {
    repo: RoleRepository,
    pool: PgPool,
}

impl RoleService {
    pub fn new(repo: RoleRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn create_custom_role(
        &self,
        organization_id: Uuid,
        payload: CreateRolePayload,
    ) -> Result<Role, AppError> {
        let role = self.repo.create_custom(&self.pool, organization_id, &payload).await?;
        tracing::info!(role_id = %role.id, %organization_id, "Cargo customizado criado");
        Ok(role)
    }

    pub async fn list_roles(&self, organization_id: Uuid) -> Result<Vec<Role>, AppError> {
        self.repo.list_visible(organization_id).await
    }
}
