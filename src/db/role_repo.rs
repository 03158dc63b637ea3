// src/db/role_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::{map_unique_violation, AppError};
use crate::models::role::{CreateRolePayload, Role};

const ROLE_COLUMNS: &str =
    "id, organization_id, name, category, access_level, description, created_at, updated_at";

#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cargo visível para a organização: padrão ou customizado dela.
    pub async fn find_visible<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        role_id: Uuid,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM roles
            WHERE id = $2
              AND is_deleted = FALSE
              AND (organization_id IS NULL OR organization_id = $1)
            "#
        );

        let role = sqlx::query_as::<_, Role>(&sql)
            .bind(organization_id)
            .bind(role_id)
            .fetch_optional(executor)
            .await?;

        Ok(role)
    }

    // Padrões primeiro, depois os da organização
    pub async fn list_visible(&self, organization_id: Uuid) -> Result<Vec<Role>, AppError> {
        let sql = format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM roles
            WHERE is_deleted = FALSE
              AND (organization_id IS NULL OR organization_id = $1)
            ORDER BY organization_id NULLS FIRST, name
            "#
        );

        let roles = sqlx::query_as::<_, Role>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    pub async fn create_custom<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        payload: &CreateRolePayload,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO roles (organization_id, name, category, access_level, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ROLE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Role>(&sql)
            .bind(organization_id)
            .bind(&payload.name)
            .bind(&payload.category)
            .bind(&payload.access_level)
            .bind(&payload.description)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, AppError::DuplicateRoleName))
    }
}
