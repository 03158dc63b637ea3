// src/db/organization_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::organization::{Location, Project};

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CONSULTAS DE EXISTÊNCIA (usadas pelo validador de contexto)
    // =========================================================================

    pub async fn organization_exists(&self, organization_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM organizations WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn location_exists(&self, organization_id: Uuid, location_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM locations
                WHERE id = $2 AND organization_id = $1 AND is_deleted = FALSE
            )
            "#,
        )
        .bind(organization_id)
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn project_exists(&self, organization_id: Uuid, project_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM projects
                WHERE id = $2 AND organization_id = $1 AND is_deleted = FALSE
            )
            "#,
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    // =========================================================================
    //  RESOLUÇÃO DE LOCAIS
    // =========================================================================

    /// Todos os locais vivos da organização.
    pub async fn location_ids_for_organization<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM locations WHERE organization_id = $1 AND is_deleted = FALSE ORDER BY id",
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }

    /// (obra, local dono) para as obras vivas informadas.
    /// Obras excluídas ou inexistentes simplesmente não aparecem.
    pub async fn project_locations<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        project_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, Uuid)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT p.id, p.location_id
            FROM projects p
            JOIN locations l ON l.id = p.location_id AND l.is_deleted = FALSE
            WHERE p.organization_id = $1
              AND p.is_deleted = FALSE
              AND p.id = ANY($2)
            "#,
        )
        .bind(organization_id)
        .bind(project_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn project_location(&self, organization_id: Uuid, project_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let rows = self.project_locations(&self.pool, organization_id, &[project_id]).await?;
        Ok(rows.into_iter().next().map(|(_, location_id)| location_id))
    }

    // =========================================================================
    //  LOCAIS E OBRAS
    // =========================================================================

    pub async fn create_location<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        name: &str,
        address: Option<&str>,
        created_by: Uuid,
    ) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (organization_id, name, address, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organization_id, name, address, created_at, updated_at
            "#,
        )
        .bind(organization_id)
        .bind(name)
        .bind(address)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(location)
    }

    pub async fn create_project<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        location_id: Uuid,
        name: &str,
        project_number: Option<&str>,
        created_by: Uuid,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (organization_id, location_id, name, project_number, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, organization_id, location_id, name, project_number, created_at, updated_at
            "#,
        )
        .bind(organization_id)
        .bind(location_id)
        .bind(name)
        .bind(project_number)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    /// Lista locais. `None` = todos da organização.
    pub async fn list_locations(
        &self,
        organization_id: Uuid,
        only: Option<&[Uuid]>,
    ) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, organization_id, name, address, created_at, updated_at
            FROM locations
            WHERE organization_id = $1
              AND is_deleted = FALSE
              AND ($2::uuid[] IS NULL OR id = ANY($2))
            ORDER BY name
            "#,
        )
        .bind(organization_id)
        .bind(only)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    /// Lista obras dos locais informados. `None` = todas da organização.
    pub async fn list_projects(
        &self,
        organization_id: Uuid,
        location_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, organization_id, location_id, name, project_number, created_at, updated_at
            FROM projects
            WHERE organization_id = $1
              AND is_deleted = FALSE
              AND ($2::uuid[] IS NULL OR location_id = ANY($2))
            ORDER BY name
            "#,
        )
        .bind(organization_id)
        .bind(location_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }
}
