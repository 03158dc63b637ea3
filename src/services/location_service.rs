// src/services/location_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AssignmentRepository, OrganizationRepository, RoleRepository},
    models::{
        assignment::{ContextType, NewAssignment, ValidityWindow},
        organization::{CreateLocationPayload, CreateProjectPayload, Location, LocationCreated, Project},
    },
    services::{access_service::AccessService, context_validator::ContextValidator},
};

#[derive(Clone)]
pub struct LocationService {
    org_repo: OrganizationRepository,
    assignment_repo: AssignmentRepository,
    role_repo: RoleRepository,
    access_service: AccessService,
    validator: ContextValidator,
    pool: PgPool,
}

impl LocationService {
    pub fn new(
        org_repo: OrganizationRepository,
        assignment_repo: AssignmentRepository,
        role_repo: RoleRepository,
        access_service: AccessService,
        validator: ContextValidator,
        pool: PgPool,
    ) -> Self {
        Self { org_repo, assignment_repo, role_repo, access_service, validator, pool }
    }

    /// LÓGICA DE NEGÓCIO: cria o local e, na mesma transação, concede ao
    /// criador o cargo escolhido naquele local.
    pub async fn create_location_with_manager(
        &self,
        organization_id: Uuid,
        creator_id: Uuid,
        payload: CreateLocationPayload,
    ) -> Result<LocationCreated, AppError> {
        if let Some(role_id) = payload.manager_role_id {
            self.role_repo
                .find_visible(&self.pool, organization_id, role_id)
                .await?
                .ok_or(AppError::RoleNotFound)?;
        }

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o local
        let location = self
            .org_repo
            .create_location(&mut *tx, organization_id, &payload.name, payload.address.as_deref(), creator_id)
            .await?;

        // 3. Concede o cargo no novo local
        let manager_assignment_id = match payload.manager_role_id {
            Some(role_id) => {
                let grant = NewAssignment {
                    organization_id,
                    user_id: creator_id,
                    role_id,
                    context_type: ContextType::Location,
                    context_id: location.id,
                    trade_type: None,
                    is_primary: false,
                    window: ValidityWindow::default(),
                    actor_id: creator_id,
                };
                Some(self.assignment_repo.insert(&mut *tx, &grant).await?.id)
            }
            None => None,
        };

        // 4. Commit
        tx.commit().await?;

        tracing::info!(location_id = %location.id, %organization_id, "Local criado");

        Ok(LocationCreated {
            location,
            manager_assignment_id,
        })
    }

    pub async fn create_project(
        &self,
        organization_id: Uuid,
        creator_id: Uuid,
        payload: CreateProjectPayload,
    ) -> Result<Project, AppError> {
        self.validator
            .validate(ContextType::Location, payload.location_id, organization_id)
            .await?;

        let project = self
            .org_repo
            .create_project(
                &self.pool,
                organization_id,
                payload.location_id,
                &payload.name,
                payload.project_number.as_deref(),
                creator_id,
            )
            .await?;

        tracing::info!(project_id = %project.id, location_id = %project.location_id, "Obra criada");
        Ok(project)
    }

    /// Locais visíveis para o usuário (saída do resolvedor de acesso).
    pub async fn list_accessible_locations(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Location>, AppError> {
        let access = self
            .access_service
            .resolve_accessible_locations(user_id, organization_id)
            .await?;

        if access.is_org_wide {
            self.org_repo.list_locations(organization_id, None).await
        } else if access.location_ids.is_empty() {
            Ok(Vec::new())
        } else {
            self.org_repo
                .list_locations(organization_id, Some(access.location_ids.as_slice()))
                .await
        }
    }

    /// Obras dos locais visíveis para o usuário.
    pub async fn list_accessible_projects(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Project>, AppError> {
        let access = self
            .access_service
            .resolve_accessible_locations(user_id, organization_id)
            .await?;

        if access.is_org_wide {
            self.org_repo.list_projects(organization_id, None).await
        } else if access.location_ids.is_empty() {
            Ok(Vec::new())
        } else {
            self.org_repo
                .list_projects(organization_id, Some(access.location_ids.as_slice()))
                .await
        }
    }
}
