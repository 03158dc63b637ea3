// src/services/assignment_service.rs

use std::collections::{BTreeSet, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AssignmentRepository, RoleRepository, UserRepository},
    models::assignment::{
        AssignmentChanges, AssignmentFilter, AssignmentListQuery, AssignmentResponse,
        BulkCreateAssignmentsPayload, ContextType, CreateAssignmentPayload, NewAssignment,
        Paginated, Pagination, TransferAssignmentsPayload, TransferResult,
        UpdateAssignmentPayload, ValidityWindow,
    },
    services::context_validator::ContextValidator,
};

/// Ciclo de vida das atribuições. Toda validação acontece antes de abrir a
/// transação; toda escrita com mais de um comando roda numa transação só.
#[derive(Clone)]
pub struct AssignmentService {
    repo: AssignmentRepository,
    role_repo: RoleRepository,
    user_repo: UserRepository,
    validator: ContextValidator,
    pool: PgPool,
}

impl AssignmentService {
    pub fn new(
        repo: AssignmentRepository,
        role_repo: RoleRepository,
        user_repo: UserRepository,
        validator: ContextValidator,
        pool: PgPool,
    ) -> Self {
        Self { repo, role_repo, user_repo, validator, pool }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    pub async fn create_assignment(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        payload: CreateAssignmentPayload,
    ) -> Result<AssignmentResponse, AppError> {
        // 1. Validações (nenhuma escrita ainda)
        let window = ValidityWindow::parse(payload.start_date.as_deref(), payload.end_date.as_deref())?;
        self.validator
            .validate(payload.context_type, payload.context_id, organization_id)
            .await?;
        self.ensure_role_visible(organization_id, payload.role_id).await?;
        self.ensure_users_exist(organization_id, &[payload.user_id]).await?;

        let new = NewAssignment {
            organization_id,
            user_id: payload.user_id,
            role_id: payload.role_id,
            context_type: payload.context_type,
            context_id: payload.context_id,
            trade_type: payload.trade_type,
            is_primary: payload.is_primary,
            window,
            actor_id,
        };

        // 2. Transação
        let mut tx = self.pool.begin().await?;

        if new.is_primary {
            self.user_repo
                .lock_for_update(&mut *tx, organization_id, &[new.user_id])
                .await?;
            self.repo
                .demote_other_primaries(&mut *tx, organization_id, new.user_id, new.context_type, None, actor_id)
                .await?;
        }
        let created = self.repo.insert(&mut *tx, &new).await?;

        tx.commit().await?;

        tracing::info!(
            assignment_id = %created.id,
            %organization_id,
            user_id = %created.user_id,
            context = %format!("{}:{}", created.context_type, created.context_id),
            "Atribuição criada"
        );

        self.get_assignment(organization_id, created.id).await
    }

    /// Tudo ou nada na escrita; a releitura enriquecida é best-effort.
    /// O tamanho da lista devolvida pode ser menor que o de `user_ids`.
    pub async fn create_bulk_assignments(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        payload: BulkCreateAssignmentsPayload,
    ) -> Result<Vec<AssignmentResponse>, AppError> {
        let window = ValidityWindow::parse(payload.start_date.as_deref(), payload.end_date.as_deref())?;

        // Contexto compartilhado: uma validação só
        self.validator
            .validate(payload.context_type, payload.context_id, organization_id)
            .await?;
        self.ensure_role_visible(organization_id, payload.role_id).await?;

        let mut user_ids = payload.user_ids.clone();
        let mut seen = HashSet::new();
        user_ids.retain(|id| seen.insert(*id));
        self.ensure_users_exist(organization_id, &user_ids).await?;

        let mut tx = self.pool.begin().await?;
        let mut created_ids = Vec::with_capacity(user_ids.len());

        if payload.is_primary {
            self.user_repo
                .lock_for_update(&mut *tx, organization_id, &user_ids)
                .await?;
        }

        for user_id in &user_ids {
            let new = NewAssignment {
                organization_id,
                user_id: *user_id,
                role_id: payload.role_id,
                context_type: payload.context_type,
                context_id: payload.context_id,
                trade_type: payload.trade_type.clone(),
                is_primary: payload.is_primary,
                window,
                actor_id,
            };

            // Qualquer falha aqui derruba o lote inteiro (drop do tx = rollback)
            if new.is_primary {
                self.repo
                    .demote_other_primaries(&mut *tx, organization_id, new.user_id, new.context_type, None, actor_id)
                    .await?;
            }
            let created = self.repo.insert(&mut *tx, &new).await?;
            created_ids.push(created.id);
        }

        tx.commit().await?;

        tracing::info!(
            %organization_id,
            count = created_ids.len(),
            context = %format!("{}:{}", payload.context_type, payload.context_id),
            "Atribuições criadas em lote"
        );

        let mut responses = Vec::with_capacity(created_ids.len());
        for id in created_ids {
            match self.repo.find_enriched(&self.pool, organization_id, id).await {
                Ok(Some(response)) => responses.push(response),
                Ok(None) => {
                    tracing::warn!(assignment_id = %id, "Atribuição criada não encontrada na releitura");
                }
                Err(e) => {
                    tracing::warn!(assignment_id = %id, "Falha ao reler atribuição criada: {}", e);
                }
            }
        }

        Ok(responses)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get_assignment(&self, organization_id: Uuid, id: Uuid) -> Result<AssignmentResponse, AppError> {
        self.repo
            .find_enriched(&self.pool, organization_id, id)
            .await?
            .ok_or(AppError::AssignmentNotFound)
    }

    pub async fn get_assignments(
        &self,
        organization_id: Uuid,
        query: AssignmentListQuery,
    ) -> Result<Paginated<AssignmentResponse>, AppError> {
        if query.organization_id.is_some_and(|requested| requested != organization_id) {
            return Err(AppError::OrganizationMismatch);
        }

        let pagination = Pagination::normalize(query.page, query.page_size);
        let filter = AssignmentFilter {
            organization_id,
            user_id: query.user_id,
            role_id: query.role_id,
            context_type: query.context_type,
            context_id: query.context_id,
            is_primary: query.is_primary,
            trade_type: query.trade_type,
            is_active: query.is_active,
        };

        let (data, total) = self.repo.list(&filter, pagination).await?;

        Ok(Paginated {
            data,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        })
    }

    pub async fn get_user_assignments(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<AssignmentResponse>, AppError> {
        let filter = AssignmentFilter {
            user_id: Some(user_id),
            ..AssignmentFilter::for_organization(organization_id)
        };
        self.repo.list_all(&filter).await
    }

    pub async fn get_context_assignments(
        &self,
        organization_id: Uuid,
        context_type: ContextType,
        context_id: Uuid,
    ) -> Result<Vec<AssignmentResponse>, AppError> {
        let filter = AssignmentFilter {
            context_type: Some(context_type),
            context_id: Some(context_id),
            ..AssignmentFilter::for_organization(organization_id)
        };
        self.repo.list_all(&filter).await
    }

    pub async fn validate_assignment_context(
        &self,
        organization_id: Uuid,
        context_type: ContextType,
        context_id: Uuid,
    ) -> Result<(), AppError> {
        self.validator.validate(context_type, context_id, organization_id).await
    }

    // =========================================================================
    //  ATUALIZAÇÃO / EXCLUSÃO
    // =========================================================================

    pub async fn update_assignment(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        id: Uuid,
        payload: UpdateAssignmentPayload,
    ) -> Result<AssignmentResponse, AppError> {
        let changes = AssignmentChanges::from_payload(payload)?;
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        if let Some(role_id) = changes.role_id {
            self.ensure_role_visible(organization_id, role_id).await?;
        }

        let promote = changes.is_primary == Some(true);
        let mut tx = self.pool.begin().await?;

        // Promoção: trava o dono antes da linha, na mesma ordem da criação
        if promote {
            let owner = self
                .repo
                .find_owner(&mut *tx, organization_id, id)
                .await?
                .ok_or(AppError::AssignmentNotFound)?;
            self.user_repo
                .lock_for_update(&mut *tx, organization_id, &[owner])
                .await?;
        }

        let current = self
            .repo
            .lock_by_id(&mut *tx, organization_id, id)
            .await?
            .ok_or(AppError::AssignmentNotFound)?;

        // A janela resultante (nova + atual) precisa continuar coerente
        ValidityWindow::new(
            changes.start_date.or(current.start_date),
            changes.end_date.or(current.end_date),
        )
        .ensure_ordered()?;

        if promote {
            self.repo
                .demote_other_primaries(&mut *tx, organization_id, current.user_id, current.context_type, Some(id), actor_id)
                .await?;
        }

        let affected = self.repo.update(&mut *tx, organization_id, id, &changes, actor_id).await?;
        if affected == 0 {
            return Err(AppError::AssignmentNotFound);
        }

        tx.commit().await?;

        tracing::info!(assignment_id = %id, %organization_id, "Atribuição atualizada");

        self.get_assignment(organization_id, id).await
    }

    pub async fn delete_assignment(&self, organization_id: Uuid, actor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.soft_delete(&self.pool, organization_id, id, actor_id).await?;
        if affected == 0 {
            return Err(AppError::AssignmentNotFound);
        }

        tracing::info!(assignment_id = %id, %organization_id, "Atribuição excluída");
        Ok(())
    }

    // =========================================================================
    //  TRANSFERÊNCIA
    // =========================================================================

    pub async fn transfer_assignments(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        payload: TransferAssignmentsPayload,
    ) -> Result<TransferResult, AppError> {
        if payload.from_user_id == payload.to_user_id {
            return Err(AppError::SameUserTransfer);
        }
        self.ensure_users_exist(organization_id, &[payload.from_user_id, payload.to_user_id])
            .await?;

        let mut tx = self.pool.begin().await?;

        self.user_repo
            .lock_for_update(&mut *tx, organization_id, &[payload.from_user_id, payload.to_user_id])
            .await?;

        let candidates = match &payload.assignment_ids {
            // Lista explícita (mesmo vazia) nunca vira "transferir tudo"
            Some(ids) => {
                self.repo
                    .lock_transferable_listed(&mut *tx, organization_id, payload.from_user_id, ids)
                    .await?
            }
            None => {
                self.repo
                    .lock_transferable_active(&mut *tx, organization_id, payload.from_user_id)
                    .await?
            }
        };

        if candidates.is_empty() {
            // tx é descartado aqui: rollback
            return Err(AppError::NothingToTransfer);
        }

        // A primária que chega substitui a do destino naquele tipo de contexto
        if payload.preserve_primary {
            let arriving: BTreeSet<ContextType> = candidates
                .iter()
                .filter(|row| row.is_primary)
                .map(|row| row.context_type)
                .collect();
            for context_type in arriving {
                self.repo
                    .demote_other_primaries(&mut *tx, organization_id, payload.to_user_id, context_type, None, actor_id)
                    .await?;
            }
        }

        let ids: Vec<Uuid> = candidates.iter().map(|row| row.id).collect();
        let rows = self
            .repo
            .reassign(
                &mut *tx,
                organization_id,
                payload.from_user_id,
                payload.to_user_id,
                &ids,
                payload.preserve_primary,
                actor_id,
            )
            .await?;

        tx.commit().await?;

        let assignment_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        tracing::info!(
            %organization_id,
            from_user_id = %payload.from_user_id,
            to_user_id = %payload.to_user_id,
            count = assignment_ids.len(),
            "Atribuições transferidas"
        );

        Ok(TransferResult {
            transferred_count: assignment_ids.len(),
            assignment_ids,
        })
    }

    // =========================================================================
    //  AUXILIARES
    // =========================================================================

    async fn ensure_role_visible(&self, organization_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        self.role_repo
            .find_visible(&self.pool, organization_id, role_id)
            .await?
            .map(|_| ())
            .ok_or(AppError::RoleNotFound)
    }

    async fn ensure_users_exist(&self, organization_id: Uuid, user_ids: &[Uuid]) -> Result<(), AppError> {
        let missing = self.user_repo.find_missing(organization_id, user_ids).await?;
        if let Some(first) = missing.first() {
            tracing::debug!(user_id = %first, missing = missing.len(), "Usuário alvo inexistente");
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}
