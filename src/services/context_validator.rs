// src/services/context_validator.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrganizationRepository,
    models::assignment::ContextType,
};

/// Confirma que (tipo, id) aponta para uma entidade viva DA organização.
/// Contexto de outra organização é tratado como inexistente.
#[derive(Clone)]
pub struct ContextValidator {
    org_repo: OrganizationRepository,
}

impl ContextValidator {
    pub fn new(org_repo: OrganizationRepository) -> Self {
        Self { org_repo }
    }

    pub async fn validate(
        &self,
        context_type: ContextType,
        context_id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), AppError> {
        let exists = match context_type {
            ContextType::Organization => {
                context_id == organization_id && self.org_repo.organization_exists(context_id).await?
            }
            ContextType::Location => self.org_repo.location_exists(organization_id, context_id).await?,
            ContextType::Project => self.org_repo.project_exists(organization_id, context_id).await?,
            // Sem tabela própria, não há como validar
            ContextType::Department | ContextType::Equipment | ContextType::Phase => {
                return Err(AppError::UnsupportedContextType(context_type.to_string()));
            }
        };

        if !exists {
            return Err(AppError::ContextNotFound {
                context_type,
                context_id,
            });
        }

        Ok(())
    }
}
