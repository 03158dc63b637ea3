// src/services/permission_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AssignmentRepository, OrganizationRepository},
    models::{
        access::{MatchedAssignment, PermissionCheck},
        assignment::ContextType,
    },
};

/// Decide allow/deny relendo as atribuições atuais (nunca confia no token).
///
/// Modo padrão: casamento direto, só uma atribuição no contexto exato conta.
/// Com `hierarchical`, atribuições nos ancestrais do contexto também contam,
/// usando a mesma tabela de implicação do resolvedor de acesso.
#[derive(Clone)]
pub struct PermissionService {
    assignment_repo: AssignmentRepository,
    org_repo: OrganizationRepository,
    hierarchical: bool,
}

impl PermissionService {
    pub fn new(assignment_repo: AssignmentRepository, org_repo: OrganizationRepository, hierarchical: bool) -> Self {
        Self { assignment_repo, org_repo, hierarchical }
    }

    pub async fn check(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        context_type: ContextType,
        context_id: Uuid,
        permission: &str,
    ) -> Result<PermissionCheck, AppError> {
        let ancestors = if self.hierarchical {
            self.ancestors(organization_id, context_type, context_id).await?
        } else {
            Vec::new()
        };

        let candidates = candidate_contexts(context_type, context_id, &ancestors);
        let matched = self
            .assignment_repo
            .find_matching_active(organization_id, user_id, &candidates)
            .await?;

        let decision = decide(context_type, context_id, permission, &matched);
        tracing::debug!(
            %user_id,
            %context_id,
            context_type = %context_type,
            permission,
            allowed = decision.allowed,
            "Permissão avaliada"
        );

        Ok(decision)
    }

    // Ancestrais do contexto pedido dentro da organização
    async fn ancestors(
        &self,
        organization_id: Uuid,
        context_type: ContextType,
        context_id: Uuid,
    ) -> Result<Vec<(ContextType, Uuid)>, AppError> {
        let mut ancestors = Vec::new();
        if context_type == ContextType::Organization {
            return Ok(ancestors);
        }

        ancestors.push((ContextType::Organization, organization_id));

        if context_type == ContextType::Project {
            if let Some(location_id) = self.org_repo.project_location(organization_id, context_id).await? {
                ancestors.push((ContextType::Location, location_id));
            }
        }

        Ok(ancestors)
    }
}

/// O contexto pedido mais os ancestrais cujo tipo o implica.
pub fn candidate_contexts(
    context_type: ContextType,
    context_id: Uuid,
    ancestors: &[(ContextType, Uuid)],
) -> Vec<(ContextType, Uuid)> {
    std::iter::once((context_type, context_id))
        .chain(
            ancestors
                .iter()
                .copied()
                .filter(|(held, _)| held.implies(context_type)),
        )
        .collect()
}

pub fn decide(
    context_type: ContextType,
    context_id: Uuid,
    permission: &str,
    matched: &[MatchedAssignment],
) -> PermissionCheck {
    let mut roles: Vec<String> = matched.iter().map(|m| m.role_name.clone()).collect();
    roles.sort();
    roles.dedup();

    if matched.is_empty() {
        return PermissionCheck {
            allowed: false,
            reason: format!("no active assignment on {}:{}", context_type, context_id),
            roles,
        };
    }

    let direct = matched
        .iter()
        .any(|m| m.context_type == context_type && m.context_id == context_id);

    let reason = if direct {
        format!("active assignment on {}:{} grants '{}'", context_type, context_id, permission)
    } else {
        // Só acontece no modo hierárquico
        let via = &matched[0];
        format!(
            "'{}' inherited from assignment on {}:{}",
            permission, via.context_type, via.context_id
        )
    };

    PermissionCheck { allowed: true, reason, roles }
}
