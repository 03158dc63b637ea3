// src/services/access_service.rs

use std::collections::{BTreeSet, HashMap};

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AssignmentRepository, OrganizationRepository, UserRepository},
    models::{
        access::{access_tokens, AccessContextToken, LocationGrant, ResolvedAccess, UserContext},
        assignment::{ContextType, UserAssignment},
        auth::Identity,
    },
};

#[derive(Clone)]
pub struct AccessService {
    assignment_repo: AssignmentRepository,
    org_repo: OrganizationRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl AccessService {
    pub fn new(
        assignment_repo: AssignmentRepository,
        org_repo: OrganizationRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { assignment_repo, org_repo, user_repo, pool }
    }

    pub async fn is_superadmin(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .user_repo
            .find_by_id(user_id)
            .await?
            .is_some_and(|user| user.is_superadmin()))
    }

    /// Resolve os locais visíveis para o usuário e o conjunto compacto de
    /// tokens para a credencial de sessão.
    pub async fn resolve_accessible_locations(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<ResolvedAccess, AppError> {
        let is_superadmin = self.is_superadmin(user_id).await?;

        // 1. Atribuições ativas (leitura sempre fresca, sem cache)
        let active = self
            .assignment_repo
            .find_active_for_user(&self.pool, organization_id, user_id)
            .await?;

        // 2. Tokens saem das atribuições diretas, não dos locais expandidos
        let access_contexts: Vec<String> = access_tokens(&active).iter().map(ToString::to_string).collect();

        // 3. Expansão para locais
        let grant = if is_superadmin {
            LocationGrant::OrgWide
        } else {
            let project_ids: Vec<Uuid> = active
                .iter()
                .filter(|a| a.context_type == ContextType::Project)
                .map(|a| a.context_id)
                .collect();

            let project_locations: HashMap<Uuid, Uuid> = self
                .org_repo
                .project_locations(&self.pool, organization_id, &project_ids)
                .await?
                .into_iter()
                .collect();

            resolve_grant(organization_id, &active, &project_locations)
        };

        let (is_org_wide, location_ids) = match grant {
            LocationGrant::OrgWide => (
                true,
                self.org_repo
                    .location_ids_for_organization(&self.pool, organization_id)
                    .await?,
            ),
            LocationGrant::Locations(ids) => (false, ids.into_iter().collect()),
        };

        tracing::debug!(
            %user_id,
            %organization_id,
            is_org_wide,
            locations = location_ids.len(),
            "Acesso resolvido"
        );

        Ok(ResolvedAccess {
            user_id,
            organization_id,
            is_org_wide,
            is_superadmin,
            location_ids,
            access_contexts,
        })
    }

    /// Leitura de um contexto. Primeiro a checagem grosseira pelos tokens da
    /// credencial (sem consulta); sem token, cai para a resolução ao vivo.
    pub async fn can_view_context(
        &self,
        identity: &Identity,
        context_type: ContextType,
        context_id: Uuid,
    ) -> Result<bool, AppError> {
        let token = AccessContextToken::for_context(context_type, context_id);
        if token.is_some_and(|token| identity.holds_context(&token)) {
            return Ok(true);
        }

        let access = self
            .resolve_accessible_locations(identity.user_id, identity.organization_id)
            .await?;
        if access.is_org_wide {
            return Ok(true);
        }

        let visible = match context_type {
            ContextType::Location => access.location_ids.contains(&context_id),
            ContextType::Project => self
                .org_repo
                .project_location(identity.organization_id, context_id)
                .await?
                .is_some_and(|location_id| access.location_ids.contains(&location_id)),
            _ => false,
        };

        Ok(visible)
    }

    pub async fn get_active_assignments(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<UserAssignment>, AppError> {
        self.assignment_repo
            .find_active_for_user(&self.pool, organization_id, user_id)
            .await
    }

    pub async fn get_user_contexts(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<UserContext>, AppError> {
        self.assignment_repo.list_user_contexts(organization_id, user_id).await
    }
}

/// Núcleo puro da resolução. `active` já deve conter só atribuições ativas.
///
/// Atribuição de organização domina tudo. Caso contrário: locais diretos mais
/// o local dono de cada obra; obra sem local conhecido é ignorada.
pub fn resolve_grant(
    organization_id: Uuid,
    active: &[UserAssignment],
    project_locations: &HashMap<Uuid, Uuid>,
) -> LocationGrant {
    let org_wide = active.iter().any(|a| {
        a.context_type == ContextType::Organization && a.context_id == organization_id
    });
    if org_wide {
        return LocationGrant::OrgWide;
    }

    let mut locations = BTreeSet::new();
    for assignment in active {
        match assignment.context_type {
            ContextType::Location => {
                locations.insert(assignment.context_id);
            }
            ContextType::Project => match project_locations.get(&assignment.context_id) {
                Some(location_id) => {
                    locations.insert(*location_id);
                }
                None => {
                    tracing::debug!(project_id = %assignment.context_id, "Obra ausente ou excluída, ignorando");
                }
            },
            _ => {}
        }
    }

    LocationGrant::Locations(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn held(org: Uuid, context_type: ContextType, context_id: Uuid) -> UserAssignment {
        let now = Utc::now();
        UserAssignment {
            id: Uuid::new_v4(),
            organization_id: org,
            user_id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            context_type,
            context_id,
            trade_type: None,
            is_primary: false,
            start_date: None,
            end_date: None,
            is_deleted: false,
            created_at: now,
            created_by: Uuid::nil(),
            updated_at: now,
            updated_by: Uuid::nil(),
        }
    }

    #[test]
    fn project_and_location_grants_merge() {
        let org = Uuid::new_v4();
        let (p7, l3, l9) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let active = vec![
            held(org, ContextType::Project, p7),
            held(org, ContextType::Location, l9),
        ];
        let owners = HashMap::from([(p7, l3)]);

        let grant = resolve_grant(org, &active, &owners);
        assert_eq!(grant, LocationGrant::Locations(BTreeSet::from([l3, l9])));
    }

    #[test]
    fn organization_grant_dominates() {
        let org = Uuid::new_v4();
        let active = vec![
            held(org, ContextType::Location, Uuid::new_v4()),
            held(org, ContextType::Organization, org),
            held(org, ContextType::Project, Uuid::new_v4()),
        ];

        assert_eq!(resolve_grant(org, &active, &HashMap::new()), LocationGrant::OrgWide);
    }

    #[test]
    fn grant_on_another_organization_is_not_org_wide() {
        let org = Uuid::new_v4();
        let active = vec![held(org, ContextType::Organization, Uuid::new_v4())];

        assert_eq!(
            resolve_grant(org, &active, &HashMap::new()),
            LocationGrant::Locations(BTreeSet::new())
        );
    }

    #[test]
    fn missing_projects_are_skipped_and_locations_deduplicated() {
        let org = Uuid::new_v4();
        let (p1, p2, gone, l1) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let active = vec![
            held(org, ContextType::Project, p1),
            held(org, ContextType::Project, p2),
            held(org, ContextType::Project, gone),
            held(org, ContextType::Location, l1),
        ];
        // p1 e p2 pertencem ao mesmo local
        let owners = HashMap::from([(p1, l1), (p2, l1)]);

        assert_eq!(
            resolve_grant(org, &active, &owners),
            LocationGrant::Locations(BTreeSet::from([l1]))
        );
    }

    #[test]
    fn tokens_come_from_held_assignments_not_resolved_locations() {
        let org = Uuid::new_v4();
        let (p7, l9) = (Uuid::new_v4(), Uuid::new_v4());
        let active = vec![
            held(org, ContextType::Project, p7),
            held(org, ContextType::Location, l9),
            held(org, ContextType::Equipment, Uuid::new_v4()),
        ];

        let tokens: Vec<String> = access_tokens(&active).iter().map(ToString::to_string).collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains(&format!("PROJ:{}", p7)));
        assert!(tokens.contains(&format!("LOC:{}", l9)));
    }
}
