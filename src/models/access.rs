// src/models/access.rs

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::assignment::{ContextType, UserAssignment};

// ---
// Token compacto de contexto de acesso: "<KIND>:<id>"
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessKind {
    Org,
    Loc,
    Proj,
}

impl AccessKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessKind::Org => "ORG",
            AccessKind::Loc => "LOC",
            AccessKind::Proj => "PROJ",
        }
    }

    pub fn from_context_type(context_type: ContextType) -> Option<Self> {
        match context_type {
            ContextType::Organization => Some(AccessKind::Org),
            ContextType::Location => Some(AccessKind::Loc),
            ContextType::Project => Some(AccessKind::Proj),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessContextToken {
    pub kind: AccessKind,
    pub id: Uuid,
}

impl AccessContextToken {
    pub fn for_context(context_type: ContextType, id: Uuid) -> Option<Self> {
        AccessKind::from_context_type(context_type).map(|kind| Self { kind, id })
    }

    /// Um token por atribuição mantida diretamente (sem expansão).
    pub fn from_assignment(assignment: &UserAssignment) -> Option<Self> {
        Self::for_context(assignment.context_type, assignment.context_id)
    }
}

impl fmt::Display for AccessContextToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

impl FromStr for AccessContextToken {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidAccessToken(s.to_string());

        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        let kind = match kind {
            "ORG" => AccessKind::Org,
            "LOC" => AccessKind::Loc,
            "PROJ" => AccessKind::Proj,
            _ => return Err(invalid()),
        };
        let id = Uuid::parse_str(id).map_err(|_| invalid())?;

        Ok(Self { kind, id })
    }
}

/// Constrói o conjunto de tokens a partir das atribuições ativas, sem repetição.
pub fn access_tokens<'a, I>(assignments: I) -> Vec<AccessContextToken>
where
    I: IntoIterator<Item = &'a UserAssignment>,
{
    assignments
        .into_iter()
        .filter_map(AccessContextToken::from_assignment)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---
// Resultado da resolução de locais
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationGrant {
    /// Todos os locais da organização
    OrgWide,
    Locations(BTreeSet<Uuid>),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResolvedAccess {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub is_org_wide: bool,
    pub is_superadmin: bool,
    pub location_ids: Vec<Uuid>,
    #[schema(example = json!(["ORG:6f1c...", "PROJ:91ab..."]))]
    pub access_contexts: Vec<String>,
}

// ---
// Verificação de permissão
// ---
#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionCheckPayload {
    pub user_id: Uuid,
    pub context_type: ContextType,
    pub context_id: Uuid,
    #[schema(example = "rfis:write")]
    pub permission: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionCheck {
    pub allowed: bool,
    pub reason: String,
    pub roles: Vec<String>,
}

// Linha devolvida pela busca de atribuições que casam com um contexto.
#[derive(Debug, Clone, FromRow)]
pub struct MatchedAssignment {
    pub context_type: ContextType,
    pub context_id: Uuid,
    pub role_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserContext {
    pub assignment_id: Uuid,
    pub context_type: ContextType,
    pub context_id: Uuid,
    pub context_name: Option<String>,
    pub role_id: Uuid,
    pub role_name: Option<String>,
    pub trade_type: Option<String>,
    pub is_primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_through_credential_string() {
        let id = Uuid::new_v4();
        let token = AccessContextToken { kind: AccessKind::Proj, id };
        let raw = token.to_string();
        assert_eq!(raw, format!("PROJ:{}", id));
        assert_eq!(raw.parse::<AccessContextToken>().unwrap(), token);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for raw in ["", "ORG", "ORG:", "DEPT:6a2f3a3c-2d6e-4b1c-9a51-1b9f7b0c0a11", "LOC:not-a-uuid"] {
            assert!(raw.parse::<AccessContextToken>().is_err(), "{raw}");
        }
    }

    #[test]
    fn only_org_location_and_project_produce_tokens() {
        assert_eq!(AccessKind::from_context_type(ContextType::Organization), Some(AccessKind::Org));
        assert_eq!(AccessKind::from_context_type(ContextType::Location), Some(AccessKind::Loc));
        assert_eq!(AccessKind::from_context_type(ContextType::Project), Some(AccessKind::Proj));
        assert_eq!(AccessKind::from_context_type(ContextType::Equipment), None);
    }
}
