// src/models/role.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// O que sai do banco (tabela roles).
// Cargos padrão têm organization_id NULL e são compartilhados.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    pub organization_id: Option<Uuid>,

    #[schema(example = "Gerente de Obra")]
    pub name: String,

    #[schema(example = "management")]
    pub category: String,

    #[schema(example = "write")]
    pub access_level: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O payload para criar um cargo customizado
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRolePayload {
    #[validate(length(min = 2, max = 100, message = "O nome deve ter entre 2 e 100 caracteres"))]
    #[schema(example = "Mestre de Obras")]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    #[schema(example = "field")]
    pub category: String,

    #[validate(custom(function = "validate_access_level"))]
    #[schema(example = "write")]
    pub access_level: String,

    pub description: Option<String>,
}

pub const ACCESS_LEVELS: [&str; 3] = ["read", "write", "admin"];

fn validate_access_level(level: &str) -> Result<(), validator::ValidationError> {
    if ACCESS_LEVELS.contains(&level) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("access_level");
        err.message = Some("access_level deve ser read, write ou admin".into());
        Err(err)
    }
}
