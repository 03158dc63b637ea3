// src/models/organization.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. Location (o "Local": canteiro, filial, escritório regional)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Location {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    #[schema(example = "Canteiro Zona Sul")]
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Project (a "Obra"), sempre pertence a um local
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub location_id: Uuid,
    #[schema(example = "Residencial Jardins - Torre B")]
    pub name: String,
    #[schema(example = "OB-2025-014")]
    pub project_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationPayload {
    #[validate(length(min = 1, max = 200, message = "O nome do local é obrigatório."))]
    pub name: String,
    pub address: Option<String>,
    /// Cargo concedido ao criador neste local (opcional)
    pub manager_role_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationCreated {
    #[serde(flatten)]
    pub location: Location,
    pub manager_assignment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectPayload {
    pub location_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "O nome da obra é obrigatório."))]
    pub name: String,
    #[validate(length(max = 50, message = "O número da obra deve ter no máximo 50 caracteres."))]
    pub project_number: Option<String>,
}
