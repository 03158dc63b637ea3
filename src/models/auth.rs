// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::access::AccessContextToken;

pub const SUPERADMIN_ROLE: &str = "superadmin";

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub system_role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_superadmin(&self) -> bool {
        self.system_role == SUPERADMIN_ROLE
    }
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor de identidade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // Subject (ID do usuário)
    pub org: Uuid,   // Organização do usuário
    pub email: String,
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued At
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_contexts: Option<Vec<String>>,
}

/// A identidade verificada. O motor de acesso confia nela sem revalidar assinatura.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub access_contexts: Vec<AccessContextToken>,
}

impl Identity {
    pub fn from_claims(claims: Claims) -> Self {
        let access_contexts = claims
            .access_contexts
            .unwrap_or_default()
            .iter()
            .filter_map(|raw| match raw.parse::<AccessContextToken>() {
                Ok(token) => Some(token),
                Err(_) => {
                    tracing::debug!("Ignorando access context malformado: {}", raw);
                    None
                }
            })
            .collect();

        Self {
            user_id: claims.sub,
            organization_id: claims.org,
            email: claims.email,
            access_contexts,
        }
    }

    /// Checagem grosseira baseada apenas nos tokens da credencial.
    pub fn holds_context(&self, token: &AccessContextToken) -> bool {
        self.access_contexts.contains(token)
    }
}
