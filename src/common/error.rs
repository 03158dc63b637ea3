// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::i18n::Locale;
use crate::models::assignment::ContextType;

// O erro de domínio. Repositórios e serviços só conhecem este tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição malformada: {0}")]
    MalformedRequest(String),

    #[error("Janela de validade invertida")]
    InvertedWindow,

    #[error("Transferência para o próprio usuário")]
    SameUserTransfer,

    #[error("Token de contexto de acesso inválido: {0}")]
    InvalidAccessToken(String),

    #[error("Data inválida em '{field}': {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Tipo de contexto não suportado: {0}")]
    UnsupportedContextType(String),

    #[error("Nenhum campo para atualizar")]
    NoFieldsToUpdate,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Permissão ausente: {0}")]
    PermissionDenied(String),

    #[error("organization_id diferente da organização do usuário")]
    OrganizationMismatch,

    #[error("Sem acesso ao contexto {context_type}:{context_id}")]
    ContextAccessDenied {
        context_type: ContextType,
        context_id: Uuid,
    },

    #[error("Atribuição não encontrada")]
    AssignmentNotFound,

    #[error("Contexto {context_type}:{context_id} não encontrado")]
    ContextNotFound {
        context_type: ContextType,
        context_id: Uuid,
    },

    #[error("Cargo não encontrado")]
    RoleNotFound,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Nenhuma atribuição encontrada para transferir")]
    NothingToTransfer,

    #[error("Atribuição duplicada")]
    DuplicateAssignment,

    #[error("Já existe outra atribuição primária para este tipo de contexto")]
    PrimaryAssignmentConflict,

    #[error("Nome de cargo já usado")]
    DuplicateRoleName,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MalformedRequest(_)
            | AppError::InvertedWindow
            | AppError::SameUserTransfer
            | AppError::InvalidAccessToken(_)
            | AppError::InvalidDate { .. }
            | AppError::UnsupportedContextType(_)
            | AppError::NoFieldsToUpdate => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_)
            | AppError::OrganizationMismatch
            | AppError::ContextAccessDenied { .. } => StatusCode::FORBIDDEN,
            AppError::AssignmentNotFound
            | AppError::ContextNotFound { .. }
            | AppError::RoleNotFound
            | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::NothingToTransfer
            | AppError::DuplicateAssignment
            | AppError::PrimaryAssignmentConflict
            | AppError::DuplicateRoleName => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Mensagem para o cliente no idioma pedido ("pt" ou "en").
    fn message(&self, lang: &str) -> String {
        let pt = lang == "pt";
        match self {
            AppError::ValidationError(_) => pick(pt, "Um ou mais campos são inválidos.", "One or more fields are invalid."),
            AppError::MalformedRequest(detail) => {
                if pt {
                    format!("Requisição malformada: {}", detail)
                } else {
                    format!("Malformed request: {}", detail)
                }
            }
            AppError::InvertedWindow => pick(
                pt,
                "end_date não pode ser anterior a start_date.",
                "end_date must not be before start_date.",
            ),
            AppError::SameUserTransfer => pick(
                pt,
                "from_user_id e to_user_id devem ser diferentes.",
                "from_user_id and to_user_id must differ.",
            ),
            AppError::InvalidAccessToken(raw) => {
                if pt {
                    format!("Token de contexto de acesso inválido: '{}'.", raw)
                } else {
                    format!("Invalid access context token: '{}'.", raw)
                }
            }
            AppError::InvalidDate { field, value } => {
                if pt {
                    format!("Data inválida em '{}': '{}' (formato esperado AAAA-MM-DD).", field, value)
                } else {
                    format!("Invalid date in '{}': '{}' (expected YYYY-MM-DD).", field, value)
                }
            }
            AppError::UnsupportedContextType(ctx) => {
                if pt {
                    format!("Tipo de contexto não suportado: '{}'.", ctx)
                } else {
                    format!("Unsupported context type: '{}'.", ctx)
                }
            }
            AppError::NoFieldsToUpdate => pick(pt, "Nenhum campo para atualizar.", "No fields to update."),
            AppError::InvalidToken | AppError::JwtError(_) => pick(
                pt,
                "Token de autenticação inválido ou ausente.",
                "Invalid or missing authentication token.",
            ),
            AppError::PermissionDenied(slug) => {
                if pt {
                    format!("Acesso negado: permissão '{}' ausente.", slug)
                } else {
                    format!("Access denied: missing permission '{}'.", slug)
                }
            }
            AppError::OrganizationMismatch => pick(
                pt,
                "Acesso negado: organization_id diferente da sua organização.",
                "Access denied: organization_id differs from your organization.",
            ),
            AppError::ContextAccessDenied { context_type, context_id } => {
                if pt {
                    format!("Acesso negado ao contexto {} '{}'.", context_type, context_id)
                } else {
                    format!("Access denied to context {} '{}'.", context_type, context_id)
                }
            }
            AppError::AssignmentNotFound => pick(pt, "Atribuição não encontrada.", "Assignment not found."),
            AppError::ContextNotFound { context_type, context_id } => {
                if pt {
                    format!("Contexto {} '{}' não encontrado.", context_type, context_id)
                } else {
                    format!("Context {} '{}' not found.", context_type, context_id)
                }
            }
            AppError::RoleNotFound => pick(pt, "Cargo não encontrado.", "Role not found."),
            AppError::UserNotFound => pick(pt, "Usuário não encontrado.", "User not found."),
            AppError::NothingToTransfer => pick(
                pt,
                "Nenhuma atribuição encontrada para transferir.",
                "No assignments found to transfer.",
            ),
            AppError::DuplicateAssignment => pick(
                pt,
                "O usuário já possui este cargo neste contexto.",
                "The user already holds this role in this context.",
            ),
            AppError::PrimaryAssignmentConflict => pick(
                pt,
                "O usuário já possui outra atribuição primária para este tipo de contexto.",
                "The user already has another primary assignment for this context type.",
            ),
            AppError::DuplicateRoleName => pick(
                pt,
                "Já existe um cargo com esse nome.",
                "A role with this name already exists.",
            ),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                pick(pt, "Ocorreu um erro inesperado.", "An unexpected error occurred.")
            }
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe fica no log, nunca na resposta
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                                .into()
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError {
            status,
            error: self.message(&locale.0),
            details,
        }
    }
}

fn pick(pt: bool, pt_msg: &str, en_msg: &str) -> String {
    if pt { pt_msg.to_string() } else { en_msg.to_string() }
}

// A rejeição HTTP devolvida pelos handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error(&Locale::default())
    }
}

/// Converte violação de unicidade do Postgres em erro de domínio.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_violation: AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_violation;
        }
    }
    e.into()
}

/// Nome do índice violado, quando o erro é de unicidade.
pub(crate) fn violated_constraint(e: &sqlx::Error) -> Option<&str> {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => db_err.constraint(),
        _ => None,
    }
}
