// src/models/assignment.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

/// Formato de data aceito na API (data de calendário, sem hora).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

// ---
// Granularidade do contexto de uma atribuição
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_context_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Organization,
    Project,
    Location,
    Department,
    Equipment,
    Phase,
}

impl ContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Organization => "organization",
            ContextType::Project => "project",
            ContextType::Location => "location",
            ContextType::Department => "department",
            ContextType::Equipment => "equipment",
            ContextType::Phase => "phase",
        }
    }

    /// Tabela de implicação hierárquica: organização ⊇ local ⊇ obra.
    /// `held.implies(requested)` diz se uma atribuição em `held` cobre um
    /// contexto do tipo `requested` (dentro da mesma hierarquia).
    pub fn implies(self, requested: ContextType) -> bool {
        match (self, requested) {
            (held, req) if held == req => true,
            (ContextType::Organization, _) => true,
            (ContextType::Location, ContextType::Project) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" => Ok(ContextType::Organization),
            "project" => Ok(ContextType::Project),
            "location" => Ok(ContextType::Location),
            "department" => Ok(ContextType::Department),
            "equipment" => Ok(ContextType::Equipment),
            "phase" => Ok(ContextType::Phase),
            other => Err(AppError::UnsupportedContextType(other.to_string())),
        }
    }
}

// ---
// A linha persistida (fonte única de verdade do acesso)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserAssignment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub context_type: ContextType,
    pub context_id: Uuid,
    pub trade_type: Option<String>,
    pub is_primary: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Uuid,
}

impl UserAssignment {
    /// Ativa = não excluída e `today` dentro da janela (inclusiva).
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        !self.is_deleted && ValidityWindow::new(self.start_date, self.end_date).contains(today)
    }
}

// Janela de validade opcional. Ambos ausentes = perpétua.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidityWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ValidityWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Interpreta as datas do payload. Formato inválido é erro do usuário.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, AppError> {
        let window = Self {
            start: parse_date("start_date", start)?,
            end: parse_date("end_date", end)?,
        };
        window.ensure_ordered()?;
        Ok(window)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start.is_none_or(|start| start <= day) && self.end.is_none_or(|end| end >= day)
    }

    pub fn ensure_ordered(&self) -> Result<(), AppError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(AppError::InvertedWindow);
            }
        }
        Ok(())
    }
}

pub fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| AppError::InvalidDate {
                field,
                value: raw.to_string(),
            }),
    }
}

// ---
// Resposta enriquecida (join com usuário, cargo e nome do contexto)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub role_id: Uuid,
    pub role_name: Option<String>,
    pub context_type: ContextType,
    pub context_id: Uuid,
    pub context_name: Option<String>,
    pub trade_type: Option<String>,
    pub is_primary: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Uuid,
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentPayload {
    pub user_id: Uuid,
    pub role_id: Uuid,
    #[schema(example = "project")]
    pub context_type: ContextType,
    pub context_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "trade_type deve ter entre 1 e 100 caracteres"))]
    #[schema(example = "electrical")]
    pub trade_type: Option<String>,

    #[serde(default)]
    pub is_primary: bool,

    #[schema(example = "2025-01-15")]
    pub start_date: Option<String>,
    #[schema(example = "2025-12-31")]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCreateAssignmentsPayload {
    #[validate(length(min = 1, max = 500, message = "user_ids deve ter entre 1 e 500 usuários"))]
    pub user_ids: Vec<Uuid>,
    pub role_id: Uuid,
    pub context_type: ContextType,
    pub context_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "trade_type deve ter entre 1 e 100 caracteres"))]
    pub trade_type: Option<String>,

    #[serde(default)]
    pub is_primary: bool,

    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// Atualização esparsa: campo ausente = manter o valor atual.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAssignmentPayload {
    pub role_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "trade_type deve ter entre 1 e 100 caracteres"))]
    pub trade_type: Option<String>,

    pub is_primary: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferAssignmentsPayload {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    /// Sem lista: transfere todas as atribuições ativas do usuário de origem.
    pub assignment_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub preserve_primary: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResult {
    pub transferred_count: usize,
    pub assignment_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateContextPayload {
    pub context_type: ContextType,
    pub context_id: Uuid,
}

// ---
// Entradas internas do repositório
// ---
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub context_type: ContextType,
    pub context_id: Uuid,
    pub trade_type: Option<String>,
    pub is_primary: bool,
    pub window: ValidityWindow,
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentChanges {
    pub role_id: Option<Uuid>,
    pub trade_type: Option<String>,
    pub is_primary: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AssignmentChanges {
    pub fn from_payload(payload: UpdateAssignmentPayload) -> Result<Self, AppError> {
        Ok(Self {
            role_id: payload.role_id,
            trade_type: payload.trade_type,
            is_primary: payload.is_primary,
            start_date: parse_date("start_date", payload.start_date.as_deref())?,
            end_date: parse_date("end_date", payload.end_date.as_deref())?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---
// Listagem filtrada
// ---
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentListQuery {
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub context_type: Option<ContextType>,
    pub context_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub is_primary: Option<bool>,
    pub trade_type: Option<String>,
    /// Derivado da janela de validade (e não excluída)
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// O filtro que chega ao repositório. A organização é obrigatória.
#[derive(Debug, Clone)]
pub struct AssignmentFilter {
    pub organization_id: Uuid,
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub context_type: Option<ContextType>,
    pub context_id: Option<Uuid>,
    pub is_primary: Option<bool>,
    pub trade_type: Option<String>,
    pub is_active: Option<bool>,
}

impl AssignmentFilter {
    pub fn for_organization(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            user_id: None,
            role_id: None,
            context_type: None,
            context_id: None,
            is_primary: None,
            trade_type: None,
            is_active: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn normalize(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn assignment(start: Option<&str>, end: Option<&str>, deleted: bool) -> UserAssignment {
        let now = Utc::now();
        UserAssignment {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            context_type: ContextType::Project,
            context_id: Uuid::new_v4(),
            trade_type: None,
            is_primary: false,
            start_date: start.map(day),
            end_date: end.map(day),
            is_deleted: deleted,
            created_at: now,
            created_by: Uuid::nil(),
            updated_at: now,
            updated_by: Uuid::nil(),
        }
    }

    #[test]
    fn active_predicate_matches_window_and_soft_delete() {
        let today = day("2025-06-15");
        let cases = [
            (None, None, false, true),
            (Some("2025-06-15"), Some("2025-06-15"), false, true),
            (Some("2025-06-16"), None, false, false),
            (None, Some("2025-06-14"), false, false),
            (Some("2025-01-01"), Some("2025-12-31"), false, true),
            (None, None, true, false),
            (Some("2025-01-01"), Some("2025-12-31"), true, false),
        ];

        for (start, end, deleted, expected) in cases {
            let a = assignment(start, end, deleted);
            let by_hand = !a.is_deleted
                && a.start_date.is_none_or(|s| s <= today)
                && a.end_date.is_none_or(|e| e >= today);
            assert_eq!(a.is_active_on(today), expected, "{start:?}..{end:?} deleted={deleted}");
            assert_eq!(a.is_active_on(today), by_hand);
        }
    }

    #[test]
    fn malformed_date_is_a_user_error() {
        let err = ValidityWindow::parse(Some("15/06/2025"), None).unwrap_err();
        assert!(matches!(err, AppError::InvalidDate { field: "start_date", .. }));

        let err = ValidityWindow::parse(None, Some("2025-06-15T10:00:00")).unwrap_err();
        assert!(matches!(err, AppError::InvalidDate { field: "end_date", .. }));
    }

    #[test]
    fn empty_dates_mean_perpetual() {
        let window = ValidityWindow::parse(Some(""), None).unwrap();
        assert_eq!(window, ValidityWindow::default());
        assert!(window.contains(day("1999-01-01")));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = ValidityWindow::parse(Some("2025-06-15"), Some("2025-06-01")).unwrap_err();
        assert!(matches!(err, AppError::InvertedWindow));
    }

    #[test]
    fn implication_table() {
        use ContextType::*;
        assert!(Organization.implies(Location));
        assert!(Organization.implies(Project));
        assert!(Location.implies(Project));
        assert!(Project.implies(Project));
        assert!(!Project.implies(Location));
        assert!(!Location.implies(Organization));
        assert!(!Department.implies(Project));
    }

    #[test]
    fn unknown_context_type_is_rejected() {
        assert!(matches!(
            "building".parse::<ContextType>(),
            Err(AppError::UnsupportedContextType(_))
        ));
        assert_eq!("phase".parse::<ContextType>().unwrap(), ContextType::Phase);
    }

    #[test]
    fn pagination_defaults_and_cap() {
        assert_eq!(Pagination::normalize(None, None), Pagination { page: 1, page_size: 50 });
        assert_eq!(Pagination::normalize(Some(0), Some(1000)).page_size, MAX_PAGE_SIZE);
        let p = Pagination::normalize(Some(3), Some(20));
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn empty_update_is_detected() {
        let changes = AssignmentChanges::from_payload(UpdateAssignmentPayload::default()).unwrap();
        assert!(changes.is_empty());

        let changes = AssignmentChanges::from_payload(UpdateAssignmentPayload {
            is_primary: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert!(!changes.is_empty());
    }
}
