// src/db/assignment_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::{map_unique_violation, violated_constraint, AppError};
use crate::common::query::{bind_params, ClauseBuilder, SqlParam};
use crate::models::access::{MatchedAssignment, UserContext};
use crate::models::assignment::{
    AssignmentChanges, AssignmentFilter, AssignmentResponse, ContextType, NewAssignment,
    Pagination, UserAssignment,
};

// Predicado de "ativa": não excluída e hoje dentro da janela (inclusiva).
// Macro para poder ser usado dentro de concat!.
macro_rules! active_predicate {
    () => {
        "a.is_deleted = FALSE \
         AND (a.start_date IS NULL OR a.start_date <= CURRENT_DATE) \
         AND (a.end_date IS NULL OR a.end_date >= CURRENT_DATE)"
    };
}

macro_rules! context_name_expr {
    () => {
        "CASE a.context_type \
            WHEN 'organization' THEN (SELECT o.name FROM organizations o WHERE o.id = a.context_id) \
            WHEN 'location' THEN (SELECT l.name FROM locations l WHERE l.id = a.context_id) \
            WHEN 'project' THEN (SELECT p.name FROM projects p WHERE p.id = a.context_id) \
         END"
    };
}

const ENRICHED_SELECT: &str = concat!(
    "SELECT a.id, a.organization_id, a.user_id, \
            u.full_name AS user_name, u.email AS user_email, \
            a.role_id, r.name AS role_name, \
            a.context_type, a.context_id, ",
    context_name_expr!(),
    " AS context_name, \
            a.trade_type, a.is_primary, a.start_date, a.end_date, (",
    active_predicate!(),
    ") AS is_active, \
            a.created_at, a.created_by, a.updated_at, a.updated_by \
     FROM user_assignments a \
     LEFT JOIN users u ON u.id = a.user_id \
     LEFT JOIN roles r ON r.id = a.role_id"
);

const ONE_PRIMARY_INDEX: &str = "idx_user_assignments_one_primary";

// O índice de primária única vira conflito próprio; o resto é duplicata.
fn map_write_error(e: sqlx::Error) -> AppError {
    let on_violation = if violated_constraint(&e) == Some(ONE_PRIMARY_INDEX) {
        AppError::PrimaryAssignmentConflict
    } else {
        AppError::DuplicateAssignment
    };
    map_unique_violation(e, on_violation)
}

// Linha devolvida pela transferência
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransferredRow {
    pub id: Uuid,
    pub context_type: ContextType,
    pub is_primary: bool,
}

#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn insert<'e, E>(&self, executor: E, new: &NewAssignment) -> Result<UserAssignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, UserAssignment>(
            r#"
            INSERT INTO user_assignments (
                organization_id, user_id, role_id, context_type, context_id,
                trade_type, is_primary, start_date, end_date, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(new.organization_id)
        .bind(new.user_id)
        .bind(new.role_id)
        .bind(new.context_type)
        .bind(new.context_id)
        .bind(&new.trade_type)
        .bind(new.is_primary)
        .bind(new.window.start)
        .bind(new.window.end)
        .bind(new.actor_id)
        .fetch_one(executor)
        .await
        .map_err(map_write_error)
    }

    /// Atualização esparsa. Devolve o número de linhas afetadas.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
        changes: &AssignmentChanges,
        actor_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sets = update_set_clauses(changes, actor_id);
        let sql = format!(
            "UPDATE user_assignments SET {} WHERE organization_id = $1 AND id = $2 AND is_deleted = FALSE",
            sets.join(", ")
        );

        let result = bind_params!(sqlx::query(&sql).bind(organization_id).bind(id), sets.params())
            .execute(executor)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }

    /// Exclusão lógica. Linha já excluída não conta.
    pub async fn soft_delete<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
        actor_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE user_assignments
            SET is_deleted = TRUE, updated_by = $3, updated_at = NOW()
            WHERE organization_id = $1 AND id = $2 AND is_deleted = FALSE
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .bind(actor_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Rebaixa as primárias do usuário naquele tipo de contexto, exceto
    /// `keep_id`. Roda ANTES de gravar a nova primária, senão o índice
    /// `idx_user_assignments_one_primary` rejeita a escrita.
    pub async fn demote_other_primaries<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        user_id: Uuid,
        context_type: ContextType,
        keep_id: Option<Uuid>,
        actor_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE user_assignments
            SET is_primary = FALSE, updated_by = $5, updated_at = NOW()
            WHERE organization_id = $1
              AND user_id = $2
              AND context_type = $3
              AND ($4::uuid IS NULL OR id <> $4)
              AND is_primary = TRUE
              AND is_deleted = FALSE
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(context_type)
        .bind(keep_id)
        .bind(actor_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Linhas listadas que ainda pertencem a `from_user_id`, travadas.
    /// Linhas de outro dono são simplesmente ignoradas.
    pub async fn lock_transferable_listed<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        from_user_id: Uuid,
        assignment_ids: &[Uuid],
    ) -> Result<Vec<TransferredRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, TransferredRow>(
            r#"
            SELECT id, context_type, is_primary
            FROM user_assignments
            WHERE organization_id = $1
              AND user_id = $2
              AND is_deleted = FALSE
              AND id = ANY($3)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(organization_id)
        .bind(from_user_id)
        .bind(assignment_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Todas as atribuições ATIVAS (janela de datas) de `from_user_id`, travadas.
    /// Expiradas e futuras ficam com o usuário de origem.
    pub async fn lock_transferable_active<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        from_user_id: Uuid,
    ) -> Result<Vec<TransferredRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = concat!(
            "SELECT a.id, a.context_type, a.is_primary \
             FROM user_assignments a \
             WHERE a.organization_id = $1 AND a.user_id = $2 AND ",
            active_predicate!(),
            " ORDER BY a.id FOR UPDATE"
        );

        let rows = sqlx::query_as::<_, TransferredRow>(sql)
            .bind(organization_id)
            .bind(from_user_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    /// Move as linhas para `to_user_id`. Sem `preserve_primary` todas chegam
    /// como não primárias.
    pub async fn reassign<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        assignment_ids: &[Uuid],
        preserve_primary: bool,
        actor_id: Uuid,
    ) -> Result<Vec<TransferredRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TransferredRow>(
            r#"
            UPDATE user_assignments
            SET user_id = $3,
                is_primary = CASE WHEN $4 THEN is_primary ELSE FALSE END,
                updated_by = $5,
                updated_at = NOW()
            WHERE organization_id = $1
              AND user_id = $2
              AND is_deleted = FALSE
              AND id = ANY($6)
            RETURNING id, context_type, is_primary
            "#,
        )
        .bind(organization_id)
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(preserve_primary)
        .bind(actor_id)
        .bind(assignment_ids)
        .fetch_all(executor)
        .await
        .map_err(map_write_error)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    /// Linha viva (não excluída), travada para atualização quando dentro de transação.
    pub async fn lock_by_id<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<UserAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, UserAssignment>(
            r#"
            SELECT * FROM user_assignments
            WHERE organization_id = $1 AND id = $2 AND is_deleted = FALSE
            FOR UPDATE
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    /// Dono atual de uma linha viva, sem travar.
    pub async fn find_owner<'e, E>(&self, executor: E, organization_id: Uuid, id: Uuid) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM user_assignments WHERE organization_id = $1 AND id = $2 AND is_deleted = FALSE",
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(owner)
    }

    pub async fn find_enriched<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AssignmentResponse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{} WHERE a.organization_id = $1 AND a.id = $2 AND a.is_deleted = FALSE",
            ENRICHED_SELECT
        );

        let row = sqlx::query_as::<_, AssignmentResponse>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(row)
    }

    /// Listagem filtrada e paginada. Devolve (página, total).
    pub async fn list(
        &self,
        filter: &AssignmentFilter,
        pagination: Pagination,
    ) -> Result<(Vec<AssignmentResponse>, i64), AppError> {
        let where_ = filter_clauses(filter);

        let count_sql = format!("SELECT COUNT(*) FROM user_assignments a WHERE {}", where_.join(" AND "));
        let total = bind_params!(sqlx::query_scalar::<_, i64>(&count_sql), where_.params())
            .fetch_one(&self.pool)
            .await?;

        let mut paged = where_.clone();
        let limit = paged.placeholder(SqlParam::Int(pagination.limit()));
        let offset = paged.placeholder(SqlParam::Int(pagination.offset()));
        let data_sql = format!(
            "{} WHERE {} ORDER BY a.created_at DESC, a.id LIMIT {} OFFSET {}",
            ENRICHED_SELECT,
            paged.join(" AND "),
            limit,
            offset
        );

        let rows = bind_params!(sqlx::query_as::<_, AssignmentResponse>(&data_sql), paged.params())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Mesma filtragem, sem paginação (listas por usuário e por contexto).
    pub async fn list_all(&self, filter: &AssignmentFilter) -> Result<Vec<AssignmentResponse>, AppError> {
        let where_ = filter_clauses(filter);
        let sql = format!(
            "{} WHERE {} ORDER BY a.is_primary DESC, a.created_at DESC, a.id",
            ENRICHED_SELECT,
            where_.join(" AND ")
        );

        let rows = bind_params!(sqlx::query_as::<_, AssignmentResponse>(&sql), where_.params())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn find_active_for_user<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<UserAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = concat!(
            "SELECT a.* FROM user_assignments a \
             WHERE a.organization_id = $1 AND a.user_id = $2 AND ",
            active_predicate!(),
            " ORDER BY a.created_at"
        );

        let rows = sqlx::query_as::<_, UserAssignment>(sql)
            .bind(organization_id)
            .bind(user_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    /// Atribuições ativas do usuário cujo contexto é exatamente um dos candidatos.
    pub async fn find_matching_active(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        candidates: &[(ContextType, Uuid)],
    ) -> Result<Vec<MatchedAssignment>, AppError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = ClauseBuilder::starting_at(3);
        for (context_type, context_id) in candidates {
            let t = matches.placeholder(SqlParam::Context(*context_type));
            let i = matches.placeholder(SqlParam::Uuid(*context_id));
            matches.push_raw(&format!("(a.context_type = {} AND a.context_id = {})", t, i));
        }

        let sql = format!(
            concat!(
                "SELECT a.context_type, a.context_id, r.name AS role_name \
                 FROM user_assignments a \
                 JOIN roles r ON r.id = a.role_id \
                 WHERE a.organization_id = $1 AND a.user_id = $2 AND ",
                active_predicate!(),
                " AND ({}) ORDER BY r.name"
            ),
            matches.join(" OR ")
        );

        let rows = bind_params!(
            sqlx::query_as::<_, MatchedAssignment>(&sql).bind(organization_id).bind(user_id),
            matches.params()
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_user_contexts(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<UserContext>, AppError> {
        let sql = concat!(
            "SELECT a.id AS assignment_id, a.context_type, a.context_id, ",
            context_name_expr!(),
            " AS context_name, a.role_id, r.name AS role_name, a.trade_type, a.is_primary \
             FROM user_assignments a \
             LEFT JOIN roles r ON r.id = a.role_id \
             WHERE a.organization_id = $1 AND a.user_id = $2 AND ",
            active_predicate!(),
            " ORDER BY a.context_type, a.is_primary DESC, a.created_at"
        );

        let rows = sqlx::query_as::<_, UserContext>(sql)
            .bind(organization_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

// ---
// Montagem das cláusulas (funções puras, testáveis sem banco)
// ---

/// Tabela filtro -> cláusula. A organização é sempre a primeira cláusula.
pub(crate) fn filter_clauses(filter: &AssignmentFilter) -> ClauseBuilder {
    let mut where_ = ClauseBuilder::starting_at(1);
    where_.push("a.organization_id = {}", SqlParam::Uuid(filter.organization_id));
    where_.push_raw("a.is_deleted = FALSE");

    let table: [(&str, Option<SqlParam>); 6] = [
        ("a.user_id = {}", filter.user_id.map(SqlParam::Uuid)),
        ("a.role_id = {}", filter.role_id.map(SqlParam::Uuid)),
        ("a.context_type = {}", filter.context_type.map(SqlParam::Context)),
        ("a.context_id = {}", filter.context_id.map(SqlParam::Uuid)),
        ("a.is_primary = {}", filter.is_primary.map(SqlParam::Bool)),
        ("a.trade_type = {}", filter.trade_type.clone().map(SqlParam::Text)),
    ];

    for (template, param) in table {
        if let Some(param) = param {
            where_.push(template, param);
        }
    }

    match filter.is_active {
        Some(true) => {
            where_.push_raw(concat!("(", active_predicate!(), ")"));
        }
        Some(false) => {
            where_.push_raw(concat!("NOT (", active_predicate!(), ")"));
        }
        None => {}
    }

    where_
}

/// SET esparso: só as colunas informadas, mais updated_by/updated_at.
/// $1 e $2 são organização e id.
pub(crate) fn update_set_clauses(changes: &AssignmentChanges, actor_id: Uuid) -> ClauseBuilder {
    let mut sets = ClauseBuilder::starting_at(3);

    if let Some(role_id) = changes.role_id {
        sets.push("role_id = {}", SqlParam::Uuid(role_id));
    }
    if let Some(trade_type) = &changes.trade_type {
        sets.push("trade_type = {}", SqlParam::Text(trade_type.clone()));
    }
    if let Some(is_primary) = changes.is_primary {
        sets.push("is_primary = {}", SqlParam::Bool(is_primary));
    }
    if let Some(start_date) = changes.start_date {
        sets.push("start_date = {}", SqlParam::Date(start_date));
    }
    if let Some(end_date) = changes.end_date {
        sets.push("end_date = {}", SqlParam::Date(end_date));
    }

    sets.push("updated_by = {}", SqlParam::Uuid(actor_id));
    sets.push_raw("updated_at = NOW()");
    sets
}
