// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::User};

// O repositório de usuários. Só leitura: cadastro e credenciais são externos.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Sem filtro de organização: um superadmin atua em qualquer uma.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, organization_id, email, full_name, system_role, created_at, updated_at
            FROM users
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Devolve os ids que NÃO existem (ou estão excluídos) na organização.
    pub async fn find_missing(&self, organization_id: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let missing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT wanted.id
            FROM UNNEST($2::uuid[]) AS wanted(id)
            WHERE NOT EXISTS (
                SELECT 1 FROM users u
                WHERE u.id = wanted.id AND u.organization_id = $1 AND u.is_deleted = FALSE
            )
            "#,
        )
        .bind(organization_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(missing)
    }

    /// Trava as linhas dos usuários até o fim da transação. Serializa as
    /// escritas que mexem na atribuição primária de um mesmo usuário.
    /// A ordem por id evita deadlock entre lotes concorrentes; NO KEY não
    /// bloqueia os inserts comuns (a FK só pede KEY SHARE).
    pub async fn lock_for_update<'e, E>(&self, executor: E, organization_id: Uuid, ids: &[Uuid]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            SELECT id FROM users
            WHERE organization_id = $1 AND id = ANY($2)
            ORDER BY id
            FOR NO KEY UPDATE
            "#,
        )
        .bind(organization_id)
        .bind(ids)
        .fetch_all(executor)
        .await?;

        Ok(())
    }
}
