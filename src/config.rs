// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{AssignmentRepository, OrganizationRepository, RoleRepository, UserRepository},
    services::{
        access_service::AccessService,
        assignment_service::AssignmentService,
        context_validator::ContextValidator,
        identity::{IdentityProvider, JwtIdentityProvider},
        location_service::LocationService,
        permission_service::PermissionService,
        role_service::RoleService,
    },
};

// Parâmetros lidos do ambiente na inicialização
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub hierarchical_permissions: bool,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", 3)?,
            hierarchical_permissions: parse_var("HIERARCHICAL_PERMISSIONS", false)?,
        })
    }
}

// Variável opcional: ausente = padrão, presente mas inválida = erro de inicialização
fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub identity: Arc<dyn IdentityProvider>,
    pub assignment_service: AssignmentService,
    pub access_service: AccessService,
    pub permission_service: PermissionService,
    pub location_service: LocationService,
    pub role_service: RoleService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(settings.db_acquire_timeout_secs))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(settings, db_pool))
    }

    /// Monta o gráfico de dependências em volta de um pool existente.
    pub fn from_pool(settings: Settings, db_pool: PgPool) -> Self {
        let identity: Arc<dyn IdentityProvider> = Arc::new(JwtIdentityProvider::new(&settings.jwt_secret));
        Self::with_identity(settings, db_pool, identity)
    }

    pub fn with_identity(settings: Settings, db_pool: PgPool, identity: Arc<dyn IdentityProvider>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let assignment_repo = AssignmentRepository::new(db_pool.clone());
        let org_repo = OrganizationRepository::new(db_pool.clone());
        let role_repo = RoleRepository::new(db_pool.clone());

        let validator = ContextValidator::new(org_repo.clone());

        let access_service = AccessService::new(
            assignment_repo.clone(),
            org_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
        );
        let permission_service = PermissionService::new(
            assignment_repo.clone(),
            org_repo.clone(),
            settings.hierarchical_permissions,
        );
        let assignment_service = AssignmentService::new(
            assignment_repo.clone(),
            role_repo.clone(),
            user_repo,
            validator.clone(),
            db_pool.clone(),
        );
        let location_service = LocationService::new(
            org_repo,
            assignment_repo,
            role_repo.clone(),
            access_service.clone(),
            validator,
            db_pool.clone(),
        );
        let role_service = RoleService::new(role_repo, db_pool.clone());

        Self {
            db_pool,
            identity,
            assignment_service,
            access_service,
            permission_service,
            location_service,
            role_service,
        }
    }
}
