// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::mysql::MySqlConnectOptions;

use crate::{
    common::error::AppError,
    db::{SettingsRepository, StorageHandle},
    models::settings::{Engine, EngineDefaults},
    services::{
        activity_service::ActivityService, auth::AuthService, inventory_service::InventoryService,
        report_service::ReportService, sales_service::SalesService,
        subsidiary_service::SubsidiaryService, user_service::UserService,
    },
};

// ---
// Configuração lida do ambiente (.env)
// ---
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,

    pub database_url: Option<String>,
    pub mysql_url: Option<String>,
    pub mysql_host: Option<String>,
    pub mysql_port: Option<u16>,
    pub mysql_user: Option<String>,
    pub mysql_password: Option<String>,
    pub mysql_database: Option<String>,

    // `DB_ENGINE` tem precedência sobre o arquivo de configuração
    pub engine_override: Option<Engine>,
    pub db_config_path: PathBuf,
    pub max_connections: u32,

    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub password_cost: u32,

    pub upload_dir: PathBuf,
    pub admin_seed_password: String,
    pub admin_bootstrap_delay: Duration,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{name} tem um valor inválido: {raw}")),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let engine_override = match var("DB_ENGINE") {
            Some(raw) => Some(raw.parse::<Engine>().context("DB_ENGINE inválido")?),
            None => None,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".into()),
            database_url: var("DATABASE_URL"),
            mysql_url: var("MYSQL_URL"),
            mysql_host: var("MYSQL_HOST"),
            mysql_port: var("MYSQL_PORT")
                .map(|p| p.parse().context("MYSQL_PORT inválido"))
                .transpose()?,
            mysql_user: var("MYSQL_USER"),
            mysql_password: var("MYSQL_PASSWORD"),
            mysql_database: var("MYSQL_DATABASE"),
            engine_override,
            db_config_path: var("DB_CONFIG_PATH")
                .unwrap_or_else(|| "db.config.json".into())
                .into(),
            max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            session_secret: var("SESSION_SECRET").context("SESSION_SECRET deve ser definido")?,
            session_ttl_hours: parsed("SESSION_TTL_HOURS", 24)?,
            password_cost: parsed("PASSWORD_HASH_COST", bcrypt::DEFAULT_COST)?,
            upload_dir: var("UPLOAD_DIR").unwrap_or_else(|| "uploads".into()).into(),
            admin_seed_password: var("ADMIN_SEED_PASSWORD").unwrap_or_else(|| "admin123".into()),
            admin_bootstrap_delay: Duration::from_millis(parsed("ADMIN_BOOTSTRAP_DELAY_MS", 2000)?),
        })
    }

    /// `MYSQL_URL` se existir; senão monta a partir de `MYSQL_*` e dos padrões do arquivo.
    pub fn mysql_connect_options(
        &self,
        defaults: &EngineDefaults,
    ) -> Result<MySqlConnectOptions, AppError> {
        if let Some(url) = &self.mysql_url {
            return MySqlConnectOptions::from_str(url)
                .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("MYSQL_URL inválida: {e}")));
        }

        let mut options = MySqlConnectOptions::new()
            .host(self.mysql_host.as_deref().unwrap_or(&defaults.host))
            .port(self.mysql_port.unwrap_or(defaults.port))
            .username(self.mysql_user.as_deref().unwrap_or(&defaults.user))
            .database(self.mysql_database.as_deref().unwrap_or(&defaults.database));

        if let Some(password) = &self.mysql_password {
            options = options.password(password);
        }

        Ok(options)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: None,
            mysql_url: None,
            mysql_host: None,
            mysql_port: None,
            mysql_user: None,
            mysql_password: None,
            mysql_database: None,
            engine_override: None,
            db_config_path: "db.config.json".into(),
            max_connections: 1,
            session_secret: "test-session-secret".into(),
            session_ttl_hours: 1,
            password_cost: 4,
            upload_dir: "uploads".into(),
            admin_seed_password: "admin123".into(),
            admin_bootstrap_delay: Duration::ZERO,
        }
    }
}

// ---
// Estado compartilhado entre os handlers
// ---
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Engine,
    pub db: StorageHandle,
    pub settings_repo: SettingsRepository,

    pub auth_service: AuthService,
    pub subsidiary_service: SubsidiaryService,
    pub inventory_service: InventoryService,
    pub sales_service: SalesService,
    pub user_service: UserService,
    pub activity_service: ActivityService,
    pub report_service: ReportService,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn new(
        config: AppConfig,
        engine: Engine,
        db: StorageHandle,
        settings_repo: SettingsRepository,
    ) -> Self {
        let config = Arc::new(config);

        Self {
            auth_service: AuthService::new(db.clone(), config.clone()),
            subsidiary_service: SubsidiaryService::new(db.clone()),
            inventory_service: InventoryService::new(db.clone()),
            sales_service: SalesService::new(db.clone()),
            user_service: UserService::new(db.clone(), config.password_cost),
            activity_service: ActivityService::new(db.clone()),
            report_service: ReportService::new(db.clone()),
            config,
            engine,
            db,
            settings_repo,
        }
    }
}
