// src/db.rs

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    config::AppConfig,
    models::{
        activity::{ActivityLog, NewActivityLog},
        auth::{NewUser, User, UserChanges},
        inventory::{InventoryItem, NewInventoryItem, UpdateInventoryPayload},
        sales::{NewSale, Sale},
        settings::DatabaseSettings,
        subsidiary::{NewSubsidiary, Subsidiary, UpdateSubsidiaryPayload},
    },
};

pub mod mysql;
pub mod postgres;
pub mod settings_repo;

#[cfg(test)]
pub mod memory;
#[cfg(test)]
pub(crate) mod sale_scenarios;

pub use crate::models::settings::Engine;
pub use mysql::MySqlStorage;
pub use postgres::PgStorage;
pub use settings_repo::SettingsRepository;

pub const CONNECT_ATTEMPTS: u32 = 3;
pub const CONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Interface única sobre os dois motores. Cada motor tem o seu adaptador,
/// escolhido uma vez na inicialização.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    // --- Usuários ---
    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn list_users_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<User>, AppError>;
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError>;
    async fn update_user(&self, id: i32, changes: &UserChanges) -> Result<User, AppError>;
    async fn delete_user(&self, id: i32) -> Result<(), AppError>;

    // --- Subsidiárias ---
    async fn get_subsidiary(&self, id: i32) -> Result<Option<Subsidiary>, AppError>;
    async fn list_subsidiaries(&self) -> Result<Vec<Subsidiary>, AppError>;
    async fn create_subsidiary(&self, subsidiary: &NewSubsidiary) -> Result<Subsidiary, AppError>;
    async fn update_subsidiary(
        &self,
        id: i32,
        changes: &UpdateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError>;

    // --- Estoque ---
    async fn get_inventory(&self, id: i32) -> Result<Option<InventoryItem>, AppError>;
    async fn list_inventory_by_subsidiary(
        &self,
        subsidiary_id: i32,
    ) -> Result<Vec<InventoryItem>, AppError>;
    async fn count_inventory(&self) -> Result<i64, AppError>;
    async fn create_inventory(&self, item: &NewInventoryItem) -> Result<InventoryItem, AppError>;
    async fn update_inventory(
        &self,
        id: i32,
        changes: &UpdateInventoryPayload,
    ) -> Result<InventoryItem, AppError>;
    async fn delete_inventory(&self, id: i32) -> Result<(), AppError>;

    // --- Vendas ---

    /// Tudo ou nada: valida o saldo com a linha travada, grava a venda,
    /// baixa o estoque e registra o log de atividade na mesma transação.
    async fn create_sale(&self, sale: &NewSale, log: &NewActivityLog) -> Result<Sale, AppError>;
    async fn list_sales(&self) -> Result<Vec<Sale>, AppError>;
    async fn list_sales_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<Sale>, AppError>;

    // --- Logs de atividade ---
    async fn create_activity_log(&self, log: &NewActivityLog) -> Result<ActivityLog, AppError>;
    async fn list_activity_logs(
        &self,
        subsidiary_id: Option<i32>,
    ) -> Result<Vec<ActivityLog>, AppError>;
}

// ---
// Handle "pronto / não pronto"
// ---

/// O armazenamento é construído antes de servir requisições. Se a conexão
/// falhou, o handle fica vazio e toda rota de dados responde 503.
#[derive(Clone)]
pub struct StorageHandle(Option<Arc<dyn Storage>>);

impl StorageHandle {
    pub fn ready(storage: Arc<dyn Storage>) -> Self {
        Self(Some(storage))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }

    pub fn is_ready(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Result<&dyn Storage, AppError> {
        self.0.as_deref().ok_or(AppError::DatabaseUnavailable)
    }
}

// ---
// Tradução de erros do sqlx (compartilhada pelos dois adaptadores)
// ---

pub(crate) fn map_db_error(operation: &'static str, e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let message = match operation {
                "create_user" | "update_user" => "Username already exists",
                "create_subsidiary" | "update_subsidiary" => "Tax ID already exists",
                _ => "Record already exists",
            };
            return AppError::Conflict(message.into());
        }
        if db_err.is_foreign_key_violation() {
            let message = match operation {
                "delete_inventory" => "Inventory item has recorded sales and cannot be deleted",
                "delete_user" => "User has recorded sales or activity and cannot be deleted",
                "create_user" => "Subsidiary does not exist",
                _ => "Referenced record does not exist",
            };
            return AppError::Conflict(message.into());
        }
    }

    tracing::error!(operation, error = %e, "Database operation failed");
    AppError::DatabaseError(e)
}

// ---
// Conexão com retentativas
// ---

/// Tenta `op` até `attempts` vezes com espera fixa entre as tentativas.
/// Devolve o último erro se todas falharem.
pub async fn retry<T, F, Fut>(attempts: u32, backoff: Duration, mut op: F) -> Result<T, AppError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut last_error = None;

    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let remaining = attempts - attempt;
                if remaining > 0 {
                    tracing::warn!(
                        error = %e,
                        "Connection attempt failed, retrying... ({} attempts remaining)",
                        remaining
                    );
                    tokio::time::sleep(backoff).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(AppError::DatabaseUnavailable))
}

/// Constrói o adaptador do motor configurado. Parâmetros obrigatórios
/// ausentes falham na hora, sem retentativa.
pub async fn connect(
    engine: Engine,
    config: &AppConfig,
    settings: &DatabaseSettings,
) -> Result<Arc<dyn Storage>, AppError> {
    tracing::info!("Initializing database connection for {}", engine);

    let max_connections = config.max_connections;

    match engine {
        Engine::Postgresql => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                AppError::InternalServerError(anyhow::anyhow!(
                    "DATABASE_URL must be set for PostgreSQL connection."
                ))
            })?;

            let storage = retry(CONNECT_ATTEMPTS, CONNECT_BACKOFF, move |_| {
                PgStorage::open(url, max_connections)
            })
            .await?;

            Ok(Arc::new(storage))
        }
        Engine::Mysql => {
            let options = config.mysql_connect_options(&settings.mysql)?;
            let options = &options;

            let storage = retry(CONNECT_ATTEMPTS, CONNECT_BACKOFF, move |_| {
                MySqlStorage::open(options.clone(), max_connections)
            })
            .await?;

            Ok(Arc::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retry_stops_at_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry(3, Duration::from_millis(1), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(AppError::DatabaseUnavailable)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_surfaces_the_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AppError> = retry(3, Duration::from_millis(1), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(AppError::BadRequest(format!("attempt {attempt}"))) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().to_string(), "attempt 3");
    }

    #[tokio::test]
    async fn postgres_without_database_url_fails_fast() {
        let mut config = AppConfig::for_tests();
        config.database_url = None;

        let result = connect(Engine::Postgresql, &config, &DatabaseSettings::default()).await;
        let err = result.err().expect("connection must not be built");
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn empty_handle_reports_unavailable() {
        let handle = StorageHandle::unavailable();
        assert!(!handle.is_ready());
        assert!(matches!(handle.get(), Err(AppError::DatabaseUnavailable)));
    }
}
