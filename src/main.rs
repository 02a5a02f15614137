// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppConfig, AppState};
use crate::db::{SettingsRepository, StorageHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Sem configuração válida a aplicação não deve iniciar
    let config = AppConfig::from_env()?;

    let settings_repo = SettingsRepository::new(config.db_config_path.clone());
    let settings = settings_repo.load().await;
    let engine = config.engine_override.unwrap_or(settings.engine);

    if engine.is_postgres() && config.database_url.is_none() {
        tracing::warn!("DATABASE_URL ausente: o PostgreSQL não vai conectar");
    } else if engine.is_mysql() && config.mysql_url.is_none() {
        tracing::info!("MYSQL_URL ausente, usando MYSQL_* e os padrões de {}", config.db_config_path.display());
    }

    // Banco fora do ar não derruba o processo: as rotas de dados respondem 503
    let db = match db::connect(engine, &config, &settings).await {
        Ok(storage) => {
            tracing::info!("✅ Banco de dados ({}) pronto", engine);
            StorageHandle::ready(storage)
        }
        Err(e) => {
            tracing::error!("Falha ao conectar no banco ({}): {}", engine, e);
            StorageHandle::unavailable()
        }
    };

    let bind_addr = config.bind_addr.clone();
    let bootstrap_delay = config.admin_bootstrap_delay;
    let app_state = AppState::new(config, engine, db, settings_repo);

    // Garante o admin padrão depois de um pequeno atraso
    if app_state.db.is_ready() {
        let auth_service = app_state.auth_service.clone();
        tokio::spawn(async move {
            tokio::time::sleep(bootstrap_delay).await;
            if let Err(e) = auth_service.ensure_default_admin().await {
                tracing::error!("Falha ao criar o admin padrão: {}", e);
            }
        });
    }

    let app = routes::build_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
