// src/db/settings_repo.rs

use std::path::PathBuf;

use crate::{common::error::AppError, models::settings::DatabaseSettings};

// Persistência do arquivo `db.config.json`. Lido na inicialização e
// regravado pelo endpoint de configuração (vale a partir do próximo restart).
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    path: PathBuf,
}

impl SettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Arquivo ausente ou ilegível resulta nos padrões.
    pub async fn load(&self) -> DatabaseSettings {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Arquivo de configuração do banco ausente, usando padrões");
                return DatabaseSettings::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Falha ao ler configuração do banco, usando padrões");
                return DatabaseSettings::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Configuração do banco inválida, usando padrões");
                DatabaseSettings::default()
            }
        }
    }

    /// Grava num arquivo temporário e renomeia, para nunca deixar um JSON pela metade.
    pub async fn save(&self, settings: &DatabaseSettings) -> Result<(), AppError> {
        let body = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::info!(path = %self.path.display(), engine = %settings.engine, "💾 Configuração do banco salva");
        Ok(())
    }
}
