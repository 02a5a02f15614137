// src/models/settings.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

// Motor relacional escolhido pelo operador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Postgresql,
    Mysql,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Postgresql => "postgresql",
            Engine::Mysql => "mysql",
        }
    }

    pub fn is_postgres(&self) -> bool {
        matches!(self, Engine::Postgresql)
    }

    pub fn is_mysql(&self) -> bool {
        matches!(self, Engine::Mysql)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid database engine. Must be 'postgresql' or 'mysql'")]
pub struct InvalidEngine;

impl FromStr for Engine {
    type Err = InvalidEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" => Ok(Engine::Postgresql),
            "mysql" => Ok(Engine::Mysql),
            _ => Err(InvalidEngine),
        }
    }
}

// Padrões de conexão de um motor (a senha fica só no ambiente)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EngineDefaults {
    #[schema(example = "localhost")]
    pub host: String,
    #[schema(example = 5432)]
    pub port: u16,
    pub database: String,
    pub user: String,
}

// O arquivo de configuração do banco (`db.config.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseSettings {
    pub engine: Engine,
    pub postgresql: EngineDefaults,
    pub mysql: EngineDefaults,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: Engine::Postgresql,
            postgresql: EngineDefaults {
                host: "localhost".into(),
                port: 5432,
                database: "postgres".into(),
                user: "postgres".into(),
            },
            mysql: EngineDefaults {
                host: "localhost".into(),
                port: 3306,
                database: "subsidiary_management".into(),
                user: "root".into(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EngineDefaultsPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
}

impl EngineDefaultsPatch {
    pub fn apply_to(self, target: &mut EngineDefaults) {
        if let Some(host) = self.host.filter(|h| !h.is_empty()) {
            target.host = host;
        }
        if let Some(port) = self.port {
            target.port = port;
        }
        if let Some(database) = self.database.filter(|d| !d.is_empty()) {
            target.database = database;
        }
        if let Some(user) = self.user.filter(|u| !u.is_empty()) {
            target.user = user;
        }
    }
}

// O motor chega como texto para que um valor inválido vire 400 com mensagem clara
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDatabaseSettingsRequest {
    #[schema(example = "mysql")]
    pub engine: String,
    pub postgresql: Option<EngineDefaultsPatch>,
    pub mysql: Option<EngineDefaultsPatch>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateDatabaseSettingsResponse {
    pub message: String,
    pub note: String,
    pub engine: Engine,
}
