use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Missing required fields")]
    MissingFields,

    #[error("Insufficient stock")]
    InsufficientStock,

    // Violação de chave única / estrangeira, já com mensagem amigável
    #[error("{0}")]
    Conflict(String),

    #[error("Database connection not initialized")]
    DatabaseUnavailable,

    // Variante para erros de banco de dados
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn forbidden() -> Self {
        AppError::Forbidden("Forbidden".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::MissingFields
            | AppError::InsufficientStock
            | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "message": "One or more fields are invalid.",
                    "details": details,
                })
            }

            // Erros 5xx são logados aqui com o detalhe; o cliente recebe mensagem genérica.
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Internal server error: {}", e);
                json!({ "message": "An unexpected error occurred." })
            }

            e => json!({ "message": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
