// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::AppState, models::settings::Engine};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// ready | unavailable
    pub database: String,
    pub engine: Engine,
}

// Sempre 200: o processo está de pé mesmo sem banco
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Processo no ar e estado do banco", body = HealthResponse)
    )
)]
pub async fn health(State(app_state): State<AppState>) -> impl IntoResponse {
    let database = match app_state.db.get() {
        Ok(storage) => match storage.ping().await {
            Ok(()) => "ready",
            Err(_) => "unavailable",
        },
        Err(_) => "unavailable",
    };

    Json(HealthResponse {
        status: "ok".into(),
        database: database.into(),
        engine: app_state.engine,
    })
}
