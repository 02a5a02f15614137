// src/handlers/settings.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::access::{PermManageDatabaseConfig, RequirePermission},
    models::settings::{
        DatabaseSettings, Engine, InvalidEngine, UpdateDatabaseSettingsRequest,
        UpdateDatabaseSettingsResponse,
    },
};

// GET /api/config/database
#[utoipa::path(
    get,
    path = "/api/config/database",
    tag = "Settings",
    responses(
        (status = 200, description = "Configuração do banco (padrões se o arquivo não existir)", body = DatabaseSettings)
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_database_config(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermManageDatabaseConfig>,
) -> impl IntoResponse {
    Json(app_state.settings_repo.load().await)
}

// POST /api/config/database
#[utoipa::path(
    post,
    path = "/api/config/database",
    tag = "Settings",
    request_body = UpdateDatabaseSettingsRequest,
    responses(
        (status = 200, description = "Configuração salva; vale após reiniciar", body = UpdateDatabaseSettingsResponse),
        (status = 400, description = "Motor inválido")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_database_config(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermManageDatabaseConfig>,
    Json(payload): Json<UpdateDatabaseSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let engine: Engine = payload
        .engine
        .parse()
        .map_err(|e: InvalidEngine| AppError::BadRequest(e.to_string()))?;

    let mut settings = app_state.settings_repo.load().await;
    settings.engine = engine;
    if let Some(patch) = payload.postgresql {
        patch.apply_to(&mut settings.postgresql);
    }
    if let Some(patch) = payload.mysql {
        patch.apply_to(&mut settings.mysql);
    }

    app_state.settings_repo.save(&settings).await?;

    Ok(Json(UpdateDatabaseSettingsResponse {
        message: "Database configuration updated successfully".into(),
        note: "Server restart required for changes to take effect".into(),
        engine,
    }))
}
