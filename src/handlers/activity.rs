// src/handlers/activity.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser,
    models::activity::ActivityLog,
};

// Admin da matriz vê tudo; os demais só a própria subsidiária
#[utoipa::path(
    get,
    path = "/api/activity-logs",
    tag = "Activity",
    responses(
        (status = 200, description = "Log de atividades (mais recentes primeiro)", body = Vec<ActivityLog>)
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_activity_logs(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let logs = app_state.activity_service.list_for(&user).await?;
    Ok(Json(logs))
}
