// src/handlers/subsidiaries.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::access::{
        PermAccessSubsidiary, PermManageSubsidiaries, RequirePermission, RequireScoped,
    },
    models::subsidiary::{CreateSubsidiaryPayload, Subsidiary, UpdateSubsidiaryPayload},
};

#[utoipa::path(
    get,
    path = "/api/subsidiaries",
    tag = "Subsidiaries",
    responses(
        (status = 200, description = "Todas as subsidiárias", body = Vec<Subsidiary>),
        (status = 403, description = "Apenas a matriz")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_subsidiaries(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermManageSubsidiaries>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiaries = app_state.subsidiary_service.list().await?;
    Ok(Json(subsidiaries))
}

#[utoipa::path(
    post,
    path = "/api/subsidiaries",
    tag = "Subsidiaries",
    request_body = CreateSubsidiaryPayload,
    responses(
        (status = 201, description = "Subsidiária criada", body = Subsidiary),
        (status = 400, description = "Campos obrigatórios ausentes, formato inválido ou taxId duplicado")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_subsidiary(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermManageSubsidiaries>,
    Json(payload): Json<CreateSubsidiaryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiary = app_state
        .subsidiary_service
        .create(&guard.user, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(subsidiary)))
}

#[utoipa::path(
    get,
    path = "/api/subsidiaries/{subsidiary_id}",
    tag = "Subsidiaries",
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 200, description = "Subsidiária", body = Subsidiary),
        (status = 403, description = "Fora do escopo do usuário"),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_subsidiary(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiary = app_state.subsidiary_service.get(scope.subsidiary_id).await?;
    Ok(Json(subsidiary))
}

#[utoipa::path(
    patch,
    path = "/api/subsidiaries/{subsidiary_id}",
    tag = "Subsidiaries",
    request_body = UpdateSubsidiaryPayload,
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 200, description = "Subsidiária atualizada", body = Subsidiary),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_subsidiary(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermManageSubsidiaries>,
    Path(subsidiary_id): Path<i32>,
    Json(payload): Json<UpdateSubsidiaryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiary = app_state
        .subsidiary_service
        .update(&guard.user, subsidiary_id, payload)
        .await?;

    Ok(Json(subsidiary))
}
