// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::access::{
        PermAccessSubsidiary, PermManageSubsidiaryUsers, PermViewAllUsers, RequirePermission,
        RequireScoped,
    },
    models::auth::{CreateStaffPayload, UpdateStaffPayload, User},
};

#[utoipa::path(
    get,
    path = "/api/subsidiaries/{subsidiary_id}/users",
    tag = "Users",
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 200, description = "Usuários da subsidiária", body = Vec<User>)
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_subsidiary_users(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state
        .user_service
        .list_by_subsidiary(scope.subsidiary_id)
        .await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/subsidiaries/{subsidiary_id}/users",
    tag = "Users",
    request_body = CreateStaffPayload,
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 201, description = "Usuário `staff` criado", body = User),
        (status = 403, description = "Apenas o admin da subsidiária")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_subsidiary_user(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermManageSubsidiaryUsers>,
    Json(payload): Json<CreateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .user_service
        .create_staff(&scope.user, scope.subsidiary_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    patch,
    path = "/api/subsidiaries/{subsidiary_id}/users/{user_id}",
    tag = "Users",
    request_body = UpdateStaffPayload,
    params(
        ("subsidiary_id" = i32, Path, description = "ID da subsidiária"),
        ("user_id" = i32, Path, description = "ID do usuário")
    ),
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 404, description = "Usuário não pertence à subsidiária")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_subsidiary_user(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermManageSubsidiaryUsers>,
    Path((_subsidiary_id, user_id)): Path<(i32, i32)>,
    Json(payload): Json<UpdateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .user_service
        .update(&scope.user, scope.subsidiary_id, user_id, payload)
        .await?;

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/subsidiaries/{subsidiary_id}/users/{user_id}",
    tag = "Users",
    params(
        ("subsidiary_id" = i32, Path, description = "ID da subsidiária"),
        ("user_id" = i32, Path, description = "ID do usuário")
    ),
    responses(
        (status = 200, description = "Usuário removido"),
        (status = 404, description = "Usuário não pertence à subsidiária")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn delete_subsidiary_user(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermManageSubsidiaryUsers>,
    Path((_subsidiary_id, user_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .user_service
        .delete(&scope.user, scope.subsidiary_id, user_id)
        .await?;

    Ok(Json(json!({ "message": "User deleted" })))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Todos os usuários", body = Vec<User>)
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_all_users(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermViewAllUsers>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.user_service.list_all().await?;
    Ok(Json(users))
}
