// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        access::{PermRegisterUsers, RequirePermission},
        auth::{AuthenticatedUser, SESSION_COOKIE, session_token},
    },
    models::auth::{LoginPayload, RegisterUserPayload, User},
};

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login efetuado (cookie `sid` emitido)", body = User),
        (status = 401, description = "Usuário ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((jar.add(cookie), Json(session.user)))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Sessão encerrada")
    )
)]
pub async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = session_token(&jar, &headers) {
        app_state.auth_service.logout(&token).await;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "message": "Logged out" })))
}

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário da sessão", body = User),
        (status = 401, description = "Sem sessão")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn current_user(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 400, description = "Dados inválidos ou usuário já existe"),
        (status = 403, description = "Apenas a matriz pode registrar usuários")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn register(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermRegisterUsers>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .auth_service
        .register_user(&guard.user, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
