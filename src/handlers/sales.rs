// src/handlers/sales.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::access::{PermAccessSubsidiary, PermViewAllSales, RequirePermission, RequireScoped},
    models::sales::{CreateSalePayload, Sale},
};

#[utoipa::path(
    get,
    path = "/api/subsidiaries/{subsidiary_id}/sales",
    tag = "Sales",
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 200, description = "Vendas da subsidiária (mais recentes primeiro)", body = Vec<Sale>)
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_subsidiary_sales(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
) -> Result<impl IntoResponse, AppError> {
    let sales = app_state
        .sales_service
        .list_by_subsidiary(scope.subsidiary_id)
        .await?;
    Ok(Json(sales))
}

#[utoipa::path(
    post,
    path = "/api/subsidiaries/{subsidiary_id}/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 201, description = "Venda registrada e estoque baixado", body = Sale),
        (status = 400, description = "Estoque insuficiente ou dados inválidos"),
        (status = 404, description = "Item não encontrado nesta subsidiária")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sale = app_state
        .sales_service
        .record_sale(&scope.user, scope.subsidiary_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    responses(
        (status = 200, description = "Vendas de todas as subsidiárias", body = Vec<Sale>)
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_all_sales(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermViewAllSales>,
) -> Result<impl IntoResponse, AppError> {
    let sales = app_state.sales_service.list_all().await?;
    Ok(Json(sales))
}
