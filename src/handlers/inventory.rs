// src/handlers/inventory.rs

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
        PermAccessSubsidiary, PermViewInventoryTotal, RequirePermission, RequireScoped,
    },
    models::inventory::{
        CreateInventoryPayload, InventoryItem, InventoryTotal, UpdateInventoryPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/subsidiaries/{subsidiary_id}/inventory",
    tag = "Inventory",
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 200, description = "Estoque da subsidiária", body = Vec<InventoryItem>),
        (status = 403, description = "Fora do escopo do usuário")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_inventory(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.list(scope.subsidiary_id).await?;
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/subsidiaries/{subsidiary_id}/inventory",
    tag = "Inventory",
    request_body = CreateInventoryPayload,
    params(("subsidiary_id" = i32, Path, description = "ID da subsidiária")),
    responses(
        (status = 201, description = "Item criado", body = InventoryItem),
        (status = 400, description = "Dados inválidos")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_inventory(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
    Json(payload): Json<CreateInventoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .inventory_service
        .create(&scope.user, scope.subsidiary_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    patch,
    path = "/api/subsidiaries/{subsidiary_id}/inventory/{item_id}",
    tag = "Inventory",
    request_body = UpdateInventoryPayload,
    params(
        ("subsidiary_id" = i32, Path, description = "ID da subsidiária"),
        ("item_id" = i32, Path, description = "ID do item")
    ),
    responses(
        (status = 200, description = "Item atualizado", body = InventoryItem),
        (status = 404, description = "Item não encontrado nesta subsidiária")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_inventory(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
    Path((_subsidiary_id, item_id)): Path<(i32, i32)>,
    Json(payload): Json<UpdateInventoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .inventory_service
        .update(&scope.user, scope.subsidiary_id, item_id, payload)
        .await?;

    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/subsidiaries/{subsidiary_id}/inventory/{item_id}",
    tag = "Inventory",
    params(
        ("subsidiary_id" = i32, Path, description = "ID da subsidiária"),
        ("item_id" = i32, Path, description = "ID do item")
    ),
    responses(
        (status = 200, description = "Item removido"),
        (status = 400, description = "Item com vendas registradas"),
        (status = 404, description = "Item não encontrado nesta subsidiária")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn delete_inventory(
    State(app_state): State<AppState>,
    scope: RequireScoped<PermAccessSubsidiary>,
    Path((_subsidiary_id, item_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .inventory_service
        .delete(&scope.user, scope.subsidiary_id, item_id)
        .await?;

    Ok(Json(json!({ "message": "Inventory item deleted" })))
}

#[utoipa::path(
    get,
    path = "/api/inventory/total",
    tag = "Inventory",
    responses(
        (status = 200, description = "Total de itens cadastrados", body = InventoryTotal)
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn inventory_total(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermViewInventoryTotal>,
) -> Result<impl IntoResponse, AppError> {
    let total = app_state.inventory_service.total().await?;
    Ok(Json(total))
}
