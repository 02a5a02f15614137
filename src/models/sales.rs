// src/models/sales.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Venda registrada. Imutável depois de criada.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i32,
    pub subsidiary_id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    // Preço no momento da venda
    pub sale_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    pub item_id: i32,

    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: i32,

    // Se não vier, usa o preço de venda atual do item
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub subsidiary_id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub sale_price: Decimal,
}
