// src/models/inventory.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

// Item de estoque de uma subsidiária
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i32,
    pub subsidiary_id: i32,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryPayload {
    #[validate(length(min = 1, message = "SKU is required."))]
    pub sku: String,

    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "Category is required."))]
    pub category: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub sale_price: Decimal,

    #[validate(range(min = 0, message = "Quantity cannot be negative."))]
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub subsidiary_id: i32,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub quantity: i32,
}

impl NewInventoryItem {
    pub fn from_payload(subsidiary_id: i32, payload: CreateInventoryPayload) -> Self {
        Self {
            subsidiary_id,
            sku: payload.sku,
            name: payload.name,
            description: payload.description,
            category: payload.category,
            cost_price: payload.cost_price,
            sale_price: payload.sale_price,
            quantity: payload.quantity,
        }
    }
}

// PATCH: o que vier `None` permanece como está
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryPayload {
    #[validate(length(min = 1, message = "SKU cannot be empty."))]
    pub sku: Option<String>,

    #[validate(length(min = 1, message = "Name cannot be empty."))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "Category cannot be empty."))]
    pub category: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub sale_price: Option<Decimal>,

    #[validate(range(min = 0, message = "Quantity cannot be negative."))]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTotal {
    pub total_products: i64,
}
