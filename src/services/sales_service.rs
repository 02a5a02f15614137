// src/services/sales_service.rs

use crate::{
    common::error::AppError,
    db::StorageHandle,
    models::{
        activity::{ActivityAction, NewActivityLog},
        auth::User,
        sales::{CreateSalePayload, NewSale, Sale},
    },
};

#[derive(Clone)]
pub struct SalesService {
    db: StorageHandle,
}

impl SalesService {
    pub fn new(db: StorageHandle) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> Result<Vec<Sale>, AppError> {
        self.db.get()?.list_sales().await
    }

    pub async fn list_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<Sale>, AppError> {
        self.db.get()?.list_sales_by_subsidiary(subsidiary_id).await
    }

    /// Registra a venda. A baixa de estoque e o log acontecem na mesma
    /// transação do armazenamento.
    pub async fn record_sale(
        &self,
        actor: &User,
        subsidiary_id: i32,
        payload: CreateSalePayload,
    ) -> Result<Sale, AppError> {
        let storage = self.db.get()?;

        if payload.quantity <= 0 {
            return Err(AppError::BadRequest("Quantity must be at least 1.".into()));
        }

        // Preço "congelado": o informado ou o preço atual do item
        let sale_price = match payload.sale_price {
            Some(price) => price,
            None => {
                storage
                    .get_inventory(payload.item_id)
                    .await?
                    .filter(|item| item.subsidiary_id == subsidiary_id)
                    .ok_or(AppError::NotFound("Inventory item"))?
                    .sale_price
            }
        };
        if sale_price.is_sign_negative() {
            return Err(AppError::BadRequest("Sale price cannot be negative.".into()));
        }

        let sale = NewSale {
            subsidiary_id,
            user_id: actor.id,
            item_id: payload.item_id,
            quantity: payload.quantity,
            sale_price,
        };
        let log = NewActivityLog::new(
            actor.id,
            Some(subsidiary_id),
            ActivityAction::CreateSale,
            format!("Created sale: {} items at ${:.2}", sale.quantity, sale.sale_price),
        );

        let created = storage.create_sale(&sale, &log).await?;

        tracing::info!(
            sale_id = created.id,
            subsidiary_id,
            item_id = created.item_id,
            "🧾 Venda registrada ({} un.)",
            created.quantity
        );
        Ok(created)
    }
}
