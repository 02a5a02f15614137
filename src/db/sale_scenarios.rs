// src/db/sale_scenarios.rs
//
// Cenários da venda atômica rodados contra qualquer `Storage`.
// Os adaptadores SQL chamam estes cenários nos seus próprios testes.

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::Storage,
    models::{
        activity::{ActivityAction, NewActivityLog},
        auth::{NewUser, Role},
        inventory::NewInventoryItem,
        sales::NewSale,
        subsidiary::NewSubsidiary,
    },
};

pub struct Fixture {
    pub subsidiary_id: i32,
    pub user_id: i32,
    pub item_id: i32,
}

pub async fn seed(storage: &dyn Storage, stock: i32) -> Fixture {
    let subsidiary = storage
        .create_subsidiary(&NewSubsidiary {
            name: "Alpha".into(),
            tax_id: "TX-ALPHA".into(),
            email: "contact@alpha.com".into(),
            phone_number: "5551234567".into(),
            logo: None,
            address: None,
            city: None,
            country: None,
            status: true,
        })
        .await
        .unwrap();

    let user = storage
        .create_user(&NewUser {
            username: "clerk".into(),
            password_hash: "4$not-a-real-digest.00".into(),
            role: Role::Staff,
            subsidiary_id: Some(subsidiary.id),
        })
        .await
        .unwrap();

    let item = storage
        .create_inventory(&NewInventoryItem {
            subsidiary_id: subsidiary.id,
            sku: "SKU-WIDGET".into(),
            name: "Widget".into(),
            description: None,
            category: "General".into(),
            cost_price: Decimal::new(500, 2),
            sale_price: Decimal::new(1000, 2),
            quantity: stock,
        })
        .await
        .unwrap();

    Fixture {
        subsidiary_id: subsidiary.id,
        user_id: user.id,
        item_id: item.id,
    }
}

fn sale_of(fx: &Fixture, quantity: i32) -> NewSale {
    NewSale {
        subsidiary_id: fx.subsidiary_id,
        user_id: fx.user_id,
        item_id: fx.item_id,
        quantity,
        sale_price: Decimal::new(1000, 2),
    }
}

fn log_for(fx: &Fixture, user_id: i32) -> NewActivityLog {
    NewActivityLog::new(
        user_id,
        Some(fx.subsidiary_id),
        ActivityAction::CreateSale,
        "Sold Widget",
    )
}

async fn stock_of(storage: &dyn Storage, fx: &Fixture) -> i32 {
    storage
        .get_inventory(fx.item_id)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

async fn sale_logs(storage: &dyn Storage, fx: &Fixture) -> usize {
    storage
        .list_activity_logs(Some(fx.subsidiary_id))
        .await
        .unwrap()
        .iter()
        .filter(|l| l.action == "CREATE_SALE")
        .count()
}

pub async fn oversell_leaves_stock_untouched(storage: &dyn Storage) {
    let fx = seed(storage, 3).await;

    let err = storage
        .create_sale(&sale_of(&fx, 4), &log_for(&fx, fx.user_id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock), "{err:?}");
    assert_eq!(stock_of(storage, &fx).await, 3);
    assert!(storage.list_sales_by_subsidiary(fx.subsidiary_id).await.unwrap().is_empty());
    assert_eq!(sale_logs(storage, &fx).await, 0);
}

pub async fn exact_sale_empties_stock_and_logs(storage: &dyn Storage) {
    let fx = seed(storage, 3).await;

    let sale = storage
        .create_sale(&sale_of(&fx, 3), &log_for(&fx, fx.user_id))
        .await
        .unwrap();

    assert_eq!(sale.quantity, 3);
    assert_eq!(sale.item_id, fx.item_id);
    assert_eq!(stock_of(storage, &fx).await, 0);
    assert_eq!(storage.list_sales_by_subsidiary(fx.subsidiary_id).await.unwrap().len(), 1);
    assert_eq!(sale_logs(storage, &fx).await, 1);

    // Sem saldo, a próxima unidade é recusada
    let err = storage
        .create_sale(&sale_of(&fx, 1), &log_for(&fx, fx.user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock), "{err:?}");
}

/// `log_user_id` deve fazer a gravação do log falhar dentro da transação.
pub async fn failed_log_rolls_back_the_sale(storage: &dyn Storage, log_user_id: Option<i32>) {
    let fx = seed(storage, 5).await;
    let log = log_for(&fx, log_user_id.unwrap_or(fx.user_id));

    let result = storage.create_sale(&sale_of(&fx, 2), &log).await;

    assert!(result.is_err());
    assert_eq!(stock_of(storage, &fx).await, 5);
    assert!(storage.list_sales_by_subsidiary(fx.subsidiary_id).await.unwrap().is_empty());
    assert_eq!(sale_logs(storage, &fx).await, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStorage;

    #[tokio::test]
    async fn memory_refuses_oversell() {
        oversell_leaves_stock_untouched(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn memory_sells_down_to_zero() {
        exact_sale_empties_stock_and_logs(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn memory_rolls_back_when_the_log_fails() {
        let storage = MemoryStorage::new();
        storage.fail_activity_writes(true);
        failed_log_rolls_back_the_sale(&storage, None).await;
    }
}
