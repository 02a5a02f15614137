// src/services/inventory_service.rs

use crate::{
    common::error::AppError,
    db::{Storage, StorageHandle},
    models::{
        activity::{ActivityAction, NewActivityLog},
        auth::User,
        inventory::{
            CreateInventoryPayload, InventoryItem, InventoryTotal, NewInventoryItem,
            UpdateInventoryPayload,
        },
    },
};

#[derive(Clone)]
pub struct InventoryService {
    db: StorageHandle,
}

/// O item precisa existir e pertencer à subsidiária da rota.
async fn owned_item(
    storage: &dyn Storage,
    subsidiary_id: i32,
    item_id: i32,
) -> Result<InventoryItem, AppError> {
    storage
        .get_inventory(item_id)
        .await?
        .filter(|item| item.subsidiary_id == subsidiary_id)
        .ok_or(AppError::NotFound("Inventory item"))
}

impl InventoryService {
    pub fn new(db: StorageHandle) -> Self {
        Self { db }
    }

    pub async fn list(&self, subsidiary_id: i32) -> Result<Vec<InventoryItem>, AppError> {
        self.db
            .get()?
            .list_inventory_by_subsidiary(subsidiary_id)
            .await
    }

    pub async fn total(&self) -> Result<InventoryTotal, AppError> {
        let total_products = self.db.get()?.count_inventory().await?;
        Ok(InventoryTotal { total_products })
    }

    pub async fn create(
        &self,
        actor: &User,
        subsidiary_id: i32,
        payload: CreateInventoryPayload,
    ) -> Result<InventoryItem, AppError> {
        let storage = self.db.get()?;

        if storage.get_subsidiary(subsidiary_id).await?.is_none() {
            return Err(AppError::NotFound("Subsidiary"));
        }

        let item = storage
            .create_inventory(&NewInventoryItem::from_payload(subsidiary_id, payload))
            .await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary_id),
                ActivityAction::CreateInventory,
                format!("Created inventory item: {}", item.name),
            ))
            .await?;

        Ok(item)
    }

    pub async fn update(
        &self,
        actor: &User,
        subsidiary_id: i32,
        item_id: i32,
        payload: UpdateInventoryPayload,
    ) -> Result<InventoryItem, AppError> {
        let storage = self.db.get()?;
        let before = owned_item(storage, subsidiary_id, item_id).await?;

        let item = storage.update_inventory(item_id, &payload).await?;

        let details = if before.quantity != item.quantity {
            format!(
                "Updated inventory item: {} - Quantity changed from {} to {}",
                item.name, before.quantity, item.quantity
            )
        } else {
            format!("Updated inventory item: {}", item.name)
        };

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary_id),
                ActivityAction::UpdateInventory,
                details,
            ))
            .await?;

        Ok(item)
    }

    pub async fn delete(
        &self,
        actor: &User,
        subsidiary_id: i32,
        item_id: i32,
    ) -> Result<(), AppError> {
        let storage = self.db.get()?;
        let item = owned_item(storage, subsidiary_id, item_id).await?;

        storage.delete_inventory(item_id).await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary_id),
                ActivityAction::DeleteInventory,
                format!("Deleted inventory item: {}", item.name),
            ))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory::MemoryStorage, models::auth::Role};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    struct Fixture {
        service: InventoryService,
        storage: Arc<MemoryStorage>,
        staff: User,
        acme: i32,
        globex: i32,
    }

    fn setup() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let acme = storage.seed_subsidiary("Acme", "TX1").id;
        let globex = storage.seed_subsidiary("Globex", "TX2").id;
        let staff = storage.seed_user("bob", Role::Staff, Some(acme));
        Fixture {
            service: InventoryService::new(StorageHandle::ready(storage.clone())),
            storage,
            staff,
            acme,
            globex,
        }
    }

    #[tokio::test]
    async fn quantity_changes_are_described_in_the_log() {
        let f = setup();
        let item = f.storage.seed_item(f.acme, "Widget", 10, Decimal::new(500, 2));

        let updated = f
            .service
            .update(
                &f.staff,
                f.acme,
                item.id,
                UpdateInventoryPayload {
                    quantity: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, 7);

        let logs = f.storage.list_activity_logs(Some(f.acme)).await.unwrap();
        assert_eq!(logs[0].action, "UPDATE_INVENTORY");
        assert_eq!(
            logs[0].details.as_deref(),
            Some("Updated inventory item: Widget - Quantity changed from 10 to 7")
        );
    }

    #[tokio::test]
    async fn items_of_another_subsidiary_are_not_found() {
        let f = setup();
        let foreign = f.storage.seed_item(f.globex, "Gadget", 3, Decimal::ONE);

        assert!(matches!(
            f.service.delete(&f.staff, f.acme, foreign.id).await,
            Err(AppError::NotFound("Inventory item"))
        ));
        assert_eq!(f.service.list(f.globex).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_and_delete_update_the_total() {
        let f = setup();

        let item = f
            .service
            .create(
                &f.staff,
                f.acme,
                CreateInventoryPayload {
                    sku: "W-1".into(),
                    name: "Widget".into(),
                    description: None,
                    category: "Tools".into(),
                    cost_price: Decimal::new(200, 2),
                    sale_price: Decimal::new(500, 2),
                    quantity: 4,
                },
            )
            .await
            .unwrap();
        assert_eq!(f.service.total().await.unwrap().total_products, 1);

        f.service.delete(&f.staff, f.acme, item.id).await.unwrap();
        assert_eq!(f.service.total().await.unwrap().total_products, 0);

        let actions: Vec<String> = f
            .storage
            .list_activity_logs(None)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.action)
            .collect();
        assert!(actions.contains(&"CREATE_INVENTORY".to_string()));
        assert!(actions.contains(&"DELETE_INVENTORY".to_string()));
    }
}
