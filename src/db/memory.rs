// src/db/memory.rs
//
// Armazenamento em memória para os testes de serviço e de rota.
// Segue as mesmas regras dos adaptadores SQL: ids sequenciais, unicidade de
// username e taxId, e venda "tudo ou nada".

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    common::error::AppError,
    db::Storage,
    services::password,
    models::{
        activity::{ActivityLog, NewActivityLog},
        auth::{NewUser, Role, User, UserChanges},
        inventory::{InventoryItem, NewInventoryItem, UpdateInventoryPayload},
        sales::{NewSale, Sale},
        subsidiary::{NewSubsidiary, Subsidiary, UpdateSubsidiaryPayload},
    },
};

pub const SEED_PASSWORD: &str = "password123";

#[derive(Clone, Default)]
struct Tables {
    users: Vec<User>,
    subsidiaries: Vec<Subsidiary>,
    inventory: Vec<InventoryItem>,
    sales: Vec<Sale>,
    activity_logs: Vec<ActivityLog>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn push_log(&mut self, log: &NewActivityLog) -> ActivityLog {
        let row = ActivityLog {
            id: self.next_id(),
            subsidiary_id: log.subsidiary_id,
            user_id: log.user_id,
            action: log.action.as_str().to_string(),
            details: Some(log.details.clone()),
            timestamp: Utc::now(),
        };
        self.activity_logs.push(row.clone());
        row
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
    fail_activity_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faz toda escrita de log de atividade falhar (inclusive dentro da venda).
    pub fn fail_activity_writes(&self, fail: bool) {
        self.fail_activity_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // --- Atalhos para montar cenários ---

    /// Senha de todo usuário semeado: `password123`.
    pub fn seed_user(&self, username: &str, role: Role, subsidiary_id: Option<i32>) -> User {
        let mut tables = self.lock();
        let row = User {
            id: tables.next_id(),
            username: username.to_string(),
            password: password::hash_password(SEED_PASSWORD, 4)
                .expect("hash de teste"),
            role,
            subsidiary_id,
        };
        tables.users.push(row.clone());
        row
    }

    pub fn seed_subsidiary(&self, name: &str, tax_id: &str) -> Subsidiary {
        let mut tables = self.lock();
        let row = Subsidiary {
            id: tables.next_id(),
            name: name.to_string(),
            tax_id: tax_id.to_string(),
            email: format!("contact@{}.com", name.to_lowercase()),
            phone_number: "5551234567".into(),
            logo: None,
            address: None,
            city: None,
            country: None,
            status: true,
        };
        tables.subsidiaries.push(row.clone());
        row
    }

    pub fn seed_item(
        &self,
        subsidiary_id: i32,
        name: &str,
        quantity: i32,
        sale_price: Decimal,
    ) -> InventoryItem {
        let mut tables = self.lock();
        let row = InventoryItem {
            id: tables.next_id(),
            subsidiary_id,
            sku: format!("SKU-{}", name.to_uppercase()),
            name: name.to_string(),
            description: None,
            category: "General".into(),
            cost_price: sale_price / Decimal::TWO,
            sale_price,
            quantity,
        };
        tables.inventory.push(row.clone());
        row
    }

    fn check_log_write(&self) -> Result<(), AppError> {
        if self.fail_activity_writes.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "activity log write failed"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.lock().users.clone())
    }

    async fn list_users_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<User>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| u.subsidiary_id == Some(subsidiary_id))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already exists".into()));
        }
        if let Some(sid) = user.subsidiary_id {
            if !tables.subsidiaries.iter().any(|s| s.id == sid) {
                return Err(AppError::Conflict("Subsidiary does not exist".into()));
            }
        }

        let row = User {
            id: tables.next_id(),
            username: user.username.clone(),
            password: user.password_hash.clone(),
            role: user.role,
            subsidiary_id: user.subsidiary_id,
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn update_user(&self, id: i32, changes: &UserChanges) -> Result<User, AppError> {
        let mut tables = self.lock();
        if let Some(username) = &changes.username {
            if tables.users.iter().any(|u| u.id != id && &u.username == username) {
                return Err(AppError::Conflict("Username already exists".into()));
            }
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::NotFound("User"))?;
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(hash) = &changes.password_hash {
            user.password = hash.clone();
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        let mut tables = self.lock();
        if tables.sales.iter().any(|s| s.user_id == id)
            || tables.activity_logs.iter().any(|l| l.user_id == id)
        {
            return Err(AppError::Conflict(
                "User has recorded sales or activity and cannot be deleted".into(),
            ));
        }
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(AppError::NotFound("User"));
        }
        Ok(())
    }

    async fn get_subsidiary(&self, id: i32) -> Result<Option<Subsidiary>, AppError> {
        Ok(self.lock().subsidiaries.iter().find(|s| s.id == id).cloned())
    }

    async fn list_subsidiaries(&self) -> Result<Vec<Subsidiary>, AppError> {
        Ok(self.lock().subsidiaries.clone())
    }

    async fn create_subsidiary(&self, s: &NewSubsidiary) -> Result<Subsidiary, AppError> {
        let mut tables = self.lock();
        if tables.subsidiaries.iter().any(|x| x.tax_id == s.tax_id) {
            return Err(AppError::Conflict("Tax ID already exists".into()));
        }

        let row = Subsidiary {
            id: tables.next_id(),
            name: s.name.clone(),
            tax_id: s.tax_id.clone(),
            email: s.email.clone(),
            phone_number: s.phone_number.clone(),
            logo: s.logo.clone(),
            address: s.address.clone(),
            city: s.city.clone(),
            country: s.country.clone(),
            status: s.status,
        };
        tables.subsidiaries.push(row.clone());
        Ok(row)
    }

    async fn update_subsidiary(
        &self,
        id: i32,
        c: &UpdateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError> {
        let mut tables = self.lock();
        if let Some(tax_id) = &c.tax_id {
            if tables.subsidiaries.iter().any(|s| s.id != id && &s.tax_id == tax_id) {
                return Err(AppError::Conflict("Tax ID already exists".into()));
            }
        }

        let s = tables
            .subsidiaries
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(AppError::NotFound("Subsidiary"))?;
        let c = c.clone();
        if let Some(v) = c.name {
            s.name = v;
        }
        if let Some(v) = c.tax_id {
            s.tax_id = v;
        }
        if let Some(v) = c.email {
            s.email = v;
        }
        if let Some(v) = c.phone_number {
            s.phone_number = v;
        }
        if c.logo.is_some() {
            s.logo = c.logo;
        }
        if c.address.is_some() {
            s.address = c.address;
        }
        if c.city.is_some() {
            s.city = c.city;
        }
        if c.country.is_some() {
            s.country = c.country;
        }
        if let Some(v) = c.status {
            s.status = v;
        }
        Ok(s.clone())
    }

    async fn get_inventory(&self, id: i32) -> Result<Option<InventoryItem>, AppError> {
        Ok(self.lock().inventory.iter().find(|i| i.id == id).cloned())
    }

    async fn list_inventory_by_subsidiary(
        &self,
        subsidiary_id: i32,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let mut items: Vec<InventoryItem> = self
            .lock()
            .inventory
            .iter()
            .filter(|i| i.subsidiary_id == subsidiary_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn count_inventory(&self) -> Result<i64, AppError> {
        Ok(self.lock().inventory.len() as i64)
    }

    async fn create_inventory(&self, item: &NewInventoryItem) -> Result<InventoryItem, AppError> {
        let mut tables = self.lock();
        let row = InventoryItem {
            id: tables.next_id(),
            subsidiary_id: item.subsidiary_id,
            sku: item.sku.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            cost_price: item.cost_price,
            sale_price: item.sale_price,
            quantity: item.quantity,
        };
        tables.inventory.push(row.clone());
        Ok(row)
    }

    async fn update_inventory(
        &self,
        id: i32,
        c: &UpdateInventoryPayload,
    ) -> Result<InventoryItem, AppError> {
        let mut tables = self.lock();
        let item = tables
            .inventory
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(AppError::NotFound("Inventory item"))?;
        let c = c.clone();
        if let Some(v) = c.sku {
            item.sku = v;
        }
        if let Some(v) = c.name {
            item.name = v;
        }
        if c.description.is_some() {
            item.description = c.description;
        }
        if let Some(v) = c.category {
            item.category = v;
        }
        if let Some(v) = c.cost_price {
            item.cost_price = v;
        }
        if let Some(v) = c.sale_price {
            item.sale_price = v;
        }
        if let Some(v) = c.quantity {
            item.quantity = v;
        }
        Ok(item.clone())
    }

    async fn delete_inventory(&self, id: i32) -> Result<(), AppError> {
        let mut tables = self.lock();
        if tables.sales.iter().any(|s| s.item_id == id) {
            return Err(AppError::Conflict(
                "Inventory item has recorded sales and cannot be deleted".into(),
            ));
        }
        let before = tables.inventory.len();
        tables.inventory.retain(|i| i.id != id);
        if tables.inventory.len() == before {
            return Err(AppError::NotFound("Inventory item"));
        }
        Ok(())
    }

    async fn create_sale(&self, sale: &NewSale, log: &NewActivityLog) -> Result<Sale, AppError> {
        let mut tables = self.lock();

        // Trabalha numa cópia e só publica no final, como um commit
        let mut staged = tables.clone();

        let item = staged
            .inventory
            .iter_mut()
            .find(|i| i.id == sale.item_id && i.subsidiary_id == sale.subsidiary_id)
            .ok_or(AppError::NotFound("Inventory item"))?;
        if sale.quantity > item.quantity {
            return Err(AppError::InsufficientStock);
        }
        item.quantity -= sale.quantity;

        let created = Sale {
            id: staged.next_id(),
            subsidiary_id: sale.subsidiary_id,
            user_id: sale.user_id,
            item_id: sale.item_id,
            quantity: sale.quantity,
            sale_price: sale.sale_price,
            timestamp: Utc::now(),
        };
        staged.sales.push(created.clone());

        self.check_log_write()?;
        staged.push_log(log);

        *tables = staged;
        Ok(created)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, AppError> {
        let mut sales = self.lock().sales.clone();
        sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(sales)
    }

    async fn list_sales_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<Sale>, AppError> {
        let mut sales = self.list_sales().await?;
        sales.retain(|s| s.subsidiary_id == subsidiary_id);
        Ok(sales)
    }

    async fn create_activity_log(&self, log: &NewActivityLog) -> Result<ActivityLog, AppError> {
        self.check_log_write()?;
        Ok(self.lock().push_log(log))
    }

    async fn list_activity_logs(
        &self,
        subsidiary_id: Option<i32>,
    ) -> Result<Vec<ActivityLog>, AppError> {
        let mut logs: Vec<ActivityLog> = self
            .lock()
            .activity_logs
            .iter()
            .filter(|l| subsidiary_id.is_none() || l.subsidiary_id == subsidiary_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(logs)
    }
}
