// src/db/mysql.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    MySqlPool,
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
};
use std::time::Duration;

use crate::{
    common::error::AppError,
    db::{Storage, map_db_error},
    models::{
        activity::{ActivityLog, NewActivityLog},
        auth::{NewUser, User, UserChanges},
        inventory::{InventoryItem, NewInventoryItem, UpdateInventoryPayload},
        sales::{NewSale, Sale},
        subsidiary::{NewSubsidiary, Subsidiary, UpdateSubsidiaryPayload},
    },
};

// Adaptador MySQL. Sem `RETURNING`: insere, pega o `last_insert_id` e relê a linha.
#[derive(Clone)]
pub struct MySqlStorage {
    pool: MySqlPool,
}

fn inserted_id(raw: u64) -> Result<i32, AppError> {
    i32::try_from(raw).map_err(|_| {
        AppError::InternalServerError(anyhow::anyhow!("Inserted id {raw} does not fit in INT"))
    })
}

impl MySqlStorage {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn open(options: MySqlConnectOptions, max_connections: u32) -> Result<Self, AppError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::info!("✅ Conexão com o MySQL estabelecida com sucesso!");

        sqlx::migrate!("./migrations/mysql").run(&pool).await?;
        tracing::info!("✅ Migrações do MySQL executadas com sucesso!");

        Ok(Self::new(pool))
    }

    async fn fetch_user(&self, id: i32) -> Result<User, AppError> {
        self.get_user(id).await?.ok_or(AppError::NotFound("User"))
    }

    async fn fetch_subsidiary(&self, id: i32) -> Result<Subsidiary, AppError> {
        self.get_subsidiary(id)
            .await?
            .ok_or(AppError::NotFound("Subsidiary"))
    }

    async fn fetch_inventory(&self, id: i32) -> Result<InventoryItem, AppError> {
        self.get_inventory(id)
            .await?
            .ok_or(AppError::NotFound("Inventory item"))
    }
}

#[async_trait]
impl Storage for MySqlStorage {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("ping", e))?;
        Ok(())
    }

    // ---
    // Usuários
    // ---

    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_user", e))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_user_by_username", e))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_users", e))
    }

    async fn list_users_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE subsidiary_id = ? ORDER BY id")
            .bind(subsidiary_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_users_by_subsidiary", e))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password, role, subsidiary_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.subsidiary_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("create_user", e))?;

        self.fetch_user(inserted_id(result.last_insert_id())?).await
    }

    async fn update_user(&self, id: i32, changes: &UserChanges) -> Result<User, AppError> {
        sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE(?, username),
                password = COALESCE(?, password)
            WHERE id = ?
            "#,
        )
        .bind(changes.username.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("update_user", e))?;

        // `rows_affected` é 0 também quando nada mudou, então relemos
        self.fetch_user(id).await
    }

    async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("delete_user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User"));
        }
        Ok(())
    }

    // ---
    // Subsidiárias
    // ---

    async fn get_subsidiary(&self, id: i32) -> Result<Option<Subsidiary>, AppError> {
        sqlx::query_as::<_, Subsidiary>("SELECT * FROM subsidiaries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_subsidiary", e))
    }

    async fn list_subsidiaries(&self) -> Result<Vec<Subsidiary>, AppError> {
        sqlx::query_as::<_, Subsidiary>("SELECT * FROM subsidiaries ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_subsidiaries", e))
    }

    async fn create_subsidiary(&self, s: &NewSubsidiary) -> Result<Subsidiary, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subsidiaries
                (name, tax_id, email, phone_number, logo, address, city, country, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&s.name)
        .bind(&s.tax_id)
        .bind(&s.email)
        .bind(&s.phone_number)
        .bind(s.logo.as_deref())
        .bind(s.address.as_deref())
        .bind(s.city.as_deref())
        .bind(s.country.as_deref())
        .bind(s.status)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("create_subsidiary", e))?;

        self.fetch_subsidiary(inserted_id(result.last_insert_id())?)
            .await
    }

    async fn update_subsidiary(
        &self,
        id: i32,
        c: &UpdateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError> {
        sqlx::query(
            r#"
            UPDATE subsidiaries SET
                name = COALESCE(?, name),
                tax_id = COALESCE(?, tax_id),
                email = COALESCE(?, email),
                phone_number = COALESCE(?, phone_number),
                logo = COALESCE(?, logo),
                address = COALESCE(?, address),
                city = COALESCE(?, city),
                country = COALESCE(?, country),
                status = COALESCE(?, status)
            WHERE id = ?
            "#,
        )
        .bind(c.name.as_deref())
        .bind(c.tax_id.as_deref())
        .bind(c.email.as_deref())
        .bind(c.phone_number.as_deref())
        .bind(c.logo.as_deref())
        .bind(c.address.as_deref())
        .bind(c.city.as_deref())
        .bind(c.country.as_deref())
        .bind(c.status)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("update_subsidiary", e))?;

        self.fetch_subsidiary(id).await
    }

    // ---
    // Estoque
    // ---

    async fn get_inventory(&self, id: i32) -> Result<Option<InventoryItem>, AppError> {
        sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_inventory", e))
    }

    async fn list_inventory_by_subsidiary(
        &self,
        subsidiary_id: i32,
    ) -> Result<Vec<InventoryItem>, AppError> {
        sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory WHERE subsidiary_id = ? ORDER BY name ASC, id ASC",
        )
        .bind(subsidiary_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("list_inventory_by_subsidiary", e))
    }

    async fn count_inventory(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("count_inventory", e))
    }

    async fn create_inventory(&self, item: &NewInventoryItem) -> Result<InventoryItem, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory
                (subsidiary_id, sku, name, description, category, cost_price, sale_price, quantity)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.subsidiary_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.description.as_deref())
        .bind(&item.category)
        .bind(item.cost_price)
        .bind(item.sale_price)
        .bind(item.quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("create_inventory", e))?;

        self.fetch_inventory(inserted_id(result.last_insert_id())?)
            .await
    }

    async fn update_inventory(
        &self,
        id: i32,
        c: &UpdateInventoryPayload,
    ) -> Result<InventoryItem, AppError> {
        sqlx::query(
            r#"
            UPDATE inventory SET
                sku = COALESCE(?, sku),
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                cost_price = COALESCE(?, cost_price),
                sale_price = COALESCE(?, sale_price),
                quantity = COALESCE(?, quantity)
            WHERE id = ?
            "#,
        )
        .bind(c.sku.as_deref())
        .bind(c.name.as_deref())
        .bind(c.description.as_deref())
        .bind(c.category.as_deref())
        .bind(c.cost_price)
        .bind(c.sale_price)
        .bind(c.quantity)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("update_inventory", e))?;

        self.fetch_inventory(id).await
    }

    async fn delete_inventory(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("delete_inventory", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item"));
        }
        Ok(())
    }

    // ---
    // Vendas
    // ---

    async fn create_sale(&self, sale: &NewSale, log: &NewActivityLog) -> Result<Sale, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("create_sale", e))?;

        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory WHERE id = ? FOR UPDATE",
        )
        .bind(sale.item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("create_sale", e))?
        .filter(|item| item.subsidiary_id == sale.subsidiary_id)
        .ok_or(AppError::NotFound("Inventory item"))?;

        if sale.quantity > item.quantity {
            return Err(AppError::InsufficientStock);
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO sales (subsidiary_id, user_id, item_id, quantity, sale_price, `timestamp`)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.subsidiary_id)
        .bind(sale.user_id)
        .bind(sale.item_id)
        .bind(sale.quantity)
        .bind(sale.sale_price)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("create_sale", e))?;
        let sale_id = inserted_id(result.last_insert_id())?;

        let decremented =
            sqlx::query("UPDATE inventory SET quantity = quantity - ? WHERE id = ? AND quantity >= ?")
                .bind(sale.quantity)
                .bind(sale.item_id)
                .bind(sale.quantity)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("create_sale", e))?;
        if decremented.rows_affected() != 1 {
            return Err(AppError::InsufficientStock);
        }

        sqlx::query(
            r#"
            INSERT INTO activity_logs (subsidiary_id, user_id, action, details, `timestamp`)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.subsidiary_id)
        .bind(log.user_id)
        .bind(log.action.as_str())
        .bind(&log.details)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("create_sale", e))?;

        let created = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?")
            .bind(sale_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_db_error("create_sale", e))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("create_sale", e))?;

        Ok(created)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, AppError> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY `timestamp` DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_sales", e))
    }

    async fn list_sales_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<Sale>, AppError> {
        sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE subsidiary_id = ? ORDER BY `timestamp` DESC, id DESC",
        )
        .bind(subsidiary_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("list_sales_by_subsidiary", e))
    }

    // ---
    // Logs de atividade
    // ---

    async fn create_activity_log(&self, log: &NewActivityLog) -> Result<ActivityLog, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO activity_logs (subsidiary_id, user_id, action, details, `timestamp`)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.subsidiary_id)
        .bind(log.user_id)
        .bind(log.action.as_str())
        .bind(&log.details)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("create_activity_log", e))?;

        sqlx::query_as::<_, ActivityLog>("SELECT * FROM activity_logs WHERE id = ?")
            .bind(inserted_id(result.last_insert_id())?)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("create_activity_log", e))
    }

    async fn list_activity_logs(
        &self,
        subsidiary_id: Option<i32>,
    ) -> Result<Vec<ActivityLog>, AppError> {
        let query = match subsidiary_id {
            Some(id) => sqlx::query_as::<_, ActivityLog>(
                "SELECT * FROM activity_logs WHERE subsidiary_id = ? ORDER BY `timestamp` DESC, id DESC",
            )
            .bind(id),
            None => sqlx::query_as::<_, ActivityLog>(
                "SELECT * FROM activity_logs ORDER BY `timestamp` DESC, id DESC",
            ),
        };

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_activity_logs", e))
    }
}
