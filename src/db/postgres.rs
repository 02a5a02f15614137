// src/db/postgres.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, postgres::PgPoolOptions};
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

// Adaptador PostgreSQL: usa `RETURNING *` em toda escrita.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conecta, testa a conexão e aplica as migrações.
    pub async fn open(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::info!("✅ Conexão com o PostgreSQL estabelecida com sucesso!");

        sqlx::migrate!("./migrations/postgres").run(&pool).await?;
        tracing::info!("✅ Migrações do PostgreSQL executadas com sucesso!");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Storage for PgStorage {
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
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_user", e))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
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
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE subsidiary_id = $1 ORDER BY id")
            .bind(subsidiary_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_users_by_subsidiary", e))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role, subsidiary_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.subsidiary_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("create_user", e))
    }

    async fn update_user(&self, id: i32, changes: &UserChanges) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username = COALESCE($1, username),
                password = COALESCE($2, password)
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(changes.username.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("update_user", e))?
        .ok_or(AppError::NotFound("User"))
    }

    async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
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
        sqlx::query_as::<_, Subsidiary>("SELECT * FROM subsidiaries WHERE id = $1")
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
        sqlx::query_as::<_, Subsidiary>(
            r#"
            INSERT INTO subsidiaries
                (name, tax_id, email, phone_number, logo, address, city, country, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
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
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("create_subsidiary", e))
    }

    async fn update_subsidiary(
        &self,
        id: i32,
        c: &UpdateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError> {
        sqlx::query_as::<_, Subsidiary>(
            r#"
            UPDATE subsidiaries SET
                name = COALESCE($1, name),
                tax_id = COALESCE($2, tax_id),
                email = COALESCE($3, email),
                phone_number = COALESCE($4, phone_number),
                logo = COALESCE($5, logo),
                address = COALESCE($6, address),
                city = COALESCE($7, city),
                country = COALESCE($8, country),
                status = COALESCE($9, status)
            WHERE id = $10
            RETURNING *
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
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("update_subsidiary", e))?
        .ok_or(AppError::NotFound("Subsidiary"))
    }

    // ---
    // Estoque
    // ---

    async fn get_inventory(&self, id: i32) -> Result<Option<InventoryItem>, AppError> {
        sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE id = $1")
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
            "SELECT * FROM inventory WHERE subsidiary_id = $1 ORDER BY name ASC, id ASC",
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
        sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory
                (subsidiary_id, sku, name, description, category, cost_price, sale_price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
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
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("create_inventory", e))
    }

    async fn update_inventory(
        &self,
        id: i32,
        c: &UpdateInventoryPayload,
    ) -> Result<InventoryItem, AppError> {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory SET
                sku = COALESCE($1, sku),
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                cost_price = COALESCE($5, cost_price),
                sale_price = COALESCE($6, sale_price),
                quantity = COALESCE($7, quantity)
            WHERE id = $8
            RETURNING *
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
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("update_inventory", e))?
        .ok_or(AppError::NotFound("Inventory item"))
    }

    async fn delete_inventory(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
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

        // Trava a linha do item até o commit (sem venda duplicada do mesmo saldo)
        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory WHERE id = $1 FOR UPDATE",
        )
        .bind(sale.item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("create_sale", e))?
        .filter(|item| item.subsidiary_id == sale.subsidiary_id)
        .ok_or(AppError::NotFound("Inventory item"))?;

        // Se sair daqui com erro, o `tx` sofre rollback ao sair do escopo (drop)
        if sale.quantity > item.quantity {
            return Err(AppError::InsufficientStock);
        }

        let created = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (subsidiary_id, user_id, item_id, quantity, sale_price, "timestamp")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(sale.subsidiary_id)
        .bind(sale.user_id)
        .bind(sale.item_id)
        .bind(sale.quantity)
        .bind(sale.sale_price)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("create_sale", e))?;

        let decremented =
            sqlx::query("UPDATE inventory SET quantity = quantity - $1 WHERE id = $2 AND quantity >= $1")
                .bind(sale.quantity)
                .bind(sale.item_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("create_sale", e))?;
        if decremented.rows_affected() != 1 {
            return Err(AppError::InsufficientStock);
        }

        sqlx::query(
            r#"
            INSERT INTO activity_logs (subsidiary_id, user_id, action, details, "timestamp")
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(log.subsidiary_id)
        .bind(log.user_id)
        .bind(log.action.as_str())
        .bind(&log.details)
        .bind(created.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("create_sale", e))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("create_sale", e))?;

        Ok(created)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, AppError> {
        sqlx::query_as::<_, Sale>(r#"SELECT * FROM sales ORDER BY "timestamp" DESC, id DESC"#)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_sales", e))
    }

    async fn list_sales_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<Sale>, AppError> {
        sqlx::query_as::<_, Sale>(
            r#"SELECT * FROM sales WHERE subsidiary_id = $1 ORDER BY "timestamp" DESC, id DESC"#,
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
        sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (subsidiary_id, user_id, action, details, "timestamp")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(log.subsidiary_id)
        .bind(log.user_id)
        .bind(log.action.as_str())
        .bind(&log.details)
        .bind(Utc::now())
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
                r#"SELECT * FROM activity_logs WHERE subsidiary_id = $1 ORDER BY "timestamp" DESC, id DESC"#,
            )
            .bind(id),
            None => sqlx::query_as::<_, ActivityLog>(
                r#"SELECT * FROM activity_logs ORDER BY "timestamp" DESC, id DESC"#,
            ),
        };

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_activity_logs", e))
    }
}
