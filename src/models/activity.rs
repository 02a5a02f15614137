// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Trilha de auditoria (somente inserção)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: i32,
    // Nulo para ações da matriz
    pub subsidiary_id: Option<i32>,
    pub user_id: i32,
    #[schema(example = "CREATE_SALE")]
    pub action: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    CreateSubsidiary,
    UpdateSubsidiary,
    CreateInventory,
    UpdateInventory,
    DeleteInventory,
    CreateSale,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::CreateSubsidiary => "CREATE_SUBSIDIARY",
            ActivityAction::UpdateSubsidiary => "UPDATE_SUBSIDIARY",
            ActivityAction::CreateInventory => "CREATE_INVENTORY",
            ActivityAction::UpdateInventory => "UPDATE_INVENTORY",
            ActivityAction::DeleteInventory => "DELETE_INVENTORY",
            ActivityAction::CreateSale => "CREATE_SALE",
            ActivityAction::CreateUser => "CREATE_USER",
            ActivityAction::UpdateUser => "UPDATE_USER",
            ActivityAction::DeleteUser => "DELETE_USER",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub subsidiary_id: Option<i32>,
    pub user_id: i32,
    pub action: ActivityAction,
    pub details: String,
}

impl NewActivityLog {
    pub fn new(
        user_id: i32,
        subsidiary_id: Option<i32>,
        action: ActivityAction,
        details: impl Into<String>,
    ) -> Self {
        Self {
            subsidiary_id,
            user_id,
            action,
            details: details.into(),
        }
    }
}
