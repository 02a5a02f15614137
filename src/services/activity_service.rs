// src/services/activity_service.rs

use crate::{
    common::error::AppError,
    db::StorageHandle,
    models::{
        activity::ActivityLog,
        auth::{Role, User},
    },
};

#[derive(Clone)]
pub struct ActivityService {
    db: StorageHandle,
}

impl ActivityService {
    pub fn new(db: StorageHandle) -> Self {
        Self { db }
    }

    /// A matriz vê tudo; os demais só a própria subsidiária.
    pub async fn list_for(&self, viewer: &User) -> Result<Vec<ActivityLog>, AppError> {
        let storage = self.db.get()?;

        match (viewer.role, viewer.subsidiary_id) {
            (Role::MhcAdmin, _) => storage.list_activity_logs(None).await,
            (_, Some(subsidiary_id)) => storage.list_activity_logs(Some(subsidiary_id)).await,
            (_, None) => Ok(Vec::new()),
        }
    }
}
