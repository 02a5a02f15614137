// src/services/subsidiary_service.rs

use validator::Validate;

use crate::{
    common::error::AppError,
    db::StorageHandle,
    models::{
        activity::{ActivityAction, NewActivityLog},
        auth::User,
        subsidiary::{CreateSubsidiaryPayload, Subsidiary, UpdateSubsidiaryPayload},
    },
};

#[derive(Clone)]
pub struct SubsidiaryService {
    db: StorageHandle,
}

impl SubsidiaryService {
    pub fn new(db: StorageHandle) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Subsidiary>, AppError> {
        self.db.get()?.list_subsidiaries().await
    }

    pub async fn get(&self, id: i32) -> Result<Subsidiary, AppError> {
        self.db
            .get()?
            .get_subsidiary(id)
            .await?
            .ok_or(AppError::NotFound("Subsidiary"))
    }

    pub async fn create(
        &self,
        actor: &User,
        payload: CreateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError> {
        let storage = self.db.get()?;

        // 1. Obrigatórios primeiro, depois formato
        let new = payload.into_new().ok_or(AppError::MissingFields)?;
        new.validate()?;

        let subsidiary = storage.create_subsidiary(&new).await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary.id),
                ActivityAction::CreateSubsidiary,
                format!("Created subsidiary: {}", subsidiary.name),
            ))
            .await?;

        tracing::info!(subsidiary_id = subsidiary.id, "🏢 Subsidiária criada: {}", subsidiary.name);
        Ok(subsidiary)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: i32,
        payload: UpdateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError> {
        let storage = self.db.get()?;
        payload.validate()?;

        let subsidiary = storage.update_subsidiary(id, &payload).await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary.id),
                ActivityAction::UpdateSubsidiary,
                format!("Updated subsidiary: {}", subsidiary.name),
            ))
            .await?;

        Ok(subsidiary)
    }
}
