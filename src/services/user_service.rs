// src/services/user_service.rs

use crate::{
    common::error::AppError,
    db::{Storage, StorageHandle},
    models::{
        activity::{ActivityAction, NewActivityLog},
        auth::{CreateStaffPayload, NewUser, Role, UpdateStaffPayload, User, UserChanges},
    },
    services::password,
};

// Gestão dos usuários de uma subsidiária (feita pelo admin da própria subsidiária)
#[derive(Clone)]
pub struct UserService {
    db: StorageHandle,
    password_cost: u32,
}

async fn member_of(storage: &dyn Storage, subsidiary_id: i32, user_id: i32) -> Result<User, AppError> {
    storage
        .get_user(user_id)
        .await?
        .filter(|u| u.subsidiary_id == Some(subsidiary_id))
        .ok_or(AppError::NotFound("User"))
}

async fn ensure_username_free(
    storage: &dyn Storage,
    username: &str,
    except: Option<i32>,
) -> Result<(), AppError> {
    match storage.get_user_by_username(username).await? {
        Some(existing) if Some(existing.id) != except => {
            Err(AppError::BadRequest("Username already exists".into()))
        }
        _ => Ok(()),
    }
}

impl UserService {
    pub fn new(db: StorageHandle, password_cost: u32) -> Self {
        Self { db, password_cost }
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        self.db.get()?.list_users().await
    }

    pub async fn list_by_subsidiary(&self, subsidiary_id: i32) -> Result<Vec<User>, AppError> {
        self.db.get()?.list_users_by_subsidiary(subsidiary_id).await
    }

    /// Usuários criados aqui são sempre `staff` da subsidiária da rota.
    pub async fn create_staff(
        &self,
        actor: &User,
        subsidiary_id: i32,
        payload: CreateStaffPayload,
    ) -> Result<User, AppError> {
        let storage = self.db.get()?;
        ensure_username_free(storage, &payload.username, None).await?;

        let password_hash =
            password::hash_password_blocking(payload.password, self.password_cost).await?;

        let user = storage
            .create_user(&NewUser {
                username: payload.username,
                password_hash,
                role: Role::Staff,
                subsidiary_id: Some(subsidiary_id),
            })
            .await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary_id),
                ActivityAction::CreateUser,
                format!("Created user: {}", user.username),
            ))
            .await?;

        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &User,
        subsidiary_id: i32,
        user_id: i32,
        payload: UpdateStaffPayload,
    ) -> Result<User, AppError> {
        let storage = self.db.get()?;
        member_of(storage, subsidiary_id, user_id).await?;

        if let Some(username) = &payload.username {
            ensure_username_free(storage, username, Some(user_id)).await?;
        }

        let password_hash = match payload.password {
            Some(pw) => Some(password::hash_password_blocking(pw, self.password_cost).await?),
            None => None,
        };

        let user = storage
            .update_user(
                user_id,
                &UserChanges {
                    username: payload.username,
                    password_hash,
                },
            )
            .await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary_id),
                ActivityAction::UpdateUser,
                format!("Updated user: {}", user.username),
            ))
            .await?;

        Ok(user)
    }

    pub async fn delete(
        &self,
        actor: &User,
        subsidiary_id: i32,
        user_id: i32,
    ) -> Result<(), AppError> {
        let storage = self.db.get()?;
        let user = member_of(storage, subsidiary_id, user_id).await?;

        if user.id == actor.id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".into(),
            ));
        }

        storage.delete_user(user_id).await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                Some(subsidiary_id),
                ActivityAction::DeleteUser,
                format!("Deleted user: {}", user.username),
            ))
            .await?;

        Ok(())
    }
}
