// src/services/auth.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppConfig,
    db::StorageHandle,
    models::{
        activity::{ActivityAction, NewActivityLog},
        auth::{Claims, NewUser, RegisterUserPayload, Role, User},
    },
    services::password,
};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    user_id: i32,
    expires_at: DateTime<Utc>,
}

// Sessão emitida no login
#[derive(Debug)]
pub struct IssuedSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    db: StorageHandle,
    config: Arc<AppConfig>,
    // Sessões ativas. O token só vale enquanto o `sid` estiver aqui.
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl AuthService {
    pub fn new(db: StorageHandle, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.config.session_ttl_hours)
    }

    // --- LOGIN ---
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AppError> {
        let storage = self.db.get()?;

        let user = storage
            .get_user_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_password_valid =
            password::verify_password_blocking(password.to_owned(), user.password.clone()).await?;
        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let now = Utc::now();
        let expires_at = now + self.session_ttl();
        let sid = Uuid::new_v4();

        {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|_, s| s.expires_at > now);
            sessions.insert(
                sid,
                SessionEntry {
                    user_id: user.id,
                    expires_at,
                },
            );
        }

        let token = self.create_token(user.id, sid, now, expires_at)?;
        tracing::info!(user_id = user.id, "🔑 Login efetuado: {}", user.username);

        Ok(IssuedSession {
            user,
            token,
            expires_at,
        })
    }

    // --- LOGOUT ---
    /// Revoga a sessão do token. Token inválido ou expirado não é erro.
    pub async fn logout(&self, token: &str) {
        if let Ok(claims) = self.decode_token(token) {
            self.sessions.write().await.remove(&claims.sid);
        }
    }

    pub async fn validate_session(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        let session = self
            .sessions
            .read()
            .await
            .get(&claims.sid)
            .copied()
            .ok_or(AppError::Unauthorized)?;
        if session.user_id != claims.sub || session.expires_at <= Utc::now() {
            return Err(AppError::Unauthorized);
        }

        self.db
            .get()?
            .get_user(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    // --- REGISTER (feito pela matriz) ---
    pub async fn register_user(
        &self,
        actor: &User,
        payload: RegisterUserPayload,
    ) -> Result<User, AppError> {
        let storage = self.db.get()?;

        match (payload.role.requires_subsidiary(), payload.subsidiary_id) {
            (true, None) => {
                return Err(AppError::BadRequest(
                    "A subsidiary is required for this role".into(),
                ));
            }
            (true, Some(id)) => {
                if storage.get_subsidiary(id).await?.is_none() {
                    return Err(AppError::NotFound("Subsidiary"));
                }
            }
            (false, Some(_)) => {
                return Err(AppError::BadRequest(
                    "MHC admins cannot belong to a subsidiary".into(),
                ));
            }
            (false, None) => {}
        }

        if storage.get_user_by_username(&payload.username).await?.is_some() {
            return Err(AppError::BadRequest("Username already exists".into()));
        }

        let password_hash =
            password::hash_password_blocking(payload.password, self.config.password_cost).await?;

        let user = storage
            .create_user(&NewUser {
                username: payload.username,
                password_hash,
                role: payload.role,
                subsidiary_id: payload.subsidiary_id,
            })
            .await?;

        storage
            .create_activity_log(&NewActivityLog::new(
                actor.id,
                user.subsidiary_id,
                ActivityAction::CreateUser,
                format!("Created user: {} ({})", user.username, user.role),
            ))
            .await?;

        Ok(user)
    }

    // --- BOOTSTRAP DO ADMIN PADRÃO ---
    /// Cria o `admin` da matriz se ele não existir. Retorna `true` se criou.
    pub async fn ensure_default_admin(&self) -> Result<bool, AppError> {
        let storage = self.db.get()?;

        if storage
            .get_user_by_username(DEFAULT_ADMIN_USERNAME)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let password_hash = password::hash_password_blocking(
            self.config.admin_seed_password.clone(),
            self.config.password_cost,
        )
        .await?;

        let created = storage
            .create_user(&NewUser {
                username: DEFAULT_ADMIN_USERNAME.into(),
                password_hash,
                role: Role::MhcAdmin,
                subsidiary_id: None,
            })
            .await;

        match created {
            Ok(_) => {
                tracing::info!("👤 Usuário admin padrão criado");
                Ok(true)
            }
            // Outra instância criou primeiro
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.session_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
    }

    fn create_token(
        &self,
        user_id: i32,
        sid: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            sid,
            exp: expires_at.timestamp() as usize,
            iat: issued_at.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.session_secret.as_bytes()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStorage;

    fn service() -> (AuthService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let handle = StorageHandle::ready(storage.clone());
        (
            AuthService::new(handle, Arc::new(AppConfig::for_tests())),
            storage,
        )
    }

    #[tokio::test]
    async fn default_admin_bootstrap_is_idempotent() {
        let (auth, storage) = service();

        assert!(auth.ensure_default_admin().await.unwrap());
        assert!(!auth.ensure_default_admin().await.unwrap());

        let users = crate::db::Storage::list_users(storage.as_ref()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::MhcAdmin);
        assert_eq!(users[0].subsidiary_id, None);
    }

    #[tokio::test]
    async fn login_issues_a_session_that_logout_revokes() {
        let (auth, _storage) = service();
        auth.ensure_default_admin().await.unwrap();

        let session = auth.login("admin", "admin123").await.unwrap();
        let user = auth.validate_session(&session.token).await.unwrap();
        assert_eq!(user.username, "admin");

        auth.logout(&session.token).await;
        assert!(matches!(
            auth.validate_session(&session.token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (auth, _storage) = service();
        auth.ensure_default_admin().await.unwrap();

        assert!(matches!(
            auth.login("admin", "admin124").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "admin123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn forged_tokens_are_unauthorized() {
        let (auth, _storage) = service();
        assert!(matches!(
            auth.validate_session("not-a-token").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn register_enforces_role_and_subsidiary_pairing() {
        let (auth, _storage) = service();
        auth.ensure_default_admin().await.unwrap();
        let admin = auth.login("admin", "admin123").await.unwrap().user;

        let missing_subsidiary = RegisterUserPayload {
            username: "alice".into(),
            password: "secret1".into(),
            role: Role::Staff,
            subsidiary_id: None,
        };
        assert!(matches!(
            auth.register_user(&admin, missing_subsidiary).await,
            Err(AppError::BadRequest(_))
        ));

        let unknown_subsidiary = RegisterUserPayload {
            username: "alice".into(),
            password: "secret1".into(),
            role: Role::SubsidiaryAdmin,
            subsidiary_id: Some(999),
        };
        assert!(matches!(
            auth.register_user(&admin, unknown_subsidiary).await,
            Err(AppError::NotFound("Subsidiary"))
        ));
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let (auth, _storage) = service();
        auth.ensure_default_admin().await.unwrap();
        let admin = auth.login("admin", "admin123").await.unwrap().user;

        let payload = RegisterUserPayload {
            username: "admin".into(),
            password: "secret1".into(),
            role: Role::MhcAdmin,
            subsidiary_id: None,
        };
        let err = auth.register_user(&admin, payload).await.unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");
    }
}
