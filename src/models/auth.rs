// src/models/auth.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Papéis (fechados)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    MhcAdmin,
    SubsidiaryAdmin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MhcAdmin => "mhc_admin",
            Role::SubsidiaryAdmin => "subsidiary_admin",
            Role::Staff => "staff",
        }
    }

    /// Somente o administrador da matriz vive fora de uma subsidiária.
    pub fn requires_subsidiary(&self) -> bool {
        match self {
            Role::MhcAdmin => false,
            Role::SubsidiaryAdmin | Role::Staff => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("papel desconhecido: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mhc_admin" => Ok(Role::MhcAdmin),
            "subsidiary_admin" => Ok(Role::SubsidiaryAdmin),
            "staff" => Ok(Role::Staff),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Usado pelo `FromRow` (a coluna é texto nos dois motores)
impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password: String,

    #[sqlx(try_from = "String")]
    pub role: Role,

    pub subsidiary_id: Option<i32>,
}

// Dados que o repositório precisa para inserir um usuário
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub subsidiary_id: Option<i32>,
}

// Alterações parciais (PATCH)
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, max = 71, message = "Password must be 1 to 71 characters."))]
    pub password: String,
}

// Cadastro feito pela matriz (ex: o admin de uma nova subsidiária)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 3, message = "Username must be at least 3 characters."))]
    pub username: String,
    #[validate(length(min = 6, max = 71, message = "Password must be 6 to 71 characters."))]
    pub password: String,
    pub role: Role,
    pub subsidiary_id: Option<i32>,
}

// Usuário criado pelo admin da subsidiária (sempre `staff`)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStaffPayload {
    #[validate(length(min = 3, message = "Username must be at least 3 characters."))]
    pub username: String,
    #[validate(length(min = 6, max = 71, message = "Password must be 6 to 71 characters."))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStaffPayload {
    #[validate(length(min = 3, message = "Username must be at least 3 characters."))]
    pub username: Option<String>,
    #[validate(length(min = 6, max = 71, message = "Password must be 6 to 71 characters."))]
    pub password: Option<String>,
}

// Estrutura de dados ("claims") dentro do token de sessão
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,   // ID do usuário
    pub sid: Uuid,  // ID da sessão (revogável no logout)
    pub exp: usize,
    pub iat: usize,
}
