// src/middleware/access.rs

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::{collections::HashMap, marker::PhantomData};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Role, User},
};

// ---
// Ações protegidas e a tabela de permissões
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageSubsidiaries,
    ViewAllSales,
    ViewInventoryTotal,
    ViewAllUsers,
    ViewReports,
    ManageDatabaseConfig,
    RegisterUsers,
    // Dados de uma subsidiária (o escopo é conferido à parte)
    AccessSubsidiary,
    ManageSubsidiaryUsers,
}

impl Role {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::ManageSubsidiaries
            | Action::ViewAllSales
            | Action::ViewInventoryTotal
            | Action::ViewAllUsers
            | Action::ViewReports
            | Action::ManageDatabaseConfig
            | Action::RegisterUsers => matches!(self, Role::MhcAdmin),
            Action::AccessSubsidiary => true,
            Action::ManageSubsidiaryUsers => matches!(self, Role::SubsidiaryAdmin),
        }
    }
}

/// Até onde um usuário enxerga: tudo (matriz) ou uma única subsidiária.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    Global,
    Subsidiary(i32),
    // Usuário sem subsidiária que não é da matriz (não deveria existir)
    Nothing,
}

impl AccessScope {
    pub fn of(user: &User) -> Self {
        match (user.role, user.subsidiary_id) {
            (Role::MhcAdmin, _) => AccessScope::Global,
            (_, Some(id)) => AccessScope::Subsidiary(id),
            (_, None) => AccessScope::Nothing,
        }
    }

    pub fn check(&self, subsidiary_id: i32) -> Result<(), AppError> {
        match self {
            AccessScope::Global => Ok(()),
            AccessScope::Subsidiary(own) if *own == subsidiary_id => Ok(()),
            _ => Err(AppError::forbidden()),
        }
    }
}

// ---
// Extratores (guardiões)
// ---

/// O que é uma permissão: a ação exigida e a mensagem de recusa.
pub trait PermissionDef: Send + Sync + 'static {
    const ACTION: Action;

    fn denied() -> AppError {
        AppError::forbidden()
    }
}

/// Exige a permissão `T`, sem escopo de subsidiária.
pub struct RequirePermission<T> {
    pub user: User,
    _perm: PhantomData<T>,
}

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.role.allows(T::ACTION) {
            return Err(T::denied());
        }

        Ok(Self {
            user,
            _perm: PhantomData,
        })
    }
}

/// Exige a permissão `T` sobre a subsidiária `{subsidiary_id}` da rota.
pub struct RequireScoped<T> {
    pub user: User,
    pub subsidiary_id: i32,
    _perm: PhantomData<T>,
}

impl<T, S> FromRequestParts<S> for RequireScoped<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("Invalid subsidiary id".into()))?;
        let subsidiary_id = params
            .get("subsidiary_id")
            .and_then(|raw| raw.parse::<i32>().ok())
            .ok_or_else(|| AppError::BadRequest("Invalid subsidiary id".into()))?;

        if !user.role.allows(T::ACTION) {
            return Err(T::denied());
        }
        AccessScope::of(&user).check(subsidiary_id)?;

        Ok(Self {
            user,
            subsidiary_id,
            _perm: PhantomData,
        })
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident => $action:expr) => {
        pub struct $name;
        impl PermissionDef for $name {
            const ACTION: Action = $action;
        }
    };
    ($name:ident => $action:expr, denied = $message:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            const ACTION: Action = $action;

            fn denied() -> AppError {
                AppError::Forbidden($message.into())
            }
        }
    };
}

permission!(PermManageSubsidiaries => Action::ManageSubsidiaries);
permission!(PermViewAllSales => Action::ViewAllSales);
permission!(PermViewInventoryTotal => Action::ViewInventoryTotal);
permission!(PermViewAllUsers => Action::ViewAllUsers);
permission!(PermViewReports => Action::ViewReports);
permission!(PermManageDatabaseConfig => Action::ManageDatabaseConfig);
permission!(PermRegisterUsers => Action::RegisterUsers);
permission!(PermAccessSubsidiary => Action::AccessSubsidiary);
permission!(
    PermManageSubsidiaryUsers => Action::ManageSubsidiaryUsers,
    denied = "Only subsidiary admins can manage users"
);
