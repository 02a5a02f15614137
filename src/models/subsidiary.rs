// src/models/subsidiary.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// A empresa controlada pela matriz (o "tenant")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subsidiary {
    pub id: i32,
    #[schema(example = "Acme")]
    pub name: String,
    #[schema(example = "TX1")]
    pub tax_id: String,
    #[schema(example = "a@acme.com")]
    pub email: String,
    #[schema(example = "5551234567")]
    pub phone_number: String,
    #[schema(example = "/uploads/acme.png")]
    pub logo: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub status: bool,
}

// Os obrigatórios chegam como Option para que a ausência vire
// "Missing required fields" em vez de uma rejeição genérica do JSON.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubsidiaryPayload {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub status: Option<bool>,
}

// Linha pronta para inserir (já com os obrigatórios resolvidos)
#[derive(Debug, Clone, Validate)]
pub struct NewSubsidiary {
    pub name: String,
    pub tax_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 10, message = "Phone number must be at least 10 digits"))]
    pub phone_number: String,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub status: bool,
}

impl CreateSubsidiaryPayload {
    /// Resolve os campos obrigatórios. `None` quando algum falta ou está em branco.
    pub fn into_new(self) -> Option<NewSubsidiary> {
        fn present(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        Some(NewSubsidiary {
            name: present(self.name)?,
            tax_id: present(self.tax_id)?,
            email: present(self.email)?,
            phone_number: present(self.phone_number)?,
            logo: self.logo,
            address: self.address,
            city: self.city,
            country: self.country,
            status: self.status.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubsidiaryPayload {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Tax ID cannot be empty"))]
    pub tax_id: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 10, message = "Phone number must be at least 10 digits"))]
    pub phone_number: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub status: Option<bool>,
}
