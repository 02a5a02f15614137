// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::middleware::auth::SESSION_COOKIE;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::current_user,
        handlers::auth::register,

        // --- Subsidiaries ---
        handlers::subsidiaries::list_subsidiaries,
        handlers::subsidiaries::create_subsidiary,
        handlers::subsidiaries::get_subsidiary,
        handlers::subsidiaries::update_subsidiary,

        // --- Inventory ---
        handlers::inventory::list_inventory,
        handlers::inventory::create_inventory,
        handlers::inventory::update_inventory,
        handlers::inventory::delete_inventory,
        handlers::inventory::inventory_total,

        // --- Sales ---
        handlers::sales::list_subsidiary_sales,
        handlers::sales::create_sale,
        handlers::sales::list_all_sales,

        // --- Users ---
        handlers::users::list_subsidiary_users,
        handlers::users::create_subsidiary_user,
        handlers::users::update_subsidiary_user,
        handlers::users::delete_subsidiary_user,
        handlers::users::list_all_users,

        // --- Activity / Reports ---
        handlers::activity::list_activity_logs,
        handlers::reports::get_report,

        // --- Settings ---
        handlers::settings::get_database_config,
        handlers::settings::update_database_config,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,

            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::RegisterUserPayload,
            models::auth::CreateStaffPayload,
            models::auth::UpdateStaffPayload,

            // --- Subsidiaries ---
            models::subsidiary::Subsidiary,
            models::subsidiary::CreateSubsidiaryPayload,
            models::subsidiary::UpdateSubsidiaryPayload,

            // --- Inventory ---
            models::inventory::InventoryItem,
            models::inventory::CreateInventoryPayload,
            models::inventory::UpdateInventoryPayload,
            models::inventory::InventoryTotal,

            // --- Sales ---
            models::sales::Sale,
            models::sales::CreateSalePayload,

            // --- Activity / Reports ---
            models::activity::ActivityLog,
            models::report::ReportKind,

            // --- Settings ---
            models::settings::Engine,
            models::settings::EngineDefaults,
            models::settings::DatabaseSettings,
            models::settings::EngineDefaultsPatch,
            models::settings::UpdateDatabaseSettingsRequest,
            models::settings::UpdateDatabaseSettingsResponse,
        )
    ),
    tags(
        (name = "Health", description = "Estado do processo e do banco"),
        (name = "Auth", description = "Login, Sessão e Registro"),
        (name = "Subsidiaries", description = "Gestão das Subsidiárias"),
        (name = "Inventory", description = "Estoque por Subsidiária"),
        (name = "Sales", description = "Vendas e Baixa de Estoque"),
        (name = "Users", description = "Usuários das Subsidiárias"),
        (name = "Activity", description = "Trilha de Auditoria"),
        (name = "Reports", description = "Relatórios (JSON, CSV e impressão)"),
        (name = "Settings", description = "Configuração do Banco de Dados")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_scoped_routes_and_session_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/subsidiaries/{subsidiary_id}/inventory"));
        assert!(doc.paths.paths.contains_key("/api/reports/{report_type}"));

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("session_cookie"));
        assert!(schemes.contains_key("api_jwt"));
    }
}
