// src/routes.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Monta o router completo da API.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout));

    let subsidiary_routes = Router::new()
        .route(
            "/api/subsidiaries",
            get(handlers::subsidiaries::list_subsidiaries)
                .post(handlers::subsidiaries::create_subsidiary),
        )
        .route(
            "/api/subsidiaries/{subsidiary_id}",
            get(handlers::subsidiaries::get_subsidiary)
                .patch(handlers::subsidiaries::update_subsidiary),
        )
        .route(
            "/api/subsidiaries/{subsidiary_id}/inventory",
            get(handlers::inventory::list_inventory).post(handlers::inventory::create_inventory),
        )
        .route(
            "/api/subsidiaries/{subsidiary_id}/inventory/{item_id}",
            patch(handlers::inventory::update_inventory)
                .delete(handlers::inventory::delete_inventory),
        )
        .route(
            "/api/subsidiaries/{subsidiary_id}/sales",
            get(handlers::sales::list_subsidiary_sales).post(handlers::sales::create_sale),
        )
        .route(
            "/api/subsidiaries/{subsidiary_id}/users",
            get(handlers::users::list_subsidiary_users)
                .post(handlers::users::create_subsidiary_user),
        )
        .route(
            "/api/subsidiaries/{subsidiary_id}/users/{user_id}",
            patch(handlers::users::update_subsidiary_user)
                .delete(handlers::users::delete_subsidiary_user),
        );

    // Rotas protegidas (sessão obrigatória)
    let protected_routes = Router::new()
        .route("/api/user", get(handlers::auth::current_user))
        .route("/api/register", post(handlers::auth::register))
        .route("/api/sales", get(handlers::sales::list_all_sales))
        .route("/api/inventory/total", get(handlers::inventory::inventory_total))
        .route("/api/users", get(handlers::users::list_all_users))
        .route(
            "/api/activity-logs",
            get(handlers::activity::list_activity_logs),
        )
        .route("/api/reports/{report_type}", get(handlers::reports::get_report))
        .route(
            "/api/config/database",
            get(handlers::settings::get_database_config)
                .post(handlers::settings::update_database_config),
        )
        .merge(subsidiary_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/uploads", ServeDir::new(&app_state.config.upload_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
