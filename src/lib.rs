// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Monta o router completo. Tudo sob `/api` exige Bearer, exceto o health.
pub fn app_router(app_state: AppState) -> Router {
    let assignment_routes = Router::new()
        .route(
            "/",
            post(handlers::assignments::create_assignment).get(handlers::assignments::list_assignments),
        )
        .route("/bulk", post(handlers::assignments::create_bulk_assignments))
        .route("/transfer", post(handlers::assignments::transfer_assignments))
        .route("/validate-context", post(handlers::assignments::validate_context))
        .route(
            "/{id}",
            get(handlers::assignments::get_assignment)
                .put(handlers::assignments::update_assignment)
                .delete(handlers::assignments::delete_assignment),
        );

    let user_routes = Router::new()
        .route("/{user_id}/assignments", get(handlers::assignments::list_user_assignments))
        .route("/{user_id}/assignments/active", get(handlers::assignments::list_active_assignments))
        .route("/{user_id}/contexts", get(handlers::access::list_user_contexts));

    let protected_routes = Router::new()
        .nest("/api/assignments", assignment_routes)
        .nest("/api/users", user_routes)
        .route(
            "/api/contexts/{context_type}/{context_id}/assignments",
            get(handlers::assignments::list_context_assignments),
        )
        .route("/api/permissions/check", post(handlers::access::check_permission))
        .route("/api/me/access", get(handlers::access::get_my_access))
        .route("/api/roles", get(handlers::roles::list_roles).post(handlers::roles::create_role))
        .route(
            "/api/locations",
            get(handlers::locations::list_locations).post(handlers::locations::create_location),
        )
        .route(
            "/api/projects",
            get(handlers::locations::list_projects).post(handlers::locations::create_project),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(protected_routes)
        .with_state(app_state)
}
