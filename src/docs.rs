// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Assignments ---
        handlers::assignments::create_assignment,
        handlers::assignments::create_bulk_assignments,
        handlers::assignments::list_assignments,
        handlers::assignments::get_assignment,
        handlers::assignments::update_assignment,
        handlers::assignments::delete_assignment,
        handlers::assignments::transfer_assignments,
        handlers::assignments::validate_context,
        handlers::assignments::list_user_assignments,
        handlers::assignments::list_active_assignments,
        handlers::assignments::list_context_assignments,

        // --- Access ---
        handlers::access::get_my_access,
        handlers::access::list_user_contexts,
        handlers::access::check_permission,

        // --- Roles ---
        handlers::roles::list_roles,
        handlers::roles::create_role,

        // --- Locations ---
        handlers::locations::list_locations,
        handlers::locations::create_location,
        handlers::locations::list_projects,
        handlers::locations::create_project,
    ),
    components(
        schemas(
            // --- Assignments ---
            models::assignment::ContextType,
            models::assignment::UserAssignment,
            models::assignment::AssignmentResponse,
            models::assignment::CreateAssignmentPayload,
            models::assignment::BulkCreateAssignmentsPayload,
            models::assignment::UpdateAssignmentPayload,
            models::assignment::TransferAssignmentsPayload,
            models::assignment::TransferResult,
            models::assignment::ValidateContextPayload,

            // --- Access ---
            models::access::ResolvedAccess,
            models::access::PermissionCheckPayload,
            models::access::PermissionCheck,
            models::access::UserContext,

            // --- Roles ---
            models::role::Role,
            models::role::CreateRolePayload,

            // --- Locations ---
            models::organization::Location,
            models::organization::Project,
            models::organization::CreateLocationPayload,
            models::organization::CreateProjectPayload,
            models::organization::LocationCreated,
        )
    ),
    tags(
        (name = "Assignments", description = "Atribuições de cargos por contexto"),
        (name = "Access", description = "Resolução de acesso e verificação de permissões"),
        (name = "Roles", description = "Cargos padrão e customizados"),
        (name = "Locations", description = "Locais e obras da organização")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
