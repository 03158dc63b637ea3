pub mod access_service;
pub mod assignment_service;
pub mod context_validator;
pub mod identity;
pub mod location_service;
pub mod permission_service;
pub mod role_service;
