pub mod user_repo;
pub use user_repo::UserRepository;
pub mod assignment_repo;
pub use assignment_repo::AssignmentRepository;
pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod role_repo;
pub use role_repo::RoleRepository;
