pub mod access;
pub mod assignment;
pub mod auth;
pub mod organization;
pub mod role;
