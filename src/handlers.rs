pub mod access;
pub mod assignments;
pub mod locations;
pub mod roles;
