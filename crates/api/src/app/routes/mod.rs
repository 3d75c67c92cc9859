pub mod roles;
pub mod system;
