//! Infrastructure layer: role catalog adapters, lifecycle service, config.

pub mod catalog;
pub mod config;
pub mod lifecycle;

pub use catalog::{
    HttpRoleCatalogStore, InMemoryRoleCatalogStore, RoleCatalogStore, RoleListing, StoreError,
};
pub use config::{AppConfig, ConfigError};
pub use lifecycle::{LifecycleError, RoleLifecycleService};
