//! Role catalog: the external store that owns permissions and roles.
//!
//! Two adapters implement [`RoleCatalogStore`]:
//! - [`HttpRoleCatalogStore`] talks to the catalog over its JSON endpoints.
//! - [`InMemoryRoleCatalogStore`] backs tests, dev runs and the bundled API.

mod http;
mod in_memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use panelerp_auth::{CapabilityGrants, Permission, Role, RoleSubmission};
use panelerp_core::{DomainError, RoleId};

pub use http::HttpRoleCatalogStore;
pub use in_memory::{InMemoryRoleCatalogStore, default_catalog};

/// Every role plus the full permission catalog, as listed by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleListing {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(rename = "permisos", default)]
    pub catalog: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached, or answered without a usable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store refused the request with a structured error message.
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("role not found")]
    NotFound,
}

impl StoreError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) | DomainError::InvalidId(message) => {
                StoreError::rejected(400, message)
            }
        }
    }
}

/// Contract of the external role catalog.
///
/// Create and update replace the role wholesale with the submitted id lists.
/// Either may answer with the stored role or with a bare acknowledgement.
#[async_trait::async_trait]
pub trait RoleCatalogStore: Send + Sync {
    async fn list(&self) -> Result<RoleListing, StoreError>;

    async fn create(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError>;

    async fn update(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError>;

    async fn delete(&self, id: &RoleId) -> Result<(), StoreError>;

    /// Flat capability grants of one role.
    async fn grants(&self, id: &RoleId) -> Result<CapabilityGrants, StoreError>;
}

#[async_trait::async_trait]
impl<S> RoleCatalogStore for Arc<S>
where
    S: RoleCatalogStore + ?Sized,
{
    async fn list(&self) -> Result<RoleListing, StoreError> {
        (**self).list().await
    }

    async fn create(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError> {
        (**self).create(submission).await
    }

    async fn update(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError> {
        (**self).update(submission).await
    }

    async fn delete(&self, id: &RoleId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn grants(&self, id: &RoleId) -> Result<CapabilityGrants, StoreError> {
        (**self).grants(id).await
    }
}
