//! Role lifecycle: list, create, update and delete roles against the catalog.
//!
//! Each mutation is one awaited store call. Failures are reported to callers
//! in two shapes only: the catalog's own rejection message, verbatim, or a
//! generic connectivity failure (the raw cause goes to the log).

use thiserror::Error;

use panelerp_auth::{
    AuthorizationService, EditorError, Permission, PermissionMatrix, RetiredModules, Role,
    RoleDraft, RoleEditor, RoleSubmission, TechnicalFunction, project,
};
use panelerp_core::RoleId;

use crate::catalog::{HttpRoleCatalogStore, RoleCatalogStore, RoleListing, StoreError};
use crate::config::AppConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("could not reach the role catalog")]
    Connectivity,

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Editor(#[from] EditorError),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected { message, .. } => LifecycleError::Rejected(message),
            StoreError::NotFound => LifecycleError::Rejected(StoreError::NotFound.to_string()),
            StoreError::Transport(cause) | StoreError::Decode(cause) => {
                tracing::warn!(error = %cause, "role catalog unreachable");
                LifecycleError::Connectivity
            }
        }
    }
}

/// Role lifecycle operations over a [`RoleCatalogStore`].
#[derive(Debug, Clone)]
pub struct RoleLifecycleService<S> {
    store: S,
    retired: RetiredModules,
}

impl RoleLifecycleService<HttpRoleCatalogStore> {
    /// Service talking to the configured catalog, handing the configured
    /// retired-module table to the editors it opens.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store = HttpRoleCatalogStore::from_settings(&config.catalog)?;
        Ok(Self::new(store).with_retired_modules(config.authz.retired_modules.clone()))
    }
}

impl<S> RoleLifecycleService<S>
where
    S: RoleCatalogStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            retired: RetiredModules::default(),
        }
    }

    pub fn with_retired_modules(mut self, retired: RetiredModules) -> Self {
        self.retired = retired;
        self
    }

    pub fn retired_modules(&self) -> &RetiredModules {
        &self.retired
    }

    /// Fetch the current catalog and open an editor over it.
    pub async fn open_editor(&self) -> Result<RoleEditor, LifecycleError> {
        let listing = self.list().await?;
        Ok(RoleEditor::new(listing.catalog, self.retired.clone()))
    }

    pub async fn list(&self) -> Result<RoleListing, LifecycleError> {
        let listing = self.store.list().await?;
        tracing::debug!(
            roles = listing.roles.len(),
            permissions = listing.catalog.len(),
            "roles listed"
        );
        Ok(listing)
    }

    /// Create a role from an editor's draft, matrix and technical list.
    pub async fn create(
        &self,
        draft: &RoleDraft,
        matrix: &PermissionMatrix,
        technical_functions: &[TechnicalFunction],
        catalog: &[Permission],
    ) -> Result<Option<Role>, LifecycleError> {
        let ids = project(catalog, matrix, technical_functions);
        let submission = RoleSubmission::from_parts(None, draft, ids);
        self.persist(&submission).await
    }

    /// Replace role `id` wholesale.
    pub async fn update(
        &self,
        id: &RoleId,
        draft: &RoleDraft,
        matrix: &PermissionMatrix,
        technical_functions: &[TechnicalFunction],
        catalog: &[Permission],
    ) -> Result<Option<Role>, LifecycleError> {
        let ids = project(catalog, matrix, technical_functions);
        let submission = RoleSubmission::from_parts(Some(id.clone()), draft, ids);
        self.persist(&submission).await
    }

    pub async fn delete(&self, id: &RoleId) -> Result<(), LifecycleError> {
        self.store.delete(id).await?;
        tracing::info!(role_id = %id, "role deleted");
        Ok(())
    }

    /// Capability state of a session whose role is `id`; `None` is a user
    /// without a role.
    pub async fn authorization_for(&self, id: Option<&RoleId>) -> Result<AuthorizationService, LifecycleError> {
        match id {
            Some(id) => {
                let grants = self.store.grants(id).await?;
                Ok(AuthorizationService::from_grants(&grants))
            }
            None => Ok(AuthorizationService::empty()),
        }
    }

    /// Submit an editor's draft and move the editor to its next state.
    ///
    /// On success the editor is confirmed (defaults restored); on failure it
    /// returns to its draft, unchanged, and the error is reported.
    pub async fn submit(&self, editor: &mut RoleEditor) -> Result<Option<Role>, LifecycleError> {
        let submission = editor.submit()?;

        match self.persist(&submission).await {
            Ok(stored) => {
                editor.confirm(stored.as_ref())?;
                Ok(stored)
            }
            Err(err) => {
                editor.fail()?;
                Err(err)
            }
        }
    }

    /// Delete the role an editor has persisted.
    pub async fn delete_persisted(&self, editor: &mut RoleEditor) -> Result<RoleId, LifecycleError> {
        let id = editor.persisted_id().cloned().ok_or(EditorError::UnknownRoleId)?;
        self.delete(&id).await?;
        Ok(editor.mark_deleted()?)
    }

    async fn persist(&self, submission: &RoleSubmission) -> Result<Option<Role>, LifecycleError> {
        let result = match &submission.id {
            None => self.store.create(submission).await,
            Some(_) => self.store.update(submission).await,
        };

        match result {
            Ok(stored) => {
                tracing::info!(
                    role_id = submission.id.as_ref().map(|id| id.as_str()),
                    name = %submission.name,
                    permissions = submission.permission_ids.len(),
                    technical = submission.technical_function_ids.len(),
                    "role saved"
                );
                Ok(stored)
            }
            Err(err) => {
                if let StoreError::Rejected { status, message } = &err {
                    tracing::warn!(status, %message, "role rejected by catalog");
                }
                Err(err.into())
            }
        }
    }
}
