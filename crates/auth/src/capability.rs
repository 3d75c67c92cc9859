//! Capability queries for a resolved session role.
//!
//! An [`AuthorizationService`] is built once from a role snapshot and passed
//! around by reference. Queries never mutate it and never fail: anything the
//! role does not grant reads as `false`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matrix::{ActionRow, PermissionMatrix};
use crate::normalize::{ModuleKey, TECHNICAL_MODULE, normalize};
use crate::permissions::{ADMIN, DELETE, EDIT, VIEW};
use crate::roles::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing '{action}' on module '{module}'")]
    Forbidden { module: String, action: String },

    #[error("forbidden: missing technical function '{0}'")]
    MissingTechnicalFunction(String),
}

/// The five capability queries UI and server code gate on.
pub trait Capabilities {
    /// Whether `action` is granted on `module` (label in any spelling).
    fn allows(&self, module: &str, action: &str) -> bool;

    /// Case-insensitive lookup of an assigned technical function.
    fn has_technical_function(&self, name: &str) -> bool;

    fn can_view(&self, module: &str) -> bool {
        self.allows(module, VIEW)
    }

    fn can_edit(&self, module: &str) -> bool {
        self.allows(module, EDIT)
    }

    fn can_delete(&self, module: &str) -> bool {
        self.allows(module, DELETE)
    }

    /// The admin bit only. It does not imply view, edit or delete.
    fn is_admin(&self, module: &str) -> bool {
        self.allows(module, ADMIN)
    }
}

/// Flat grants of one role: only the assigned entries, technical functions
/// under the `tecnico` module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGrants {
    #[serde(rename = "permisos", default)]
    pub modules: BTreeMap<String, ActionRow>,
}

impl CapabilityGrants {
    pub fn from_role(role: &Role) -> Self {
        let mut modules: BTreeMap<String, ActionRow> = BTreeMap::new();

        for (module, action) in role.matrix.assigned_pairs() {
            modules
                .entry(module.as_str().to_string())
                .or_default()
                .insert(action.to_string(), true);
        }

        for tf in role.technical_functions.iter().flatten().filter(|tf| tf.assigned) {
            modules
                .entry(TECHNICAL_MODULE.to_string())
                .or_default()
                .insert(tf.action.clone(), true);
        }

        Self { modules }
    }
}

/// Why a capability query answered the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityExplanation {
    pub module: ModuleKey,
    pub action: String,
    pub granted: bool,
    pub reason: String,
    /// Actions granted on the module, sorted.
    pub granted_actions: Vec<String>,
}

/// Capability state of one session role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationService {
    matrix: PermissionMatrix,
    technical: BTreeSet<String>,
}

impl AuthorizationService {
    /// A session without a role: every query is `false`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_role(role: &Role) -> Self {
        let technical = role
            .technical_functions
            .iter()
            .flatten()
            .filter(|tf| tf.assigned)
            .map(|tf| tf.action.as_str());
        Self::from_matrix(role.matrix.clone(), technical)
    }

    pub fn from_matrix<I, S>(matrix: PermissionMatrix, technical_functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            matrix,
            technical: technical_functions
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Build from the flat grants form. The `tecnico` row, in any spelling,
    /// becomes the technical-function set.
    pub fn from_grants(grants: &CapabilityGrants) -> Self {
        let mut rows: BTreeMap<ModuleKey, ActionRow> = BTreeMap::new();
        let mut technical = BTreeSet::new();

        for (module, row) in &grants.modules {
            let key = normalize(Some(module));
            if key.is_technical() {
                technical.extend(
                    row.iter()
                        .filter(|(_, on)| **on)
                        .map(|(name, _)| name.to_lowercase()),
                );
                continue;
            }
            // Spellings of one module merge; a grant from any of them holds.
            let merged = rows.entry(key).or_default();
            for (action, on) in row {
                *merged.entry(action.clone()).or_default() |= *on;
            }
        }

        Self {
            matrix: PermissionMatrix::from(rows),
            technical,
        }
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    /// Assigned technical functions, lowercased.
    pub fn technical_functions(&self) -> impl Iterator<Item = &str> {
        self.technical.iter().map(String::as_str)
    }

    pub fn require(&self, module: &str, action: &str) -> Result<(), AuthzError> {
        if self.allows(module, action) {
            return Ok(());
        }
        tracing::debug!(module, action, "capability denied");
        Err(AuthzError::Forbidden {
            module: normalize(Some(module)).to_string(),
            action: action.to_string(),
        })
    }

    pub fn require_technical(&self, name: &str) -> Result<(), AuthzError> {
        if self.has_technical_function(name) {
            return Ok(());
        }
        tracing::debug!(name, "technical function denied");
        Err(AuthzError::MissingTechnicalFunction(name.to_string()))
    }

    pub fn explain(&self, module: &str, action: &str) -> CapabilityExplanation {
        let key = normalize(Some(module));
        let granted = self.allows(module, action);

        let granted_actions: Vec<String> = self
            .matrix
            .row(key.as_str())
            .map(|row| {
                row.iter()
                    .filter(|(_, on)| **on)
                    .map(|(a, _)| a.clone())
                    .collect()
            })
            .unwrap_or_default();

        let reason = if key.is_technical() {
            "technical functions are queried by name, not through the module matrix".to_string()
        } else if granted {
            format!("role grants '{action}' on '{key}'")
        } else if !self.matrix.contains_module(key.as_str()) {
            format!("role has no entry for module '{key}'")
        } else if action != ADMIN && self.matrix.get(key.as_str(), ADMIN) {
            format!("role is admin on '{key}' but admin does not imply '{action}'")
        } else {
            format!("role does not grant '{action}' on '{key}'")
        };

        CapabilityExplanation {
            module: key,
            action: action.to_string(),
            granted,
            reason,
            granted_actions,
        }
    }
}

impl Capabilities for AuthorizationService {
    fn allows(&self, module: &str, action: &str) -> bool {
        self.matrix.get(module, action)
    }

    fn has_technical_function(&self, name: &str) -> bool {
        self.technical.contains(&name.to_lowercase())
    }
}
