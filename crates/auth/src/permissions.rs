use serde::{Deserialize, Serialize};

use panelerp_core::PermissionId;

use crate::normalize::{ModuleKey, normalize};

/// Well-known action: view the module.
pub const VIEW: &str = "ver";
/// Well-known action: edit items in the module.
pub const EDIT: &str = "editar";
/// Well-known action: delete items in the module.
pub const DELETE: &str = "eliminar";
/// Well-known action: module administration flag.
pub const ADMIN: &str = "admin";

/// A catalog permission: one `(module, action)` capability unit.
///
/// Sourced from the external catalog and never mutated here. `action` is open
/// vocabulary; only the four well-known actions above carry display labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    #[serde(rename = "modulo")]
    pub module: String,
    #[serde(rename = "accion")]
    pub action: String,
}

impl Permission {
    pub fn new(id: impl Into<PermissionId>, module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            module: module.into(),
            action: action.into(),
        }
    }

    /// Canonical key of this permission's module.
    pub fn module_key(&self) -> ModuleKey {
        normalize(Some(&self.module))
    }

    pub fn is_technical(&self) -> bool {
        self.module_key().is_technical()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.module, self.action)
    }
}

/// Display label for an action; unknown actions fall back to their raw name.
pub fn action_label(action: &str) -> &str {
    match action {
        VIEW => "Ver",
        EDIT => "Editar",
        DELETE => "Eliminar",
        ADMIN => "Admin",
        other => other,
    }
}
