use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use panelerp_auth::{CapabilityGrants, Permission, Role, RoleSubmission};
use panelerp_core::{DomainError, DomainResult, PermissionId, RoleId};

use super::{RoleCatalogStore, RoleListing, StoreError};

const MISSING_FIELDS: &str = "Nombre y descripción son obligatorios";
const MISSING_FIELDS_WITH_ID: &str = "ID, nombre y descripción son obligatorios";

const MODULES: &[&str] = &[
    "ventas",
    "soportes",
    "inventario",
    "contabilidad",
    "ajustes",
    "contactos",
    "mensajes",
    "metricas",
];

const ACTIONS: &[&str] = &["ver", "editar", "eliminar", "admin"];

const TECHNICAL_FUNCTIONS: &[&str] = &[
    "descargar ot",
    "detectar duplicados contactos",
    "modificar precio cotización",
    "reservar soportes",
    "ver boton exportar",
    "ver boton importar",
    "ver costes soportes",
    "ver informes soportes",
    "ver mantenimiento soportes",
    "ver solicitudes cotizacion",
];

/// Permission catalog the bundled store starts with: every module with the
/// four standard actions, then the technical functions.
pub fn default_catalog() -> Vec<Permission> {
    let modules = MODULES
        .iter()
        .flat_map(|m| ACTIONS.iter().map(move |a| (*m, *a)));
    let technical = TECHNICAL_FUNCTIONS.iter().map(|f| ("tecnico", *f));

    modules
        .chain(technical)
        .enumerate()
        .map(|(i, (module, action))| Permission::new((i + 1).to_string(), module, action))
        .collect()
}

#[derive(Debug, Clone)]
struct StoredRole {
    name: String,
    description: String,
    assigned: BTreeSet<PermissionId>,
}

/// In-memory role catalog for tests/dev.
#[derive(Debug)]
pub struct InMemoryRoleCatalogStore {
    catalog: RwLock<Vec<Permission>>,
    roles: RwLock<BTreeMap<RoleId, StoredRole>>,
}

impl InMemoryRoleCatalogStore {
    pub fn new(catalog: Vec<Permission>) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            roles: RwLock::new(BTreeMap::new()),
        }
    }

    /// Replace the permission catalog. Existing assignments are kept as ids.
    pub fn replace_catalog(&self, catalog: Vec<Permission>) -> Result<(), StoreError> {
        let mut current = self.catalog.write().map_err(|_| poisoned())?;
        *current = catalog;
        Ok(())
    }

    fn catalog_snapshot(&self) -> Result<Vec<Permission>, StoreError> {
        let catalog = self.catalog.read().map_err(|_| poisoned())?;
        let mut sorted = catalog.clone();
        sorted.sort_by(|a, b| a.module.cmp(&b.module).then_with(|| a.action.cmp(&b.action)));
        Ok(sorted)
    }

    fn resolve(&self, id: &RoleId, stored: &StoredRole) -> Result<Role, StoreError> {
        let catalog = self.catalog_snapshot()?;
        Ok(Role::from_assignments(
            id.clone(),
            stored.name.clone(),
            stored.description.clone(),
            &catalog,
            &stored.assigned,
        ))
    }

    fn stored_from(submission: &RoleSubmission) -> StoredRole {
        StoredRole {
            name: submission.name.clone(),
            description: submission.description.clone(),
            assigned: submission.all_ids().cloned().collect(),
        }
    }
}

impl Default for InMemoryRoleCatalogStore {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

fn poisoned() -> StoreError {
    StoreError::Transport("role catalog lock poisoned".to_string())
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Name and description are required; updates also need the role id.
fn require_fields(submission: &RoleSubmission, with_id: bool) -> DomainResult<()> {
    if is_blank(&submission.name) || is_blank(&submission.description) {
        let msg = if with_id { MISSING_FIELDS_WITH_ID } else { MISSING_FIELDS };
        return Err(DomainError::validation(msg));
    }
    if with_id && submission.id.is_none() {
        return Err(DomainError::validation(MISSING_FIELDS_WITH_ID));
    }
    Ok(())
}

#[async_trait::async_trait]
impl RoleCatalogStore for InMemoryRoleCatalogStore {
    async fn list(&self) -> Result<RoleListing, StoreError> {
        let snapshot: Vec<(RoleId, StoredRole)> = {
            let roles = self.roles.read().map_err(|_| poisoned())?;
            roles.iter().map(|(id, r)| (id.clone(), r.clone())).collect()
        };

        let mut roles = snapshot
            .iter()
            .map(|(id, stored)| self.resolve(id, stored))
            .collect::<Result<Vec<_>, _>>()?;
        roles.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(RoleListing {
            roles,
            catalog: self.catalog_snapshot()?,
        })
    }

    async fn create(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError> {
        require_fields(submission, false)?;

        let id = RoleId::generate();
        let stored = Self::stored_from(submission);
        {
            let mut roles = self.roles.write().map_err(|_| poisoned())?;
            roles.insert(id.clone(), stored.clone());
        }

        tracing::debug!(role_id = %id, assigned = stored.assigned.len(), "role created");
        self.resolve(&id, &stored).map(Some)
    }

    async fn update(&self, submission: &RoleSubmission) -> Result<Option<Role>, StoreError> {
        require_fields(submission, true)?;
        let id = submission
            .id
            .as_ref()
            .ok_or_else(|| StoreError::rejected(400, MISSING_FIELDS_WITH_ID))?;

        let stored = Self::stored_from(submission);
        {
            let mut roles = self.roles.write().map_err(|_| poisoned())?;
            let slot = roles.get_mut(id).ok_or(StoreError::NotFound)?;
            *slot = stored.clone();
        }

        tracing::debug!(role_id = %id, assigned = stored.assigned.len(), "role replaced");
        self.resolve(id, &stored).map(Some)
    }

    async fn delete(&self, id: &RoleId) -> Result<(), StoreError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;
        roles.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn grants(&self, id: &RoleId) -> Result<CapabilityGrants, StoreError> {
        let stored = {
            let roles = self.roles.read().map_err(|_| poisoned())?;
            roles.get(id).cloned().ok_or(StoreError::NotFound)?
        };
        let role = self.resolve(id, &stored)?;
        Ok(CapabilityGrants::from_role(&role))
    }
}
