use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use panelerp_core::{PermissionId, RoleId};

use crate::matrix::{self, PermissionMatrix};
use crate::permissions::Permission;
use crate::technical::TechnicalFunction;

/// A named, administrator-defined bundle of permission assignments.
///
/// Roles are replaced wholesale on update; there is no partial patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "permisos", default)]
    pub matrix: PermissionMatrix,
    /// Technical functions as resolved by the catalog, when it sends them.
    #[serde(
        rename = "permisosTecnicos",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub technical_functions: Option<Vec<TechnicalFunction>>,
}

impl Role {
    /// Resolve a role from its flat assignment list against the catalog.
    pub fn from_assignments(
        id: RoleId,
        name: impl Into<String>,
        description: impl Into<String>,
        catalog: &[Permission],
        assigned: &BTreeSet<PermissionId>,
    ) -> Self {
        let built = matrix::build(catalog);

        let mut matrix = built.matrix;
        matrix.overlay_assigned(catalog, assigned);

        let technical_functions = built
            .technical_functions
            .into_iter()
            .map(|mut tf| {
                tf.assigned = assigned.contains(&tf.id);
                tf
            })
            .collect();

        Self {
            id,
            name: name.into(),
            description: description.into(),
            matrix,
            technical_functions: Some(technical_functions),
        }
    }

    /// Ids of the technical functions assigned to this role.
    pub fn technical_function_ids(&self) -> BTreeSet<PermissionId> {
        self.technical_functions
            .iter()
            .flatten()
            .filter(|tf| tf.assigned)
            .map(|tf| tf.id.clone())
            .collect()
    }
}

/// Name and description of a role being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    pub name: String,
    pub description: String,
}

impl RoleDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Create/update payload: a role flattened back to catalog id lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoleId>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "permisos", default)]
    pub permission_ids: Vec<PermissionId>,
    #[serde(rename = "permisosTecnicos", default)]
    pub technical_function_ids: Vec<PermissionId>,
}

impl RoleSubmission {
    /// Every id the role should end up holding, module and technical alike.
    pub fn all_ids(&self) -> impl Iterator<Item = &PermissionId> {
        self.permission_ids
            .iter()
            .chain(self.technical_function_ids.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Permission> {
        vec![
            Permission::new("1", "Ventas", "ver"),
            Permission::new("4", "Ventas", "editar"),
            Permission::new("2", "Técnico", "Descargar OT"),
            Permission::new("3", "técnico ", "Subir imagen"),
        ]
    }

    #[test]
    fn from_assignments_splits_matrix_and_technical() {
        let assigned: BTreeSet<PermissionId> =
            ["1", "3"].into_iter().map(PermissionId::new).collect();
        let role = Role::from_assignments(RoleId::new("r1"), "Vendedor", "", &catalog(), &assigned);

        assert!(role.matrix.get("ventas", "ver"));
        assert!(!role.matrix.get("ventas", "editar"));
        assert!(!role.matrix.contains_module("tecnico"));
        assert_eq!(
            role.technical_functions,
            Some(vec![
                TechnicalFunction::new("2", "Descargar OT", false),
                TechnicalFunction::new("3", "Subir imagen", true),
            ])
        );
        assert_eq!(
            role.technical_function_ids().into_iter().collect::<Vec<_>>(),
            vec![PermissionId::new("3")]
        );
    }

    #[test]
    fn role_round_trips_through_catalog_json() {
        let json = serde_json::json!({
            "id": "r1",
            "nombre": "Admin",
            "descripcion": "Todo",
            "permisos": {"Ventas": {"ver": true, "admin": false}},
        });
        let role: Role = serde_json::from_value(json).unwrap();
        assert_eq!(role.name, "Admin");
        assert!(role.technical_functions.is_none());
        assert!(role.technical_function_ids().is_empty());

        let back = serde_json::to_value(&role).unwrap();
        assert_eq!(back["permisos"], serde_json::json!({"ventas": {"admin": false, "ver": true}}));
        assert!(back.get("permisosTecnicos").is_none());
    }

    #[test]
    fn submission_uses_catalog_field_names() {
        let submission = RoleSubmission {
            id: None,
            name: "Vendedor".into(),
            description: "Ventas".into(),
            permission_ids: vec![PermissionId::new("1")],
            technical_function_ids: vec![PermissionId::new("2")],
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nombre": "Vendedor",
                "descripcion": "Ventas",
                "permisos": ["1"],
                "permisosTecnicos": ["2"],
            })
        );
        assert_eq!(submission.all_ids().count(), 2);
    }

    #[test]
    fn submission_tolerates_missing_id_lists() {
        let submission: RoleSubmission =
            serde_json::from_str(r#"{"id":"r1","nombre":"x","descripcion":"y"}"#).unwrap();
        assert_eq!(submission.id, Some(RoleId::new("r1")));
        assert!(submission.permission_ids.is_empty());
        assert!(submission.technical_function_ids.is_empty());
    }
}
