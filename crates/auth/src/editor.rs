//! Role editor: the UI-level editing session for one role.
//!
//! Holds the catalog snapshot, the editable matrix and technical-function
//! list, and the role's edit state:
//!
//! ```text
//! Unloaded ──new_draft──▶ Draft(new) ──submit──▶ Submitted ──confirm──▶ Persisted
//! Persisted ──load_for_edit──▶ Draft(existing) ──submit──▶ Submitted ──confirm──▶ Persisted
//! Persisted ──mark_deleted──▶ Deleted
//! Submitted ──fail──▶ Draft (editor state kept, re-submittable)
//! ```
//!
//! Derived state is never patched incrementally: every trigger (first load,
//! reset, load-for-edit, confirmed submission) replaces it wholesale.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use panelerp_core::{PermissionId, RoleId};

use crate::matrix::{self, PermissionMatrix};
use crate::normalize::{ModuleKey, normalize};
use crate::permissions::Permission;
use crate::roles::{Role, RoleDraft, RoleSubmission};
use crate::surfacing::RetiredModules;
use crate::technical::{self, TechnicalFunction};

/// Which role a draft will be submitted as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditTarget {
    New,
    Existing(RoleId),
}

/// Edit state of the role held by a [`RoleEditor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    Unloaded,
    Draft(EditTarget),
    Submitted(EditTarget),
    /// Persisted; the id is unknown when the store only acknowledged a create.
    Persisted(Option<RoleId>),
    Deleted(RoleId),
}

impl EditorState {
    fn name(&self) -> &'static str {
        match self {
            EditorState::Unloaded => "unloaded",
            EditorState::Draft(_) => "draft",
            EditorState::Submitted(_) => "submitted",
            EditorState::Persisted(_) => "persisted",
            EditorState::Deleted(_) => "deleted",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("invalid transition: cannot {event} while {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },

    #[error("persisted role id is unknown")]
    UnknownRoleId,
}

/// Catalog ids selected by an editor, ready for submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedIds {
    pub permission_ids: Vec<PermissionId>,
    pub technical_function_ids: Vec<PermissionId>,
}

/// Flatten an editable matrix and technical list back into catalog ids.
///
/// Module ids follow catalog order; technical ids follow list order.
pub fn project(
    catalog: &[Permission],
    matrix: &PermissionMatrix,
    technical_functions: &[TechnicalFunction],
) -> ProjectedIds {
    let permission_ids = catalog
        .iter()
        .filter(|p| matrix.get(&p.module, &p.action))
        .map(|p| p.id.clone())
        .collect();

    ProjectedIds {
        permission_ids,
        technical_function_ids: technical::assigned_ids(technical_functions),
    }
}

impl RoleSubmission {
    pub fn from_parts(id: Option<RoleId>, draft: &RoleDraft, ids: ProjectedIds) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            permission_ids: ids.permission_ids,
            technical_function_ids: ids.technical_function_ids,
        }
    }
}

/// Editing session for one role against a catalog snapshot.
#[derive(Debug, Clone)]
pub struct RoleEditor {
    catalog: Vec<Permission>,
    retired: RetiredModules,
    state: EditorState,
    draft: RoleDraft,
    matrix: PermissionMatrix,
    technical_functions: Vec<TechnicalFunction>,
}

impl RoleEditor {
    /// Start an editor over `catalog`. Matrix and technical list start at
    /// their defaults; the state is `Unloaded`.
    pub fn new(catalog: Vec<Permission>, retired: RetiredModules) -> Self {
        let built = matrix::build(&catalog);
        Self {
            catalog,
            retired,
            state: EditorState::Unloaded,
            draft: RoleDraft::default(),
            matrix: built.matrix,
            technical_functions: built.technical_functions,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn catalog(&self) -> &[Permission] {
        &self.catalog
    }

    pub fn draft(&self) -> &RoleDraft {
        &self.draft
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    pub fn technical_functions(&self) -> &[TechnicalFunction] {
        &self.technical_functions
    }

    /// Module keys to render, retired aliases hidden.
    pub fn displayed_modules(&self) -> Vec<ModuleKey> {
        matrix::displayed_modules(&self.matrix, &self.retired)
    }

    /// Catalog permissions per displayed module.
    pub fn permissions_by_module(&self) -> std::collections::BTreeMap<ModuleKey, Vec<Permission>> {
        matrix::group_by_module(&self.catalog, &self.retired)
    }

    /// Id of the persisted role, when known.
    pub fn persisted_id(&self) -> Option<&RoleId> {
        match &self.state {
            EditorState::Persisted(id) => id.as_ref(),
            _ => None,
        }
    }

    /// Rebuild matrix, technical list and draft fields from the catalog.
    pub fn reset(&mut self) {
        let built = matrix::build(&self.catalog);
        self.matrix = built.matrix;
        self.technical_functions = built.technical_functions;
        self.draft = RoleDraft::default();
    }

    /// Swap in a refreshed catalog snapshot.
    ///
    /// An open draft keeps editing against the snapshot it was loaded with;
    /// derived state is rebuilt only when no draft is open.
    pub fn replace_catalog(&mut self, catalog: Vec<Permission>) {
        self.catalog = catalog;
        if !matches!(self.state, EditorState::Draft(_) | EditorState::Submitted(_)) {
            self.reset();
        }
    }

    /// Begin composing a new role from fresh defaults.
    pub fn new_draft(&mut self) -> Result<(), EditorError> {
        if self.state != EditorState::Unloaded {
            return Err(self.invalid("start a new draft"));
        }
        self.reset();
        self.transition(EditorState::Draft(EditTarget::New));
        Ok(())
    }

    /// Load a persisted role for editing.
    pub fn load_for_edit(&mut self, role: &Role) -> Result<(), EditorError> {
        if !matches!(self.state, EditorState::Unloaded | EditorState::Persisted(_)) {
            return Err(self.invalid("load a role"));
        }

        let mut matrix = PermissionMatrix::new();
        for (module, row) in role.matrix.iter() {
            let key = normalize(Some(module.as_str()));
            if key.is_technical() {
                continue;
            }
            matrix.insert_row(key, row.clone());
        }
        // Mirrors the final invariant check of `matrix::build`.
        matrix.remove_technical();

        let technical_functions = match &role.technical_functions {
            Some(list) => technical::sort(list.iter().cloned()),
            None => technical::sort(
                self.catalog
                    .iter()
                    .filter(|p| p.is_technical())
                    .map(|p| TechnicalFunction::new(p.id.clone(), p.action.clone(), false)),
            ),
        };

        self.matrix = matrix;
        self.technical_functions = technical_functions;
        self.draft = RoleDraft::new(role.name.clone(), role.description.clone());
        self.transition(EditorState::Draft(EditTarget::Existing(role.id.clone())));
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_draft("rename")?;
        self.draft.name = name.into();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_draft("describe")?;
        self.draft.description = description.into();
        Ok(())
    }

    /// Toggle one matrix cell. Returns `false` for the technical module,
    /// which is edited through [`RoleEditor::toggle_technical`] only.
    pub fn toggle_permission(&mut self, module: &str, action: &str, value: bool) -> Result<bool, EditorError> {
        self.ensure_draft("toggle a permission")?;
        Ok(self.matrix.set(module, action, value))
    }

    /// Toggle one technical function. Returns `false` for unknown ids.
    pub fn toggle_technical(&mut self, id: &PermissionId, assigned: bool) -> Result<bool, EditorError> {
        self.ensure_draft("toggle a technical function")?;
        Ok(technical::toggle(&mut self.technical_functions, id, assigned))
    }

    /// Project the draft into a submission and move to `Submitted`.
    ///
    /// Blank names and empty selections are submitted as-is; validation is
    /// the catalog's call.
    pub fn submit(&mut self) -> Result<RoleSubmission, EditorError> {
        let target = match &self.state {
            EditorState::Draft(target) => target.clone(),
            _ => return Err(self.invalid("submit")),
        };

        let ids = project(&self.catalog, &self.matrix, &self.technical_functions);
        let id = match &target {
            EditTarget::New => None,
            EditTarget::Existing(id) => Some(id.clone()),
        };

        self.transition(EditorState::Submitted(target));
        Ok(RoleSubmission::from_parts(id, &self.draft, ids))
    }

    /// The catalog accepted the submission.
    ///
    /// `stored` is the role echoed back by the catalog, if any. Editable
    /// state returns to fresh defaults.
    pub fn confirm(&mut self, stored: Option<&Role>) -> Result<(), EditorError> {
        let target = match &self.state {
            EditorState::Submitted(target) => target.clone(),
            _ => return Err(self.invalid("confirm")),
        };

        let id = match (stored, target) {
            (Some(role), _) => Some(role.id.clone()),
            (None, EditTarget::Existing(id)) => Some(id),
            (None, EditTarget::New) => None,
        };

        self.reset();
        self.transition(EditorState::Persisted(id));
        Ok(())
    }

    /// The submission failed; go back to the draft with everything intact.
    pub fn fail(&mut self) -> Result<(), EditorError> {
        let target = match &self.state {
            EditorState::Submitted(target) => target.clone(),
            _ => return Err(self.invalid("fail")),
        };
        self.transition(EditorState::Draft(target));
        Ok(())
    }

    /// The persisted role was deleted. Terminal.
    pub fn mark_deleted(&mut self) -> Result<RoleId, EditorError> {
        let id = match &self.state {
            EditorState::Persisted(Some(id)) => id.clone(),
            EditorState::Persisted(None) => return Err(EditorError::UnknownRoleId),
            _ => return Err(self.invalid("delete")),
        };
        self.transition(EditorState::Deleted(id.clone()));
        Ok(id)
    }

    fn ensure_draft(&self, event: &'static str) -> Result<(), EditorError> {
        match self.state {
            EditorState::Draft(_) => Ok(()),
            _ => Err(self.invalid(event)),
        }
    }

    fn invalid(&self, event: &'static str) -> EditorError {
        EditorError::InvalidTransition {
            from: self.state.name(),
            event,
        }
    }

    fn transition(&mut self, next: EditorState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "role editor transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn scenario_a() -> Vec<Permission> {
        vec![
            Permission::new("1", "Ventas", "ver"),
            Permission::new("2", "Técnico", "Descargar OT"),
            Permission::new("3", "técnico ", "Subir imagen"),
        ]
    }

    fn editor() -> RoleEditor {
        RoleEditor::new(scenario_a(), RetiredModules::v1())
    }

    #[test]
    fn scenario_b_create_projects_selected_ids() {
        let mut ed = editor();
        ed.new_draft().unwrap();
        ed.set_name("Vendedor").unwrap();
        ed.toggle_permission("ventas", "ver", true).unwrap();
        ed.toggle_permission("ventas", "editar", false).unwrap();
        ed.toggle_technical(&PermissionId::new("2"), true).unwrap();

        let submission = ed.submit().unwrap();
        assert_eq!(submission.id, None);
        assert_eq!(submission.name, "Vendedor");
        assert_eq!(submission.permission_ids, vec![PermissionId::new("1")]);
        assert_eq!(submission.technical_function_ids, vec![PermissionId::new("2")]);
        assert_eq!(ed.state(), &EditorState::Submitted(EditTarget::New));
    }

    #[test]
    fn project_matches_catalog_labels_through_normalization() {
        let catalog = vec![
            Permission::new("1", "Ventas ", "ver"),
            Permission::new("5", "VENTAS", "editar"),
            Permission::new("2", "Técnico", "Descargar OT"),
        ];
        let mut matrix = PermissionMatrix::new();
        matrix.set("ventas", "ver", true);
        matrix.set("ventas", "editar", false);

        let ids = project(&catalog, &matrix, &[]);
        assert_eq!(ids.permission_ids, vec![PermissionId::new("1")]);
        assert!(ids.technical_function_ids.is_empty());
    }

    #[test]
    fn confirm_resets_to_fresh_defaults() {
        let mut ed = editor();
        ed.new_draft().unwrap();
        ed.set_name("x").unwrap();
        ed.toggle_permission("ventas", "ver", true).unwrap();
        ed.toggle_technical(&PermissionId::new("3"), true).unwrap();
        ed.submit().unwrap();

        let stored = Role::from_assignments(
            RoleId::new("r9"),
            "x",
            "",
            &scenario_a(),
            &BTreeSet::new(),
        );
        ed.confirm(Some(&stored)).unwrap();

        assert_eq!(ed.state(), &EditorState::Persisted(Some(RoleId::new("r9"))));
        assert_eq!(ed.draft(), &RoleDraft::default());
        assert_eq!(ed.matrix().assigned_pairs().count(), 0);
        assert!(ed.technical_functions().iter().all(|t| !t.assigned));
    }

    #[test]
    fn failed_submission_keeps_editor_state() {
        let mut ed = editor();
        ed.new_draft().unwrap();
        ed.toggle_permission("ventas", "ver", true).unwrap();
        let first = ed.submit().unwrap();

        ed.fail().unwrap();
        assert_eq!(ed.state(), &EditorState::Draft(EditTarget::New));
        assert!(ed.matrix().get("ventas", "ver"));

        let second = ed.submit().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_for_edit_uses_role_technical_list_when_present() {
        let role = Role {
            id: RoleId::new("r1"),
            name: "Técnico de campo".into(),
            description: "Montajes".into(),
            matrix: serde_json::from_value(serde_json::json!({"Ventas": {"ver": true}})).unwrap(),
            technical_functions: Some(vec![
                TechnicalFunction::new("3", "Subir imagen", true),
                TechnicalFunction::new("2", "Descargar OT", false),
            ]),
        };

        let mut ed = editor();
        ed.load_for_edit(&role).unwrap();

        assert_eq!(ed.state(), &EditorState::Draft(EditTarget::Existing(RoleId::new("r1"))));
        assert_eq!(ed.draft().name, "Técnico de campo");
        assert!(ed.matrix().get("ventas", "ver"));
        let actions: Vec<_> = ed.technical_functions().iter().map(|t| t.action.as_str()).collect();
        assert_eq!(actions, vec!["Descargar OT", "Subir imagen"]);
        assert!(ed.technical_functions()[1].assigned);

        let submission = ed.submit().unwrap();
        assert_eq!(submission.id, Some(RoleId::new("r1")));
        assert_eq!(submission.technical_function_ids, vec![PermissionId::new("3")]);
    }

    #[test]
    fn load_for_edit_falls_back_to_catalog_technical_functions() {
        let role = Role {
            id: RoleId::new("r2"),
            name: "Lector".into(),
            description: String::new(),
            matrix: PermissionMatrix::new(),
            technical_functions: None,
        };

        let mut ed = editor();
        ed.load_for_edit(&role).unwrap();

        assert_eq!(
            ed.technical_functions(),
            &[
                TechnicalFunction::new("2", "Descargar OT", false),
                TechnicalFunction::new("3", "Subir imagen", false),
            ]
        );
        assert!(ed.matrix().is_empty());
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut ed = editor();
        assert!(matches!(ed.submit(), Err(EditorError::InvalidTransition { event: "submit", .. })));
        assert!(ed.mark_deleted().is_err());
        assert!(ed.toggle_permission("ventas", "ver", true).is_err());

        ed.new_draft().unwrap();
        assert!(ed.new_draft().is_err());
        ed.submit().unwrap();
        assert!(ed.submit().is_err());
        ed.confirm(None).unwrap();

        // Acknowledged create without an echoed role: id unknown.
        assert_eq!(ed.state(), &EditorState::Persisted(None));
        assert_eq!(ed.mark_deleted(), Err(EditorError::UnknownRoleId));
    }

    #[test]
    fn persisted_role_can_be_deleted_once() {
        let role = Role::from_assignments(RoleId::new("r3"), "x", "y", &scenario_a(), &BTreeSet::new());
        let mut ed = editor();
        ed.load_for_edit(&role).unwrap();
        ed.submit().unwrap();
        ed.confirm(None).unwrap();

        assert_eq!(ed.persisted_id(), Some(&RoleId::new("r3")));
        assert_eq!(ed.mark_deleted().unwrap(), RoleId::new("r3"));
        assert_eq!(ed.state(), &EditorState::Deleted(RoleId::new("r3")));
        assert!(ed.load_for_edit(&role).is_err());
        assert!(ed.mark_deleted().is_err());
    }

    #[test]
    fn blank_name_is_not_rejected() {
        let mut ed = editor();
        ed.new_draft().unwrap();
        let submission = ed.submit().unwrap();
        assert!(submission.name.is_empty());
        assert!(submission.permission_ids.is_empty());
    }

    #[test]
    fn replace_catalog_rebuilds_only_outside_a_draft() {
        let mut ed = editor();
        ed.replace_catalog(vec![Permission::new("7", "Inventario", "ver")]);
        assert_eq!(ed.displayed_modules(), vec![ModuleKey::new("inventario")]);

        ed.new_draft().unwrap();
        ed.replace_catalog(scenario_a());
        assert_eq!(ed.displayed_modules(), vec![ModuleKey::new("inventario")]);
    }

    fn pair_strategy() -> impl Strategy<Value = Vec<(usize, usize, bool)>> {
        prop::collection::vec((0usize..4, 0usize..4, any::<bool>()), 0..16)
    }

    proptest! {
        /// Property: projecting an assignment set to ids and resolving those
        /// ids back yields exactly the assigned pairs.
        #[test]
        fn projection_round_trips(cells in pair_strategy()) {
            let modules = ["Ventas", "Inventario", "Contabilidad", "Diseño Gráfico"];
            let actions = ["ver", "editar", "eliminar", "admin"];

            let mut catalog = Vec::new();
            for (mi, m) in modules.iter().enumerate() {
                for (ai, a) in actions.iter().enumerate() {
                    catalog.push(Permission::new(format!("{mi}-{ai}"), *m, *a));
                }
            }

            let mut matrix = matrix::build(&catalog).matrix;
            for (mi, ai, on) in &cells {
                matrix.set(modules[*mi], actions[*ai], *on);
            }

            let expected: BTreeSet<(String, String)> = matrix
                .assigned_pairs()
                .map(|(m, a)| (m.as_str().to_string(), a.to_string()))
                .collect();

            let ids: BTreeSet<PermissionId> =
                project(&catalog, &matrix, &[]).permission_ids.into_iter().collect();
            let rebuilt = Role::from_assignments(RoleId::new("r"), "r", "", &catalog, &ids);
            let actual: BTreeSet<(String, String)> = rebuilt
                .matrix
                .assigned_pairs()
                .map(|(m, a)| (m.as_str().to_string(), a.to_string()))
                .collect();

            prop_assert_eq!(expected, actual);
        }
    }
}
