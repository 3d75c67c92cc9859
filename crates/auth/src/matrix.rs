//! Per-module action matrix and the catalog partition that builds it.
//!
//! # Invariants
//! - The `tecnico` pseudo-module never appears as a matrix key; its entries
//!   are routed to the technical-function list instead.
//! - Module keys are always normalized ([`ModuleKey`]).
//! - Retired modules stay in the matrix; they are only hidden from the
//!   displayed module set.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use panelerp_core::PermissionId;

use crate::normalize::{ModuleKey, TECHNICAL_MODULE, normalize};
use crate::permissions::Permission;
use crate::surfacing::RetiredModules;
use crate::technical::{self, TechnicalFunction};

/// Action → assigned flag for one module.
pub type ActionRow = BTreeMap<String, bool>;

/// Module → action → assigned flag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ModuleKey, ActionRow>",
    into = "BTreeMap<ModuleKey, ActionRow>"
)]
pub struct PermissionMatrix {
    rows: BTreeMap<ModuleKey, ActionRow>,
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup `matrix[normalize(module)][action]`, `false` when absent.
    pub fn get(&self, module: &str, action: &str) -> bool {
        self.row(module)
            .and_then(|row| row.get(action))
            .copied()
            .unwrap_or(false)
    }

    pub fn row(&self, module: &str) -> Option<&ActionRow> {
        self.rows.get(&normalize(Some(module)))
    }

    pub fn contains_module(&self, module: &str) -> bool {
        self.row(module).is_some()
    }

    /// Module keys in sorted order (retired modules included).
    pub fn modules(&self) -> impl Iterator<Item = &ModuleKey> {
        self.rows.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleKey, &ActionRow)> {
        self.rows.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Toggle one cell from an editor.
    ///
    /// Technical functions cannot be toggled through the matrix; returns
    /// `false` (and leaves the matrix untouched) for the `tecnico` module.
    pub fn set(&mut self, module: &str, action: &str, value: bool) -> bool {
        let key = normalize(Some(module));
        if key.is_technical() {
            return false;
        }
        self.rows
            .entry(key)
            .or_default()
            .insert(action.to_string(), value);
        true
    }

    /// Mark `true` every catalog entry whose id is in `assigned`.
    pub fn overlay_assigned(&mut self, catalog: &[Permission], assigned: &BTreeSet<PermissionId>) {
        for p in catalog.iter().filter(|p| assigned.contains(&p.id)) {
            self.set(&p.module, &p.action, true);
        }
    }

    /// `(module, action)` pairs currently marked `true`.
    pub fn assigned_pairs(&self) -> impl Iterator<Item = (&ModuleKey, &str)> {
        self.rows.iter().flat_map(|(module, row)| {
            row.iter()
                .filter(|(_, on)| **on)
                .map(move |(action, _)| (module, action.as_str()))
        })
    }

    fn ensure_action(&mut self, key: ModuleKey, action: &str) {
        self.rows
            .entry(key)
            .or_default()
            .entry(action.to_string())
            .or_insert(false);
    }

    /// Replace a whole row. Callers filter out the technical module first.
    pub(crate) fn insert_row(&mut self, key: ModuleKey, row: ActionRow) {
        self.rows.insert(key, row);
    }

    pub(crate) fn remove_technical(&mut self) {
        self.rows.remove(TECHNICAL_MODULE);
    }
}

impl From<BTreeMap<ModuleKey, ActionRow>> for PermissionMatrix {
    fn from(rows: BTreeMap<ModuleKey, ActionRow>) -> Self {
        let mut matrix = Self { rows };
        matrix.remove_technical();
        matrix
    }
}

impl From<PermissionMatrix> for BTreeMap<ModuleKey, ActionRow> {
    fn from(matrix: PermissionMatrix) -> Self {
        matrix.rows
    }
}

/// Output of [`build`]: the empty matrix plus the sorted technical functions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatrixBuild {
    pub matrix: PermissionMatrix,
    pub technical_functions: Vec<TechnicalFunction>,
}

/// Partition a catalog into the module matrix and the technical functions.
///
/// Every matrix cell starts `false`; callers overlay the assignments of the
/// role they are editing. Technical functions come back sorted.
pub fn build(catalog: &[Permission]) -> MatrixBuild {
    let mut matrix = PermissionMatrix::new();
    let mut technical_functions = Vec::new();

    for p in catalog {
        let key = p.module_key();
        if key.is_technical() {
            technical_functions.push(TechnicalFunction::new(p.id.clone(), p.action.clone(), false));
            continue;
        }
        matrix.ensure_action(key, &p.action);
    }

    // Final invariant check, independent of the per-entry routing above.
    matrix.remove_technical();

    tracing::debug!(
        catalog = catalog.len(),
        modules = matrix.len(),
        technical = technical_functions.len(),
        "permission matrix built"
    );

    MatrixBuild {
        matrix,
        technical_functions: technical::sort(technical_functions),
    }
}

/// Module keys to iterate when rendering the matrix: sorted, retired hidden.
pub fn displayed_modules(matrix: &PermissionMatrix, retired: &RetiredModules) -> Vec<ModuleKey> {
    retired.surfaced(matrix.modules()).cloned().collect()
}

/// Catalog permissions grouped by surfaced module, technical entries excluded.
pub fn group_by_module(
    catalog: &[Permission],
    retired: &RetiredModules,
) -> BTreeMap<ModuleKey, Vec<Permission>> {
    let mut groups: BTreeMap<ModuleKey, Vec<Permission>> = BTreeMap::new();
    for p in catalog {
        let key = p.module_key();
        if key.is_technical() || retired.is_retired(key.as_str()) {
            continue;
        }
        groups.entry(key).or_default().push(p.clone());
    }
    groups
}
