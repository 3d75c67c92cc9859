//! Technical functions: catalog permissions under the `tecnico` pseudo-module.
//!
//! They gate individual buttons and tools rather than whole modules, so they
//! live in a flat, ordered list beside the matrix instead of inside it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use panelerp_core::PermissionId;

use crate::normalize::fold;

/// Technical function that always sorts first ("download work order").
pub const PRIORITY_FUNCTION: &str = "descargar ot";

/// One technical function and whether the role under edit has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalFunction {
    pub id: PermissionId,
    #[serde(rename = "accion")]
    pub action: String,
    #[serde(rename = "asignado")]
    pub assigned: bool,
}

impl TechnicalFunction {
    pub fn new(id: impl Into<PermissionId>, action: impl Into<String>, assigned: bool) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            assigned,
        }
    }

    fn priority(&self) -> u8 {
        if self.action.to_lowercase() == PRIORITY_FUNCTION {
            0
        } else {
            1
        }
    }
}

fn compare(a: &TechnicalFunction, b: &TechnicalFunction) -> Ordering {
    a.priority()
        .cmp(&b.priority())
        .then_with(|| fold(&a.action).cmp(&fold(&b.action)))
        .then_with(|| a.action.to_lowercase().cmp(&b.action.to_lowercase()))
}

/// Order technical functions: the priority function first, then the rest
/// alphabetically, ignoring case and accents ("Álbum" sorts with "a").
/// Stable for equal actions.
pub fn sort(list: impl IntoIterator<Item = TechnicalFunction>) -> Vec<TechnicalFunction> {
    let mut sorted: Vec<TechnicalFunction> = list.into_iter().collect();
    sorted.sort_by(compare);
    sorted
}

/// Set the `assigned` flag of the function with `id`. Returns whether it exists.
pub fn toggle(list: &mut [TechnicalFunction], id: &PermissionId, assigned: bool) -> bool {
    match list.iter_mut().find(|tf| &tf.id == id) {
        Some(tf) => {
            tf.assigned = assigned;
            true
        }
        None => false,
    }
}

/// Ids of the assigned functions, in list order.
pub fn assigned_ids(list: &[TechnicalFunction]) -> Vec<PermissionId> {
    list.iter()
        .filter(|tf| tf.assigned)
        .map(|tf| tf.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tf(id: &str, action: &str) -> TechnicalFunction {
        TechnicalFunction::new(id, action, false)
    }

    fn actions(list: &[TechnicalFunction]) -> Vec<&str> {
        list.iter().map(|t| t.action.as_str()).collect()
    }

    #[test]
    fn priority_function_sorts_first_regardless_of_case() {
        let sorted = sort(vec![
            tf("1", "ver boton exportar"),
            tf("2", "Descargar OT"),
            tf("3", "Actualizar stock"),
        ]);
        assert_eq!(
            actions(&sorted),
            vec!["Descargar OT", "Actualizar stock", "ver boton exportar"]
        );
    }

    #[test]
    fn remaining_functions_are_case_insensitively_alphabetical() {
        let sorted = sort(vec![tf("1", "b"), tf("2", "C"), tf("3", "A")]);
        assert_eq!(actions(&sorted), vec!["A", "b", "C"]);
    }

    #[test]
    fn accented_actions_sort_with_their_base_letter() {
        let sorted = sort(vec![
            tf("1", "zona de carga"),
            tf("2", "Álbum de fotos"),
            tf("3", "editar"),
        ]);
        assert_eq!(actions(&sorted), vec!["Álbum de fotos", "editar", "zona de carga"]);
    }

    #[test]
    fn accent_only_differences_fall_back_to_lowercase_order() {
        let sorted = sort(vec![
            tf("1", "modificar precio cotización"),
            tf("2", "modificar precio cotizacion"),
            tf("3", "Modificar precio"),
        ]);
        assert_eq!(
            actions(&sorted),
            vec![
                "Modificar precio",
                "modificar precio cotizacion",
                "modificar precio cotización",
            ]
        );
    }

    #[test]
    fn near_miss_of_priority_constant_is_not_promoted() {
        let sorted = sort(vec![tf("1", "descargar ot pdf"), tf("2", "abrir")]);
        assert_eq!(actions(&sorted), vec!["abrir", "descargar ot pdf"]);
    }

    #[test]
    fn sort_is_stable_for_equal_actions() {
        let sorted = sort(vec![tf("1", "Exportar"), tf("2", "exportar")]);
        assert_eq!(sorted[0].id.as_str(), "1");
        assert_eq!(sorted[1].id.as_str(), "2");
    }

    #[test]
    fn toggle_and_assigned_ids() {
        let mut list = vec![tf("1", "a"), tf("2", "b")];
        assert!(toggle(&mut list, &PermissionId::new("2"), true));
        assert!(!toggle(&mut list, &PermissionId::new("9"), true));
        assert_eq!(assigned_ids(&list), vec![PermissionId::new("2")]);
    }

    proptest! {
        /// Property: the priority function leads when present, the rest are
        /// non-decreasing by lowercase action.
        #[test]
        fn sorted_output_respects_priority_and_order(
            names in prop::collection::vec("[a-zA-Z ]{1,12}", 0..12),
            include_priority in any::<bool>(),
        ) {
            let mut list: Vec<TechnicalFunction> = names
                .iter()
                .enumerate()
                .map(|(i, n)| tf(&i.to_string(), n))
                .collect();
            if include_priority {
                list.push(tf("p", "DESCARGAR OT"));
            }

            let sorted = sort(list.clone());
            prop_assert_eq!(sorted.len(), list.len());

            if include_priority {
                prop_assert_eq!(sorted[0].action.to_lowercase(), PRIORITY_FUNCTION);
            }

            let rest: Vec<String> = sorted
                .iter()
                .filter(|t| t.action.to_lowercase() != PRIORITY_FUNCTION)
                .map(|t| t.action.to_lowercase())
                .collect();
            prop_assert!(rest.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
