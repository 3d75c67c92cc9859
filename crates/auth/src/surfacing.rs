//! Retired module aliases hidden from the permission matrix UI.
//!
//! Departments that no longer exist can still have rows in the external
//! catalog. They are filtered out of what is *displayed*; the matrix itself
//! keeps them so that projecting a role back to ids stays lossless.

use serde::{Deserialize, Serialize};

use crate::normalize::{ModuleKey, normalize};

/// Versioned table of retired module aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredModules {
    pub version: u32,
    pub aliases: Vec<String>,
}

impl RetiredModules {
    pub fn new(version: u32, aliases: Vec<String>) -> Self {
        Self { version, aliases }
    }

    /// First table: graphic design, employees and website departments in
    /// the spellings found in legacy catalogs.
    pub fn v1() -> Self {
        Self::new(
            1,
            [
                "diseño_grafico",
                "diseño gráfico",
                "diseñografico",
                "diseno_grafico",
                "diseno gráfico",
                "empleados",
                "empleado",
                "sitio_web",
                "sitio web",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        )
    }

    /// An empty table (nothing hidden).
    pub fn none() -> Self {
        Self::new(0, Vec::new())
    }

    /// Whether `module` (raw or normalized) is a retired alias.
    pub fn is_retired(&self, module: &str) -> bool {
        let key = normalize(Some(module));
        self.aliases.iter().any(|a| normalize(Some(a)) == key)
    }

    /// Iterate `modules`, keeping only the ones that should be surfaced.
    pub fn surfaced<'a, I>(&'a self, modules: I) -> impl Iterator<Item = &'a ModuleKey> + 'a
    where
        I: IntoIterator<Item = &'a ModuleKey>,
        I::IntoIter: 'a,
    {
        modules
            .into_iter()
            .filter(move |k| !self.is_retired(k.as_str()))
    }
}

impl Default for RetiredModules {
    fn default() -> Self {
        Self::v1()
    }
}
