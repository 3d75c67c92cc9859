//! Module key normalization.
//!
//! Module labels arrive from the catalog in whatever spelling the data entry
//! used ("Técnico", "TECNICO ", "tecnico"). Every comparison between modules
//! goes through [`normalize`]; raw labels are never compared directly.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Canonical key of the technical-functions pseudo-module.
pub const TECHNICAL_MODULE: &str = "tecnico";

/// Canonical (normalized) module key.
///
/// Deserialization normalizes, so a `ModuleKey` always holds canonical text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ModuleKey(String);

impl ModuleKey {
    pub fn new(label: &str) -> Self {
        normalize(Some(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this key is the technical-functions pseudo-module.
    pub fn is_technical(&self) -> bool {
        self.0 == TECHNICAL_MODULE
    }
}

impl From<String> for ModuleKey {
    fn from(value: String) -> Self {
        normalize(Some(&value))
    }
}

impl From<&str> for ModuleKey {
    fn from(value: &str) -> Self {
        normalize(Some(value))
    }
}

impl From<ModuleKey> for String {
    fn from(value: ModuleKey) -> Self {
        value.0
    }
}

impl Borrow<str> for ModuleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a module label.
///
/// Canonical decomposition, combining diacritical marks removed, trimmed,
/// lowercased. Missing or empty input yields the empty key.
///
/// ```
/// use panelerp_auth::normalize::normalize;
///
/// assert_eq!(normalize(Some("Técnico ")).as_str(), "tecnico");
/// assert_eq!(normalize(None).as_str(), "");
/// ```
pub fn normalize(input: Option<&str>) -> ModuleKey {
    let Some(raw) = input.filter(|s| !s.is_empty()) else {
        return ModuleKey(String::new());
    };

    ModuleKey(fold(raw.trim()).trim().to_string())
}

/// Accent-insensitive, lowercased form of `s`, used for comparisons.
pub(crate) fn fold(s: &str) -> String {
    let stripped = strip_marks(s);
    // Lowercasing can reintroduce combining marks (`İ` lowercases to `i̇`),
    // so the strip runs again on the lowercased text.
    strip_marks(stripped.to_lowercase().as_str())
}

fn strip_marks(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_diacritic(*c)).collect()
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}
