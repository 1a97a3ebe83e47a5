//! Warning and deprecation accumulation for a unit of work.
//!
//! A [`Diagnostics`] value is created when a unit of work starts, handed to
//! whatever needs to report problems, and drained into the final result.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

/// A deprecation notice
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Deprecation {
    /// Message shown to the user
    pub msg: String,
    /// Version in which the deprecated behavior is removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Date after which the deprecated behavior is removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Collection owning the deprecated behavior
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl Deprecation {
    /// Create a deprecation with only a message
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            version: None,
            date: None,
            collection_name: None,
        }
    }

    /// Set the removal version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the removal date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set the owning collection
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection_name = Some(collection.into());
        self
    }
}

/// Drained content of a [`Diagnostics`] accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainedDiagnostics {
    /// Warnings in the order they were first recorded
    pub warnings: Vec<String>,
    /// Deprecations in the order they were first recorded
    pub deprecations: Vec<Deprecation>,
}

/// De-duplicating accumulator of warnings and deprecations
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: IndexSet<String>,
    deprecations: IndexSet<Deprecation>,
}

impl Diagnostics {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.warnings.insert(msg.clone()) {
            debug!(warning = %msg, "warning recorded");
        }
    }

    /// Record a deprecation
    pub fn deprecate(&mut self, deprecation: Deprecation) {
        if !self.deprecations.contains(&deprecation) {
            debug!(deprecation = %deprecation.msg, version = ?deprecation.version, date = ?deprecation.date, "deprecation recorded");
            self.deprecations.insert(deprecation);
        }
    }

    /// Recorded warnings
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().map(String::as_str)
    }

    /// Recorded deprecations
    pub fn deprecations(&self) -> impl Iterator<Item = &Deprecation> {
        self.deprecations.iter()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.deprecations.is_empty()
    }

    /// Take everything recorded so far, leaving the accumulator empty
    pub fn drain(&mut self) -> DrainedDiagnostics {
        DrainedDiagnostics {
            warnings: std::mem::take(&mut self.warnings).into_iter().collect(),
            deprecations: std::mem::take(&mut self.deprecations).into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_deduplicated_in_order() {
        let mut diag = Diagnostics::new();
        diag.warn("second");
        diag.warn("first");
        diag.warn("second");

        assert_eq!(diag.warnings().collect::<Vec<_>>(), vec!["second", "first"]);
    }

    #[test]
    fn test_deprecations() {
        let mut diag = Diagnostics::new();
        let dep = Deprecation::new("old option")
            .with_version("2.0.0")
            .with_collection("community.general");
        diag.deprecate(dep.clone());
        diag.deprecate(dep.clone());
        diag.deprecate(Deprecation::new("old option").with_date("2027-01-01"));

        assert_eq!(diag.deprecations().count(), 2);
        assert_eq!(diag.deprecations().next(), Some(&dep));
    }

    #[test]
    fn test_drain_empties() {
        let mut diag = Diagnostics::new();
        assert!(diag.is_empty());
        diag.warn("w");
        diag.deprecate(Deprecation::new("d"));

        let drained = diag.drain();
        assert_eq!(drained.warnings, vec!["w".to_string()]);
        assert_eq!(drained.deprecations.len(), 1);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_deprecation_serialization_skips_missing() {
        let value = serde_json::to_value(Deprecation::new("gone").with_version("3")).unwrap();
        assert_eq!(value, serde_json::json!({"msg": "gone", "version": "3"}));
    }
}
