//! Change-tracking variable store.
//!
//! A [`VarDict`] holds the named values of one unit of work. Every entry
//! carries flags deciding whether it shows up in the result payload, in the
//! before/after diff, in the facts, and whether its changes make the unit
//! report `changed`. The store is created empty when the unit starts, filled
//! as the work proceeds and read once at the end.
//!
//! # Example
//!
//! ```rust
//! use rustible_tags::vars::{VarDict, VarOptions};
//! use serde_json::json;
//!
//! let mut vars = VarDict::new();
//! vars.set_with("state", json!("absent"), VarOptions::new().diff(true))?;
//! vars.set("state", json!("present"))?;
//!
//! assert!(vars.has_changed());
//! let diff = vars.diff(0).unwrap();
//! assert_eq!(diff.before["state"], json!("absent"));
//! assert_eq!(diff.after["state"], json!("present"));
//! # Ok::<(), rustible_tags::Error>(())
//! ```

mod meta;

pub use meta::{MetaSnapshot, VarMeta, VarOptions, VarSnapshot, MAX_VERBOSITY};

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

/// Names used by the store itself; they cannot be used as variable names.
pub const RESERVED_NAMES: &[&str] = &[
    "__vars__",
    "_var",
    "var",
    "set_meta",
    "get_meta",
    "set",
    "output",
    "diff",
    "facts",
    "has_changed",
    "as_dict",
];

/// Check if a name is reserved
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Plain name to value mapping, in insertion order
pub type VarMap = IndexMap<String, Value>;

/// Before/after view of the changed, diffed variables
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VarDiff {
    /// Initial values
    pub before: VarMap,
    /// Current values
    pub after: VarMap,
}

/// Insertion-ordered store of tracked variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarDict {
    vars: IndexMap<String, VarMeta>,
}

impl VarDict {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, keeping the flags of an existing one
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.set_with(name, value, VarOptions::default())
    }

    /// Set a variable and update its flags.
    ///
    /// A new variable starts from the defaults (`diff=false`, `output=true`,
    /// `change` following `diff`, `fact=false`, verbosity 0) with `options`
    /// applied; an existing one only gets the fields present in `options`.
    /// The initial value is recorded on the first assignment only.
    pub fn set_with(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        options: VarOptions,
    ) -> Result<()> {
        if is_reserved(name) {
            return Err(Error::ReservedName(name.to_string()));
        }

        let value = value.into();
        match self.vars.get_mut(name) {
            Some(var) => {
                var.set_meta(options)?;
                var.set_value(value);
            }
            None => {
                let mut var = VarMeta::new(options)?;
                var.set_value(value);
                self.vars.insert(name.to_string(), var);
            }
        }
        trace!(name, "set variable");
        Ok(())
    }

    /// Current value of a variable
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.meta(name).map(VarMeta::value)
    }

    /// Current value of a variable, if set
    pub fn try_get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name).map(VarMeta::value)
    }

    /// Tracked record of a variable
    pub fn meta(&self, name: &str) -> Result<&VarMeta> {
        self.vars
            .get(name)
            .ok_or_else(|| Error::VariableNotFound(name.to_string()))
    }

    /// Update the flags of an existing variable without assigning a value
    pub fn set_meta(&mut self, name: &str, options: VarOptions) -> Result<()> {
        self.vars
            .get_mut(name)
            .ok_or_else(|| Error::VariableNotFound(name.to_string()))?
            .set_meta(options)
    }

    /// Flags of a variable
    pub fn get_meta(&self, name: &str) -> Result<MetaSnapshot> {
        self.meta(name).map(VarMeta::snapshot_meta)
    }

    /// Flags and values of a variable
    pub fn var(&self, name: &str) -> Result<VarSnapshot> {
        self.meta(name).map(VarMeta::snapshot)
    }

    /// Whether a single variable counts as changed
    pub fn var_has_changed(&self, name: &str) -> Result<bool> {
        self.meta(name).map(VarMeta::has_changed)
    }

    /// Whether any variable counts as changed
    pub fn has_changed(&self) -> bool {
        self.vars.values().any(VarMeta::has_changed)
    }

    /// Variables flagged for output and visible at `verbosity`
    pub fn output(&self, verbosity: u8) -> VarMap {
        self.vars
            .iter()
            .filter(|(_, v)| v.output() && v.is_visible(verbosity))
            .map(|(n, v)| (n.clone(), v.value().clone()))
            .collect()
    }

    /// Before/after values of changed, diffed variables visible at
    /// `verbosity`, or `None` when there are none
    pub fn diff(&self, verbosity: u8) -> Option<VarDiff> {
        let mut diff = VarDiff::default();
        for (name, var) in &self.vars {
            if !var.is_visible(verbosity) {
                continue;
            }
            if let Some((before, after)) = var.diff_result() {
                diff.before.insert(name.clone(), before.clone());
                diff.after.insert(name.clone(), after.clone());
            }
        }
        (!diff.before.is_empty()).then_some(diff)
    }

    /// Variables flagged as facts, or `None` when there are none
    pub fn facts(&self) -> Option<VarMap> {
        let facts: VarMap = self
            .vars
            .iter()
            .filter(|(_, v)| v.fact())
            .map(|(n, v)| (n.clone(), v.value().clone()))
            .collect();
        (!facts.is_empty()).then_some(facts)
    }

    /// Every variable's current value
    pub fn as_dict(&self) -> VarMap {
        self.vars
            .iter()
            .map(|(n, v)| (n.clone(), v.value().clone()))
            .collect()
    }

    /// Check if a variable is set
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Variable names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
