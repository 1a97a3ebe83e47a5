//! Per-variable metadata and change tracking.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// Highest verbosity level accepted (`-vvvv`)
pub const MAX_VERBOSITY: u8 = 4;

fn check_verbosity(verbosity: u8) -> Result<u8> {
    if verbosity > MAX_VERBOSITY {
        return Err(Error::InvalidVerbosity(verbosity));
    }
    Ok(verbosity)
}

/// Optional settings for [`VarDict::set_with`](super::VarDict::set_with) and
/// [`VarDict::set_meta`](super::VarDict::set_meta).
///
/// Fields left as `None` keep their current value (or the default for a new
/// variable).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarOptions {
    /// Include in the before/after diff
    pub diff: Option<bool>,
    /// Include in the result payload
    pub output: Option<bool>,
    /// Count toward the changed status; follows `diff` when never set
    pub change: Option<bool>,
    /// Expose as a fact
    pub fact: Option<bool>,
    /// Minimum verbosity at which the variable is visible
    pub verbosity: Option<u8>,
    /// Replace the recorded initial value
    pub initial_value: Option<Value>,
}

impl VarOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diff flag
    pub fn diff(mut self, diff: bool) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Set the output flag
    pub fn output(mut self, output: bool) -> Self {
        self.output = Some(output);
        self
    }

    /// Set the change flag
    pub fn change(mut self, change: bool) -> Self {
        self.change = Some(change);
        self
    }

    /// Set the fact flag
    pub fn fact(mut self, fact: bool) -> Self {
        self.fact = Some(fact);
        self
    }

    /// Set the verbosity threshold
    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    /// Override the initial value
    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }
}

/// One tracked variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarMeta {
    value: Value,
    initial_value: Value,
    init: bool,
    diff: bool,
    output: bool,
    change: Option<bool>,
    fact: bool,
    verbosity: u8,
}

impl Default for VarMeta {
    fn default() -> Self {
        Self {
            value: Value::Null,
            initial_value: Value::Null,
            init: false,
            diff: false,
            output: true,
            change: None,
            fact: false,
            verbosity: 0,
        }
    }
}

impl VarMeta {
    /// Create a variable with default flags and the given options applied
    pub fn new(options: VarOptions) -> Result<Self> {
        let mut meta = Self::default();
        meta.set_meta(options)?;
        Ok(meta)
    }

    /// Update the fields present in `options`.
    ///
    /// An `initial_value` marks the variable as initialized, so a following
    /// [`set_value`](Self::set_value) keeps it.
    pub fn set_meta(&mut self, options: VarOptions) -> Result<()> {
        // validate before mutating anything
        let verbosity = options.verbosity.map(check_verbosity).transpose()?;

        if let Some(output) = options.output {
            self.output = output;
        }
        if let Some(change) = options.change {
            self.change = Some(change);
        }
        if let Some(diff) = options.diff {
            self.diff = diff;
        }
        if let Some(fact) = options.fact {
            self.fact = fact;
        }
        if let Some(initial) = options.initial_value {
            self.initial_value = initial;
            self.init = true;
        }
        if let Some(verbosity) = verbosity {
            self.verbosity = verbosity;
        }
        Ok(())
    }

    /// Assign a new value; the first assignment also records the initial value
    pub fn set_value(&mut self, value: Value) {
        if !self.init {
            self.initial_value = value.clone();
            self.init = true;
        }
        self.value = value;
    }

    /// Current value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value at first assignment
    pub fn initial_value(&self) -> &Value {
        &self.initial_value
    }

    /// Diff flag
    pub fn diff(&self) -> bool {
        self.diff
    }

    /// Output flag
    pub fn output(&self) -> bool {
        self.output
    }

    /// Effective change flag
    pub fn change(&self) -> bool {
        self.change.unwrap_or(self.diff)
    }

    /// Fact flag
    pub fn fact(&self) -> bool {
        self.fact
    }

    /// Verbosity threshold
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Check if the variable is shown at the given verbosity
    pub fn is_visible(&self, verbosity: u8) -> bool {
        self.verbosity <= verbosity
    }

    /// Whether the value moved away from its initial value and counts as a change
    pub fn has_changed(&self) -> bool {
        self.change() && self.initial_value != self.value
    }

    /// `(before, after)` when the variable is diffed and changed
    pub fn diff_result(&self) -> Option<(&Value, &Value)> {
        (self.diff && self.has_changed()).then_some((&self.initial_value, &self.value))
    }

    /// Metadata-only snapshot
    pub fn snapshot_meta(&self) -> MetaSnapshot {
        MetaSnapshot {
            diff: self.diff,
            change: self.change(),
            output: self.output,
            fact: self.fact,
            verbosity: self.verbosity,
        }
    }

    /// Full snapshot including values
    pub fn snapshot(&self) -> VarSnapshot {
        VarSnapshot {
            meta: self.snapshot_meta(),
            initial_value: self.initial_value.clone(),
            value: self.value.clone(),
        }
    }
}

/// Serializable view of a variable's flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaSnapshot {
    /// Diff flag
    pub diff: bool,
    /// Effective change flag
    pub change: bool,
    /// Output flag
    pub output: bool,
    /// Fact flag
    pub fact: bool,
    /// Verbosity threshold
    pub verbosity: u8,
}

/// Serializable view of a variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarSnapshot {
    /// Flags
    #[serde(flatten)]
    pub meta: MetaSnapshot,
    /// Value at first assignment
    pub initial_value: Value,
    /// Current value
    pub value: Value,
}
