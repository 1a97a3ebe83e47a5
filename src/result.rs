//! Task result assembly from a [`VarDict`].
//!
//! Builds the JSON-like payload a unit of work returns: the output
//! variables at the requested verbosity, the before/after diff in diff mode,
//! the facts, the aggregate changed status and any recorded diagnostics.

use crate::diagnostics::{Deprecation, Diagnostics};
use crate::vars::{VarDict, VarDiff, VarMap};
use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Settings for [`TaskResult::from_vars`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOptions {
    /// Verbosity the result is built for (0..=4)
    pub verbosity: u8,
    /// Include the before/after diff
    pub diff_mode: bool,
    /// Key under `ansible_facts` holding the facts; `None` puts them at the top
    pub facts_name: Option<String>,
    /// Force the changed status on top of the tracked variables
    pub changed: bool,
    /// Message of the result
    pub msg: String,
}

impl Default for ResultOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            diff_mode: false,
            facts_name: None,
            changed: false,
            msg: String::new(),
        }
    }
}

impl ResultOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the verbosity
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Enable or disable diff mode
    pub fn with_diff_mode(mut self, diff_mode: bool) -> Self {
        self.diff_mode = diff_mode;
        self
    }

    /// Nest facts under the given name
    pub fn with_facts_name(mut self, name: impl Into<String>) -> Self {
        self.facts_name = Some(name.into());
        self
    }

    /// Force the changed status
    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }

    /// Set the message
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }
}

/// Result payload of a unit of work
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    /// Whether anything changed
    pub changed: bool,
    /// Human-readable message
    #[serde(skip_serializing_if = "String::is_empty")]
    pub msg: String,
    /// Before/after of the changed variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<VarDiff>,
    /// Facts exposed by the unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_facts: Option<serde_json::Value>,
    /// Output variables
    #[serde(flatten)]
    pub data: VarMap,
    /// Warnings recorded during the unit
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Deprecations recorded during the unit
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deprecations: Vec<Deprecation>,
}

impl TaskResult {
    /// Build the result of a unit of work, draining its diagnostics
    pub fn from_vars(vars: &VarDict, options: &ResultOptions, diagnostics: &mut Diagnostics) -> Self {
        let diff = if options.diff_mode {
            vars.diff(options.verbosity)
        } else {
            None
        };

        let ansible_facts = vars.facts().map(|facts| {
            let facts = serde_json::Value::Object(facts.into_iter().collect());
            match &options.facts_name {
                Some(name) => {
                    let mut nested = serde_json::Map::new();
                    nested.insert(name.clone(), facts);
                    serde_json::Value::Object(nested)
                }
                None => facts,
            }
        });

        let drained = diagnostics.drain();

        Self {
            changed: options.changed || vars.has_changed(),
            msg: options.msg.clone(),
            diff,
            ansible_facts,
            data: vars.output(options.verbosity),
            warnings: drained.warnings,
            deprecations: drained.deprecations,
        }
    }
}

/// Render a diff as a unified text diff of the pretty-printed before/after
/// JSON documents.
pub fn render_diff(diff: &VarDiff, use_color: bool) -> String {
    let before = serde_json::to_string_pretty(&diff.before).unwrap_or_default() + "\n";
    let after = serde_json::to_string_pretty(&diff.after).unwrap_or_default() + "\n";
    let text_diff = TextDiff::from_lines(&before, &after);

    let mut output = String::new();
    let (old_header, new_header) = ("--- before", "+++ after");
    if use_color {
        let _ = writeln!(output, "{}", old_header.red());
        let _ = writeln!(output, "{}", new_header.green());
    } else {
        let _ = writeln!(output, "{}", old_header);
        let _ = writeln!(output, "{}", new_header);
    }

    let mut unified = text_diff.unified_diff();
    unified.context_radius(3);
    for hunk in unified.iter_hunks() {
        let _ = writeln!(output, "{}", hunk.header());
        for change in hunk.iter_changes() {
            let (sign, line) = match change.tag() {
                ChangeTag::Delete => ("-", change.value()),
                ChangeTag::Insert => ("+", change.value()),
                ChangeTag::Equal => (" ", change.value()),
            };
            let text = format!("{}{}", sign, line.trim_end_matches('\n'));
            let text = match (use_color, change.tag()) {
                (true, ChangeTag::Delete) => text.red().to_string(),
                (true, ChangeTag::Insert) => text.green().to_string(),
                _ => text,
            };
            let _ = writeln!(output, "{}", text);
        }
    }

    output
}
