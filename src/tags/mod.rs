//! Tag system for task filtering and selection.
//!
//! This module decides whether a tagged unit of work (play, block, task)
//! runs under the `--tags` / `--skip-tags` filters of a run:
//! - Tag declarations mixing scalars and lists, flattened one level
//! - Template resolution of dynamic tags through a pluggable templater
//! - Special tags: `always`, `never`, `tagged`, `untagged`, `all`
//! - Tag collection and listing
//!
//! # Special Tags
//!
//! - `always`: Unit runs regardless of `--tags`, and survives `--skip-tags all`
//!   unless `always` itself is skipped
//! - `never`: Unit is left out of `all` and `tagged` selections
//! - `tagged`: Matches any unit that has at least one tag
//! - `untagged`: Synthetic tag of units without tags
//! - `all`: Matches every unit
//!
//! # Example
//!
//! ```rust
//! use rustible_tags::tags::{tag_set, TagFilter};
//!
//! let filter = TagFilter::new()
//!     .with_tags(["deploy"])
//!     .with_skip_tags(["debug"]);
//!
//! assert!(filter.should_run(Some(&tag_set(["deploy", "web"]))));
//! assert!(!filter.should_run(Some(&tag_set(["deploy", "debug"]))));
//! assert!(!filter.should_run(None));
//! ```

mod chain;
mod filter;
mod flatten;
mod resolve;
mod types;

pub use chain::{ScopeKind, TagChain, TagScope};
pub use filter::{should_run, untagged, TagFilter};
pub use flatten::{flatten_tags, load_tags, parse_tag_values, split_tag_string};
pub use resolve::{MiniJinjaTemplater, NoopTemplater, TagTemplater, TemplateVars};
pub use types::{format_tags, has_tag, tag_set, Tag, TagEntry, TagSet};

use std::collections::{BTreeMap, BTreeSet};

/// Special tag constants
pub mod special {
    /// Tag that causes a task to always run regardless of tag selection
    pub const ALWAYS: &str = "always";

    /// Tag that keeps a task out of `all` and `tagged` selections
    pub const NEVER: &str = "never";

    /// Matches any task that has at least one tag
    pub const TAGGED: &str = "tagged";

    /// Synthetic tag of tasks without tags
    pub const UNTAGGED: &str = "untagged";

    /// Matches all tasks
    pub const ALL: &str = "all";
}

/// Check if a tag is a special tag
pub fn is_special_tag(tag: &Tag) -> bool {
    tag.as_str().is_some_and(|t| {
        matches!(
            t,
            special::ALWAYS | special::NEVER | special::TAGGED | special::UNTAGGED | special::ALL
        )
    })
}

/// Collect all tags from a playbook structure
#[derive(Debug, Clone, Default)]
pub struct TagCollector {
    /// All unique tags found
    pub tags: BTreeSet<Tag>,
    /// Tag to task name mapping
    pub tag_tasks: BTreeMap<Tag, Vec<String>>,
}

impl TagCollector {
    /// Create a new empty tag collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag with an optional task name
    pub fn add_tag(&mut self, tag: impl Into<Tag>, task_name: Option<&str>) {
        let tag = tag.into();
        self.tags.insert(tag.clone());

        if let Some(name) = task_name {
            self.tag_tasks
                .entry(tag)
                .or_default()
                .push(name.to_string());
        }
    }

    /// Add every tag of a set
    pub fn add_tags(&mut self, tags: &TagSet, task_name: Option<&str>) {
        for tag in tags {
            self.add_tag(tag.clone(), task_name);
        }
    }

    /// Get all tags in sorted order
    pub fn all_tags(&self) -> Vec<&Tag> {
        self.tags.iter().collect()
    }

    /// Get task names for a specific tag
    pub fn tasks_for_tag(&self, tag: &Tag) -> Option<&Vec<String>> {
        self.tag_tasks.get(tag)
    }

    /// Format tags for display
    pub fn format_display(&self) -> String {
        let mut output = String::new();

        if self.tags.is_empty() {
            output.push_str("No tags found in playbook.\n");
            return output;
        }

        output.push_str(&format!("Found {} unique tags:\n\n", self.tags.len()));

        for tag in &self.tags {
            output.push_str(&format!("  {}", tag));

            if let Some(tasks) = self.tag_tasks.get(tag) {
                output.push_str(&format!(
                    " ({} task{})",
                    tasks.len(),
                    if tasks.len() == 1 { "" } else { "s" }
                ));
            }

            if is_special_tag(tag) {
                output.push_str(" [special]");
            }

            output.push('\n');
        }

        output
    }
}
