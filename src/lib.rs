//! # rustible-tags - Tag Selection for Rustible Playbooks
//!
//! rustible-tags decides which plays, blocks and tasks run under a given
//! `--tags` / `--skip-tags` selection, and provides the change-tracking
//! variable store units of work use to build their result payload.
//!
//! ## Core Concepts
//!
//! - **Tags**: Labels declared on plays, blocks and tasks, flattened into sets
//! - **Special tags**: `always`, `never`, `tagged`, `untagged` and `all`
//! - **Tag filter**: The only-tags and skip-tags sets of a run
//! - **Tag chain**: The play to task path whose declarations may be templated
//! - **Variable store**: Named values tracking initial value, diff, output and
//!   fact flags
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  Playbook Model + Task Selection                     │
//! │             (walks plays, blocks and tasks with a TagChain)          │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │   Tag Filter    │   │   Tag Templater     │   │   Variable Store    │
//! │ (decision rule) │   │   (minijinja)       │   │ (VarDict + result)  │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use rustible_tags::prelude::*;
//!
//! let playbook = Playbook::parse_str(r#"
//! - name: Site
//!   tasks:
//!     - name: Install
//!       package: { name: nginx }
//!       tags: [install]
//!     - name: Configure
//!       template: { src: a, dest: b }
//!       tags: [config]
//! "#)?;
//!
//! let filter = TagFilter::new().with_tags(["install"]);
//! let plays = select_tasks(
//!     &playbook,
//!     &filter,
//!     &MiniJinjaTemplater::new(),
//!     &TemplateVars::new(),
//!     true,
//! )?;
//!
//! let selected: Vec<_> = plays[0].selected().map(|t| t.name.as_str()).collect();
//! assert_eq!(selected, vec!["Install"]);
//! # Ok::<(), rustible_tags::Error>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};

    // Tags
    pub use crate::tags::{
        flatten_tags, load_tags, should_run, tag_set, MiniJinjaTemplater, NoopTemplater, Tag,
        TagChain, TagEntry, TagFilter, TagSet, TagTemplater, TemplateVars,
    };

    // Playbooks
    pub use crate::playbook::{Play, Playbook, Task, TaskNode};
    pub use crate::selection::{collect_tags, select_tasks, PlaySelection, TaskSelection};

    // Variables
    pub use crate::diagnostics::Diagnostics;
    pub use crate::result::{ResultOptions, TaskResult};
    pub use crate::vars::{VarDict, VarOptions};
}

pub use error::{Error, Result};

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Tag model and the decision engine.
///
/// Declarations are loaded into [`TagEntry`](tags::TagEntry) values,
/// flattened into [`TagSet`](tags::TagSet)s and decided against a
/// [`TagFilter`](tags::TagFilter). Dynamic declarations are resolved through a
/// [`TagChain`](tags::TagChain) and a [`TagTemplater`](tags::TagTemplater).
pub mod tags;

/// Change-tracking variable store.
pub mod vars;

// ============================================================================
// Results
// ============================================================================

/// Warning and deprecation accumulation.
pub mod diagnostics;

/// Result payload assembly from a variable store.
///
/// Combines output variables, diff, facts and diagnostics into a
/// [`TaskResult`](result::TaskResult) and renders diffs as unified text.
pub mod result;

// ============================================================================
// Playbook Components
// ============================================================================

/// Playbook parsing and representation.
///
/// Only plays, blocks and tasks with their names, tags and variables are
/// modeled.
pub mod playbook;

/// Task selection over a playbook.
pub mod selection;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration loading from files and environment.
pub mod config;

/// Logging setup.
pub mod logging;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
