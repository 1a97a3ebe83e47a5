//! Tag filter implementation for task selection.

use super::flatten::parse_tag_values;
use super::special;
use super::types::{has_tag, Tag, TagSet};
use std::sync::OnceLock;
use tracing::trace;

/// The synthetic tag set given to units without declared tags
pub fn untagged() -> &'static TagSet {
    static UNTAGGED: OnceLock<TagSet> = OnceLock::new();
    UNTAGGED.get_or_init(|| TagSet::from([Tag::from(special::UNTAGGED)]))
}

/// Decide whether a unit with the given tags should run.
///
/// `own_tags` of `None` or an empty set is treated as `{"untagged"}`.
///
/// # Logic
///
/// Inclusion (only when `only_tags` is non-empty):
/// 1. `always` in own tags includes
/// 2. `all` requested and no `never` in own tags includes
/// 3. any overlap with `only_tags` includes
/// 4. `tagged` requested, unit is tagged and has no `never` includes
///
/// Exclusion (only when still included and `skip_tags` is non-empty):
/// 1. `all` skipped excludes, unless the unit is `always` and `always` is
///    not itself skipped
/// 2. any overlap with `skip_tags` excludes
/// 3. `tagged` skipped and the unit is tagged excludes
pub fn should_run(own_tags: Option<&TagSet>, only_tags: &TagSet, skip_tags: &TagSet) -> bool {
    let tags = match own_tags {
        Some(tags) if !tags.is_empty() => tags,
        _ => untagged(),
    };
    let is_untagged = tags == untagged();

    let mut run = true;

    if !only_tags.is_empty() {
        run = if has_tag(tags, special::ALWAYS) {
            true
        } else if has_tag(only_tags, special::ALL) && !has_tag(tags, special::NEVER) {
            true
        } else if !tags.is_disjoint(only_tags) {
            true
        } else {
            has_tag(only_tags, special::TAGGED) && !is_untagged && !has_tag(tags, special::NEVER)
        };
    }

    if run && !skip_tags.is_empty() {
        if has_tag(skip_tags, special::ALL) {
            if !has_tag(tags, special::ALWAYS) || has_tag(skip_tags, special::ALWAYS) {
                run = false;
            }
        } else if !tags.is_disjoint(skip_tags)
            || (has_tag(skip_tags, special::TAGGED) && !is_untagged)
        {
            run = false;
        }
    }

    trace!(tags = ?tags, only = ?only_tags, skip = ?skip_tags, run, "tag decision");
    run
}

/// A filter for selecting tasks based on tags.
///
/// Holds the `--tags` and `--skip-tags` sets of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    /// Tags to include (tasks must match at least one)
    only_tags: TagSet,
    /// Tags to skip (tasks matching any are excluded)
    skip_tags: TagSet,
}

impl TagFilter {
    /// Create a new empty tag filter (matches all tasks)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter from command line values, splitting each on commas
    pub fn from_cli_values<S: AsRef<str>>(tags: &[S], skip_tags: &[S]) -> Self {
        Self {
            only_tags: parse_tag_values(tags),
            skip_tags: parse_tag_values(skip_tags),
        }
    }

    /// Add include tags
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.only_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add skip tags
    pub fn with_skip_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.skip_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// The include set
    pub fn only_tags(&self) -> &TagSet {
        &self.only_tags
    }

    /// The skip set
    pub fn skip_tags(&self) -> &TagSet {
        &self.skip_tags
    }

    /// Check if any filters are active
    pub fn is_active(&self) -> bool {
        !self.only_tags.is_empty() || !self.skip_tags.is_empty()
    }

    /// Check if a unit with the given (already resolved) tags should run
    pub fn should_run(&self, own_tags: Option<&TagSet>) -> bool {
        should_run(own_tags, &self.only_tags, &self.skip_tags)
    }
}
