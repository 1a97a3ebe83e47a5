//! Tag scope chain used while walking a playbook.
//!
//! The chain holds the tag declarations of every construct from the play
//! down to the current unit: the play, its enclosing blocks and the task.
//!
//! A traversal pushes a scope when it enters a construct and pops it when it
//! leaves, so the chain always describes the path from the root to the unit
//! being evaluated.

use super::filter::TagFilter;
use super::flatten::flatten_tags;
use super::resolve::{TagTemplater, TemplateVars};
use super::types::{TagEntry, TagSet};
use crate::error::Result;
use std::fmt;
use tracing::{debug, trace};

/// Kind of construct a scope belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// A play
    Play,
    /// A block
    Block,
    /// A task or handler
    Task,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Play => "play",
            ScopeKind::Block => "block",
            ScopeKind::Task => "task",
        };
        f.write_str(name)
    }
}

/// The declared tags of one construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagScope {
    /// Construct kind
    pub kind: ScopeKind,
    /// Display name of the construct
    pub name: String,
    /// Declared tags, replaced by their resolved form once templated
    pub tags: Vec<TagEntry>,
}

impl TagScope {
    /// Create a new scope
    pub fn new(kind: ScopeKind, name: impl Into<String>, tags: Vec<TagEntry>) -> Self {
        Self {
            kind,
            name: name.into(),
            tags,
        }
    }

    /// Check if the scope declares any tags
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// The declared tags flattened into a set
    pub fn tag_set(&self) -> TagSet {
        flatten_tags(&self.tags)
    }
}

/// Explicit root-to-current chain of tag scopes.
#[derive(Debug, Clone, Default)]
pub struct TagChain {
    scopes: Vec<TagScope>,
}

impl TagChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a construct
    pub fn push(&mut self, scope: TagScope) {
        trace!(kind = %scope.kind, name = %scope.name, depth = self.scopes.len(), "enter tag scope");
        self.scopes.push(scope);
    }

    /// Enter a construct built from its parts
    pub fn push_scope(&mut self, kind: ScopeKind, name: impl Into<String>, tags: Vec<TagEntry>) {
        self.push(TagScope::new(kind, name, tags));
    }

    /// Leave the innermost construct
    pub fn pop(&mut self) -> Option<TagScope> {
        self.scopes.pop()
    }

    /// Number of scopes in the chain
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// All scopes, root first
    pub fn scopes(&self) -> &[TagScope] {
        &self.scopes
    }

    /// The innermost scope
    pub fn current(&self) -> Option<&TagScope> {
        self.scopes.last()
    }

    /// The current scope's tags
    pub fn current_tags(&self) -> TagSet {
        self.current().map(TagScope::tag_set).unwrap_or_default()
    }

    /// Union of the tags of every scope in the chain
    pub fn inherited_tags(&self) -> TagSet {
        flatten_tags(self.scopes.iter().flat_map(|s| s.tags.iter()))
    }

    /// Template the declared tags of every scope and write the flattened
    /// result back onto it.
    ///
    /// Template failures propagate; scopes resolved before the failure keep
    /// their resolved tags.
    pub fn resolve_all(
        &mut self,
        templater: &dyn TagTemplater,
        vars: &TemplateVars,
    ) -> Result<()> {
        for scope in self.scopes.iter_mut().rev() {
            if !scope.has_tags() {
                continue;
            }
            let templated = templater.template_tags(&scope.tags, vars)?;
            scope.tags = flatten_tags(&templated)
                .into_iter()
                .map(TagEntry::Single)
                .collect();
            trace!(kind = %scope.kind, name = %scope.name, tags = ?scope.tags, "resolved scope tags");
        }
        Ok(())
    }

    /// Decide whether the current unit runs, using only its own tags.
    ///
    /// When the unit declares tags, every scope in the chain is resolved
    /// first; ancestors keep their resolved tags for later decisions.
    pub fn evaluate(
        &mut self,
        filter: &TagFilter,
        templater: &dyn TagTemplater,
        vars: &TemplateVars,
    ) -> Result<bool> {
        let has_tags = self.current().is_some_and(TagScope::has_tags);
        if has_tags {
            self.resolve_all(templater, vars)?;
        }
        let tags = self.current_tags();
        let run = filter.should_run(Some(&tags));
        debug!(
            unit = self.current().map(|s| s.name.as_str()).unwrap_or_default(),
            tags = ?tags,
            run,
            "evaluated tags"
        );
        Ok(run)
    }

    /// Decide whether the current unit runs, using the tags of every scope in
    /// the chain.
    pub fn evaluate_inherited(
        &mut self,
        filter: &TagFilter,
        templater: &dyn TagTemplater,
        vars: &TemplateVars,
    ) -> Result<bool> {
        let has_tags = self.scopes.iter().any(TagScope::has_tags);
        if has_tags {
            self.resolve_all(templater, vars)?;
        }
        let tags = self.inherited_tags();
        let run = filter.should_run(Some(&tags));
        debug!(
            unit = self.current().map(|s| s.name.as_str()).unwrap_or_default(),
            tags = ?tags,
            run,
            "evaluated inherited tags"
        );
        Ok(run)
    }
}
