//! Template resolution of dynamic tag declarations.
//!
//! Tags may reference variables, e.g. `tags: ["{{ role_name }}", web]` or
//! `tags: "{{ deploy_tags }}"` where `deploy_tags` is a list. Resolution is
//! delegated to a [`TagTemplater`] so the decision engine stays independent
//! of the template engine.

use super::types::{Tag, TagEntry};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use minijinja::value::ValueKind;
use minijinja::{Environment, UndefinedBehavior, Value};
use tracing::trace;

/// Variables visible to tag templates
pub type TemplateVars = IndexMap<String, serde_json::Value>;

/// Resolves template expressions embedded in tag declarations.
///
/// Given a sequence of entries, returns the same sequence with embedded
/// expressions substituted. A scalar entry may expand into a list entry.
/// Errors propagate to the caller unchanged.
pub trait TagTemplater {
    /// Template every entry of a declaration
    fn template_tags(&self, entries: &[TagEntry], vars: &TemplateVars) -> Result<Vec<TagEntry>>;
}

/// Templater that leaves every entry untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTemplater;

impl TagTemplater for NoopTemplater {
    fn template_tags(&self, entries: &[TagEntry], _vars: &TemplateVars) -> Result<Vec<TagEntry>> {
        Ok(entries.to_vec())
    }
}

/// Jinja2-compatible templater powered by minijinja.
///
/// Undefined variables are errors. An entry consisting of a single
/// `{{ expression }}` keeps the native type of its value (lists expand into a
/// list entry, integers stay integers); any other templated string renders
/// to a string tag.
#[derive(Debug)]
pub struct MiniJinjaTemplater {
    env: Environment<'static>,
}

impl Default for MiniJinjaTemplater {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniJinjaTemplater {
    /// Create a new templater with strict undefined handling
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        Self { env }
    }

    /// Check if a string contains template expressions
    pub fn has_template(s: &str) -> bool {
        s.contains("{{") || s.contains("{%") || s.contains("{#")
    }

    fn template_entry(&self, entry: &TagEntry, ctx: &Value) -> Result<TagEntry> {
        match entry {
            TagEntry::Single(tag) => self.template_tag(tag, ctx),
            TagEntry::List(tags) => {
                let mut out = Vec::with_capacity(tags.len());
                for tag in tags {
                    match self.template_tag(tag, ctx)? {
                        TagEntry::Single(t) => out.push(t),
                        TagEntry::List(nested) => out.extend(nested),
                    }
                }
                Ok(TagEntry::List(out))
            }
        }
    }

    fn template_tag(&self, tag: &Tag, ctx: &Value) -> Result<TagEntry> {
        let source = match tag {
            Tag::Str(s) if Self::has_template(s) => s,
            _ => return Ok(TagEntry::Single(tag.clone())),
        };

        let resolved = match single_expression(source) {
            Some(expr) => {
                let value = self
                    .env
                    .compile_expression_owned(expr.to_string())
                    .and_then(|compiled| compiled.eval(ctx))
                    .map_err(|e| Error::template_render(source, e.to_string()))?;
                value_to_entry(&value, source)?
            }
            None => {
                let rendered = self
                    .env
                    .render_str(source, ctx)
                    .map_err(|e| Error::template_render(source, e.to_string()))?;
                TagEntry::Single(Tag::Str(rendered))
            }
        };

        trace!(template = %source, resolved = ?resolved, "resolved tag template");
        Ok(resolved)
    }
}

impl TagTemplater for MiniJinjaTemplater {
    fn template_tags(&self, entries: &[TagEntry], vars: &TemplateVars) -> Result<Vec<TagEntry>> {
        let ctx = Value::from_serialize(vars);
        entries
            .iter()
            .map(|entry| self.template_entry(entry, &ctx))
            .collect()
    }
}

/// Return the inner expression of `{{ expr }}` when the whole string is one
/// expression block.
fn single_expression(s: &str) -> Option<&str> {
    let inner = s.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn value_to_tag(value: &Value, source: &str) -> Result<Tag> {
    match value.kind() {
        ValueKind::Undefined => Err(Error::template_render(source, "undefined value")),
        ValueKind::String => Ok(Tag::Str(value.as_str().unwrap_or_default().to_string())),
        ValueKind::Number => Ok(i64::try_from(value.clone())
            .map_or_else(|_| Tag::Str(value.to_string()), Tag::Int)),
        ValueKind::Bool => Ok(Tag::Str(value.is_true().to_string())),
        _ => Err(Error::template_render(
            source,
            format!("tag resolved to unsupported value {}", value),
        )),
    }
}

fn value_to_entry(value: &Value, source: &str) -> Result<TagEntry> {
    match value.kind() {
        ValueKind::None => Ok(TagEntry::List(Vec::new())),
        ValueKind::Seq | ValueKind::Iterable => value
            .try_iter()
            .map_err(|e| Error::template_render(source, e.to_string()))?
            .map(|item| value_to_tag(&item, source))
            .collect::<Result<Vec<_>>>()
            .map(TagEntry::List),
        _ => value_to_tag(value, source).map(TagEntry::Single),
    }
}
