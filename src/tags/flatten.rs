//! Loading and flattening of tag declarations.
//!
//! A declaration arrives either as a comma separated string (`tags: web, db`)
//! or as a list whose items are scalars or lists (`tags: [web, [a, b]]`).
//! [`load_tags`] turns the raw YAML into [`TagEntry`] values and
//! [`flatten_tags`] reduces entries to a flat [`TagSet`].

use super::types::{Tag, TagEntry, TagSet};
use crate::error::{Error, Result};
use serde_yaml::Value;

/// Load a raw tag declaration.
///
/// - `null` yields no entries
/// - a string is split on commas, each piece trimmed; empty pieces are dropped
/// - a list keeps its items, nested lists one level deep
///
/// Anything else, including a bare number at the top level, is rejected.
pub fn load_tags(value: &Value, context: &str) -> Result<Vec<TagEntry>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(split_tag_string(s)
            .map(|t| TagEntry::Single(Tag::from(t)))
            .collect()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::Sequence(nested) => nested
                    .iter()
                    .map(|v| scalar_tag(v, context))
                    .collect::<Result<Vec<_>>>()
                    .map(TagEntry::List),
                other => scalar_tag(other, context).map(TagEntry::Single),
            })
            .collect(),
        _ => Err(Error::invalid_tags(
            context,
            "tags must be specified as a list",
        )),
    }
}

fn scalar_tag(value: &Value, context: &str) -> Result<Tag> {
    match value {
        Value::String(s) => Ok(Tag::Str(s.clone())),
        Value::Number(n) => n.as_i64().map(Tag::Int).ok_or_else(|| {
            Error::invalid_tags(context, format!("tag '{}' is not a string or integer", n))
        }),
        other => Err(Error::invalid_tags(
            context,
            format!("tag {:?} is not a string or integer", other),
        )),
    }
}

/// Split a comma separated tag string, dropping empty pieces
pub fn split_tag_string(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Flatten entries one level into a de-duplicated set.
///
/// List entries contribute each of their elements, scalar entries are added
/// as-is.
pub fn flatten_tags<'a, I>(entries: I) -> TagSet
where
    I: IntoIterator<Item = &'a TagEntry>,
{
    entries
        .into_iter()
        .flat_map(TagEntry::tags)
        .cloned()
        .collect()
}

/// Parse command line style tag values (`-t web,db -t app`) into a set
pub fn parse_tag_values<S: AsRef<str>>(values: &[S]) -> TagSet {
    values
        .iter()
        .flat_map(|v| split_tag_string(v.as_ref()))
        .map(Tag::from)
        .collect()
}
