//! Tag value types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single tag token.
///
/// Tags are usually strings, but integer tags are accepted as well and are
/// compared by value: `Tag::Int(1)` and `Tag::Str("1")` are different tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    /// Integer tag
    Int(i64),
    /// String tag
    Str(String),
}

impl Tag {
    /// Returns the string value, if this is a string tag
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::Str(s) => Some(s),
            Tag::Int(_) => None,
        }
    }

    /// Check whether this tag is the given string token
    pub fn is(&self, token: &str) -> bool {
        self.as_str() == Some(token)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Int(i) => write!(f, "{}", i),
            Tag::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag::Str(s.to_string())
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Tag::Str(s)
    }
}

impl From<i64> for Tag {
    fn from(i: i64) -> Self {
        Tag::Int(i)
    }
}

/// A flat, de-duplicated set of tags.
pub type TagSet = BTreeSet<Tag>;

/// One raw entry of a tag declaration, before flattening.
///
/// Declarations may mix scalars and lists, e.g. `[web, "{{ extra_tags }}"]`
/// where the template later expands into a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    /// A scalar tag
    Single(Tag),
    /// A nested list of tags
    List(Vec<Tag>),
}

impl TagEntry {
    /// Iterate over the tags held by this entry
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        let slice: &[Tag] = match self {
            TagEntry::Single(tag) => std::slice::from_ref(tag),
            TagEntry::List(tags) => tags,
        };
        slice.iter()
    }
}

impl From<Tag> for TagEntry {
    fn from(tag: Tag) -> Self {
        TagEntry::Single(tag)
    }
}

impl From<&str> for TagEntry {
    fn from(s: &str) -> Self {
        TagEntry::Single(Tag::from(s))
    }
}

impl From<i64> for TagEntry {
    fn from(i: i64) -> Self {
        TagEntry::Single(Tag::Int(i))
    }
}

impl From<Vec<Tag>> for TagEntry {
    fn from(tags: Vec<Tag>) -> Self {
        TagEntry::List(tags)
    }
}

/// Build a tag set from string-like values
pub fn tag_set<I, T>(tags: I) -> TagSet
where
    I: IntoIterator<Item = T>,
    T: Into<Tag>,
{
    tags.into_iter().map(Into::into).collect()
}

/// Check whether a set contains the given string token
pub fn has_tag(tags: &TagSet, token: &str) -> bool {
    tags.iter().any(|t| t.is(token))
}

/// Format a tag set as `a, b, c`
pub fn format_tags(tags: &TagSet) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
