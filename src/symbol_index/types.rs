//! Index data model
//!
//! Entries and anchor targets as they come out of a documentation
//! generator's search shards.

use serde::{Deserialize, Serialize};

use super::escape::decode_entities;

/// What a target points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Namespace,
    Class,
    Function,
    Overload,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TargetKind::Namespace => "namespace",
            TargetKind::Class => "class",
            TargetKind::Function => "function",
            TargetKind::Overload => "overload",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "namespace" => Ok(TargetKind::Namespace),
            "class" => Ok(TargetKind::Class),
            "function" => Ok(TargetKind::Function),
            "overload" => Ok(TargetKind::Overload),
            _ => Err(format!("Unknown target kind: {}", s)),
        }
    }
}

/// One clickable location for a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Human-readable qualifier (overload signature or declaring type)
    pub label: String,
    /// Relative document anchor
    pub url: String,
    /// Enclosing namespace or class
    pub scope: String,
    pub kind: TargetKind,
}

impl Target {
    pub fn new(label: &str, url: &str, scope: &str, kind: TargetKind) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
            scope: scope.to_string(),
            kind,
        }
    }

    /// Label with HTML entities decoded, for rendering
    pub fn display_label(&self) -> String {
        decode_entities(&self.label)
    }

    /// Scope with HTML entities decoded, for rendering
    pub fn display_scope(&self) -> String {
        decode_entities(&self.scope)
    }

    /// True if the url points inside a page rather than at a whole page.
    pub fn is_anchored(&self) -> bool {
        self.url.contains('#')
    }
}

/// A symbol name and every place it is documented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Normalized name: escapes decoded, lowercased. Unique per table.
    pub key: String,
    /// Display name as the generator wrote it
    pub name: String,
    pub targets: Vec<Target>,
}

impl IndexEntry {
    pub fn new(key: String, name: String, targets: Vec<Target>) -> Self {
        Self { key, name, targets }
    }
}

/// Kind for a target whose source did not say.
///
/// `siblings` holds (url, scope) for every target of the same entry,
/// this one included. Overloads share a scope; same-named members of
/// unrelated classes do not.
pub(crate) fn infer_kind(label: &str, url: &str, scope: &str, siblings: &[(&str, &str)]) -> TargetKind {
    if !url.contains('#') {
        let page = url.rsplit('/').next().unwrap_or(url);
        if page.starts_with("namespace") {
            return TargetKind::Namespace;
        }
        return TargetKind::Class;
    }

    let has_params = label.contains('(') && label.contains(')');
    let shares_scope = siblings
        .iter()
        .filter(|(other_url, other_scope)| other_url.contains('#') && *other_scope == scope)
        .count()
        > 1;

    if has_params && shares_scope {
        TargetKind::Overload
    } else {
        TargetKind::Function
    }
}
