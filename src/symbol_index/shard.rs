//! Shard parsing
//!
//! Two serialized forms are accepted:
//! - JSON tuples: `[["key", [["label", "url", "scope"], ...]], ...]`, where a
//!   target may carry a fourth element naming its kind.
//! - Doxygen search data: `var searchData=[['key',['Name',['url',1,'scope'],...]],...];`
//!   with keys written in Doxygen's `_XX` escaping.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::escape::{decode_key, normalize_key};
use super::js_literal::parse_literal;
use super::types::{infer_kind, IndexEntry, Target, TargetKind};
use crate::error::{IndexError, Result};

lazy_static::lazy_static! {
    static ref JS_ASSIGNMENT: Regex = Regex::new(r"^\s*var\s+[A-Za-z_$][\w$]*\s*=").unwrap();
}

/// Serialized layout of a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardFormat {
    Json,
    Doxygen,
}

impl ShardFormat {
    pub fn detect(text: &str) -> Self {
        if JS_ASSIGNMENT.is_match(text) {
            ShardFormat::Doxygen
        } else {
            ShardFormat::Json
        }
    }
}

/// Parse one shard into entries, in the order they appear.
///
/// `shard` only names the source in error messages. Duplicate keys are
/// left for the index builder to resolve.
pub fn parse_shard(shard: &str, text: &str) -> Result<Vec<IndexEntry>> {
    let format = ShardFormat::detect(text);
    debug!(shard, ?format, bytes = text.len(), "parsing shard");

    match format {
        ShardFormat::Json => parse_json(shard, text),
        ShardFormat::Doxygen => parse_doxygen(shard, text),
    }
}

fn parse_json(shard: &str, text: &str) -> Result<Vec<IndexEntry>> {
    let rows: Vec<(String, Vec<Vec<String>>)> = serde_json::from_str(text)
        .map_err(|e| IndexError::malformed(shard, e.to_string()))?;

    rows.into_iter()
        .enumerate()
        .map(|(i, (name, targets))| {
            let key = checked_key(shard, i, &name)?;
            if targets.is_empty() {
                return Err(IndexError::malformed(
                    shard,
                    format!("entry {} (`{}`) has no targets", i, name),
                ));
            }

            let siblings: Vec<(&str, &str)> = targets
                .iter()
                .filter(|t| t.len() >= 3)
                .map(|t| (t[1].as_str(), t[2].as_str()))
                .collect();

            let targets = targets
                .iter()
                .enumerate()
                .map(|(j, fields)| json_target(shard, i, j, fields, &siblings))
                .collect::<Result<Vec<_>>>()?;

            Ok(IndexEntry::new(key, name, targets))
        })
        .collect()
}

fn json_target(
    shard: &str,
    entry: usize,
    index: usize,
    fields: &[String],
    siblings: &[(&str, &str)],
) -> Result<Target> {
    let (label, url, scope) = match fields {
        [label, url, scope] | [label, url, scope, _] => (label, url, scope),
        _ => {
            return Err(IndexError::malformed(
                shard,
                format!(
                    "entry {} target {} has {} fields, expected label, url, scope",
                    entry,
                    index,
                    fields.len()
                ),
            ))
        }
    };

    if url.is_empty() {
        return Err(IndexError::malformed(
            shard,
            format!("entry {} target {} has an empty url", entry, index),
        ));
    }

    let kind = match fields.get(3) {
        Some(kind) => kind.parse::<TargetKind>().map_err(|e| {
            IndexError::malformed(shard, format!("entry {} target {}: {}", entry, index, e))
        })?,
        None => infer_kind(label, url, scope, siblings),
    };

    Ok(Target::new(label, url, scope, kind))
}

fn parse_doxygen(shard: &str, text: &str) -> Result<Vec<IndexEntry>> {
    let assignment = JS_ASSIGNMENT
        .find(text)
        .ok_or_else(|| IndexError::malformed(shard, "missing `var searchData=` prefix"))?;

    let value = parse_literal(&text[assignment.end()..])
        .map_err(|e| IndexError::malformed(shard, e.to_string()))?;

    let Value::Array(rows) = value else {
        return Err(IndexError::malformed(shard, "search data is not an array"));
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| doxygen_row(shard, i, row))
        .collect()
}

fn doxygen_row(shard: &str, i: usize, row: &Value) -> Result<IndexEntry> {
    let bad = |what: &str| IndexError::malformed(shard, format!("entry {}: {}", i, what));

    let [raw_key, item] = row.as_array().map(Vec::as_slice).unwrap_or_default() else {
        return Err(bad("expected ['key', ['Name', targets...]]"));
    };
    let raw_key = raw_key.as_str().ok_or_else(|| bad("key is not a string"))?;

    let item = item.as_array().ok_or_else(|| bad("item is not an array"))?;
    let Some((name, raw_targets)) = item.split_first() else {
        return Err(bad("item is empty"));
    };
    let name = name.as_str().ok_or_else(|| bad("display name is not a string"))?;
    if raw_targets.is_empty() {
        return Err(bad("no targets"));
    }

    // [url, frame flag, scope]
    let triples = raw_targets
        .iter()
        .enumerate()
        .map(|(j, t)| match t.as_array().map(Vec::as_slice) {
            Some([Value::String(url), Value::Number(_), Value::String(text)]) => {
                Ok((url.as_str(), text.as_str()))
            }
            _ => Err(bad(&format!("target {} is not ['url', flag, 'scope']", j))),
        })
        .collect::<Result<Vec<_>>>()?;

    let single = triples.len() == 1;
    let resolved: Vec<(&str, &str, String)> = triples
        .iter()
        .map(|&(url, text)| {
            if single {
                (name, url, text.to_string())
            } else {
                (text, url, enclosing_scope(text))
            }
        })
        .collect();

    let siblings: Vec<(&str, &str)> = resolved
        .iter()
        .map(|(_, url, scope)| (*url, scope.as_str()))
        .collect();

    let targets = resolved
        .iter()
        .map(|(label, url, scope)| {
            let kind = infer_kind(label, url, scope, &siblings);
            Target::new(label, url, scope, kind)
        })
        .collect();

    let decoded = decode_key(raw_key).map_err(|_| {
        IndexError::malformed(
            shard,
            format!("entry {}: key is not valid UTF-8 after decoding", i),
        )
    })?;
    let key = checked_key(shard, i, &decoded)?;
    Ok(IndexEntry::new(key, name.to_string(), targets))
}

fn checked_key(shard: &str, i: usize, name: &str) -> Result<String> {
    let key = normalize_key(name.trim());
    if key.is_empty() {
        return Err(IndexError::malformed(shard, format!("entry {} has an empty key", i)));
    }
    Ok(key)
}

/// `ns::Class::member(args)` -> `ns::Class`; `ns::Class` -> `ns`.
fn enclosing_scope(qualified: &str) -> String {
    let head = qualified.split('(').next().unwrap_or(qualified);
    match head.rfind("::") {
        Some(idx) => head[..idx].to_string(),
        None => String::new(),
    }
}
