//! In-memory symbol table
//!
//! A `SymbolIndex` is built once from one or more shards and never changes
//! afterwards. Reloading means building a new one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::escape::normalize_key;
use super::shard::parse_shard;
use super::types::{IndexEntry, Target};
use crate::error::{IndexError, Result};

/// How a query string is matched against symbol names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Prefix,
}

/// How well an entry matched, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRank {
    Exact,
    Prefix,
    Substring,
}

/// Immutable symbol table
#[derive(Debug, Clone)]
pub struct SymbolIndex {
    entries: Vec<IndexEntry>,
    by_key: HashMap<String, usize>,
    /// Lowercased display names, parallel to `entries`
    folded_names: Vec<String>,
    shards: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl SymbolIndex {
    /// The table a discarded handle holds
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
            folded_names: Vec::new(),
            shards: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    /// Load a single serialized shard.
    pub fn load(serialized: &str) -> Result<Self> {
        Self::load_shards([("<inline>", serialized)])
    }

    /// Load and concatenate several shards. Any malformed shard fails the
    /// whole load.
    pub fn load_shards<'a, I, N>(shards: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, &'a str)>,
        N: AsRef<str>,
    {
        let mut builder = IndexBuilder::default();
        for (name, text) in shards {
            let name = name.as_ref();
            let entries = parse_shard(name, text)?;
            builder.add_shard(name, entries)?;
        }

        let index = builder.finish();
        info!(
            entries = index.len(),
            shards = index.shards.len(),
            "symbol index loaded"
        );
        Ok(index)
    }

    /// Build directly from entries, applying the same key normalization and
    /// duplicate rules as shard loading.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self> {
        let mut builder = IndexBuilder::default();
        builder.add_shard("<entries>", entries)?;
        Ok(builder.finish())
    }

    /// Exact lookup. `None` means the symbol is not documented.
    pub fn get(&self, key: &str) -> Option<&[Target]> {
        self.get_entry(key).map(|entry| entry.targets.as_slice())
    }

    pub fn get_entry(&self, key: &str) -> Option<&IndexEntry> {
        self.by_key
            .get(&normalize_key(key))
            .map(|&id| &self.entries[id])
    }

    /// Case-insensitive substring search, best matches first.
    pub fn query(&self, text: &str) -> QueryResults<'_> {
        self.query_with(text, MatchMode::Substring)
    }

    /// Search with an explicit match mode.
    ///
    /// Exact matches come first, then prefix matches, then the rest. Equal
    /// ranks are ordered by key.
    pub fn query_with(&self, text: &str, mode: MatchMode) -> QueryResults<'_> {
        let needle = normalize_key(text);

        let mut hits: Vec<(MatchRank, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| {
                let rank = match_rank(&entry.key, &needle, mode)
                    .into_iter()
                    .chain(match_rank(&self.folded_names[id], &needle, mode))
                    .min()?;
                Some((rank, id))
            })
            .collect();

        hits.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| self.entries[a.1].key.cmp(&self.entries[b.1].key))
        });

        debug!(query = text, ?mode, hits = hits.len(), "symbol query");

        QueryResults {
            index: self,
            hits: hits.into_iter(),
        }
    }

    /// Entries in load order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the shards this table was built from, in load order
    pub fn shards(&self) -> &[String] {
        &self.shards
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl Default for SymbolIndex {
    fn default() -> Self {
        Self::empty()
    }
}

/// Rank of `needle` in `haystack`, both already lowercased.
pub(crate) fn match_rank(haystack: &str, needle: &str, mode: MatchMode) -> Option<MatchRank> {
    if haystack == needle {
        Some(MatchRank::Exact)
    } else if haystack.starts_with(needle) {
        Some(MatchRank::Prefix)
    } else if mode == MatchMode::Substring && haystack.contains(needle) {
        Some(MatchRank::Substring)
    } else {
        None
    }
}

/// Ranked query hits. Finite; a fresh call to `query` starts over.
pub struct QueryResults<'a> {
    index: &'a SymbolIndex,
    hits: std::vec::IntoIter<(MatchRank, usize)>,
}

impl<'a> QueryResults<'a> {
    /// Like `next`, but also reports how the entry matched.
    pub fn next_ranked(&mut self) -> Option<(MatchRank, &'a IndexEntry)> {
        self.hits
            .next()
            .map(|(rank, id)| (rank, &self.index.entries[id]))
    }
}

impl<'a> Iterator for QueryResults<'a> {
    type Item = &'a IndexEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_ranked().map(|(_, entry)| entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.hits.size_hint()
    }
}

impl ExactSizeIterator for QueryResults<'_> {}

#[derive(Default)]
struct IndexBuilder {
    entries: Vec<IndexEntry>,
    by_key: HashMap<String, usize>,
    shards: Vec<String>,
}

impl IndexBuilder {
    fn add_shard(&mut self, shard: &str, entries: Vec<IndexEntry>) -> Result<()> {
        for mut entry in entries {
            entry.key = normalize_key(entry.key.trim());
            if entry.key.is_empty() {
                return Err(IndexError::malformed(shard, "entry has an empty key"));
            }
            if entry.targets.is_empty() {
                return Err(IndexError::malformed(
                    shard,
                    format!("`{}` has no targets", entry.key),
                ));
            }

            match self.by_key.get(&entry.key) {
                Some(&existing) if self.entries[existing].targets == entry.targets => {
                    debug!(shard, key = %entry.key, "merged identical duplicate entry");
                }
                Some(_) => {
                    return Err(IndexError::DuplicateKey {
                        shard: shard.to_string(),
                        key: entry.key,
                    });
                }
                None => {
                    self.by_key.insert(entry.key.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }

        self.shards.push(shard.to_string());
        Ok(())
    }

    fn finish(self) -> SymbolIndex {
        let folded_names = self.entries.iter().map(|e| e.name.to_lowercase()).collect();
        SymbolIndex {
            entries: self.entries,
            by_key: self.by_key,
            folded_names,
            shards: self.shards,
            loaded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_index::TargetKind;

    const TABLE: &str = r#"[
        ["rewrite", [
            ["libsemigroups::RWS::rewrite(rws_word_t *w) const", "../classlibsemigroups_1_1_r_w_s.html#a1", "libsemigroups::RWS"],
            ["libsemigroups::RWS::rewrite(std::string w) const", "../classlibsemigroups_1_1_r_w_s.html#a2", "libsemigroups::RWS"]
        ]],
        ["rws", [["libsemigroups::RWS", "../classlibsemigroups_1_1_r_w_s.html", "libsemigroups"]]],
        ["rules_cbegin", [["rules_cbegin", "../classlibsemigroups_1_1_r_w_s.html#a3", "libsemigroups::RWS"]]],
        ["prewrite", [["prewrite", "../p.html#a4", "libsemigroups"]]],
        ["rank", [["libsemigroups::Blocks::rank()", "../classlibsemigroups_1_1_blocks.html#a5", "libsemigroups::Blocks"]]]
    ]"#;

    fn keys<'a>(it: impl Iterator<Item = &'a IndexEntry>) -> Vec<&'a str> {
        it.map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_get_returns_targets_in_order() {
        let index = SymbolIndex::load(TABLE).unwrap();
        let targets = index.get("rewrite").unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets[0].label.contains("rws_word_t"));
        assert!(targets[1].label.contains("std::string"));
        assert_eq!(targets[0].kind, TargetKind::Overload);
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let index = SymbolIndex::load(TABLE).unwrap();
        assert!(index.get("RWS").is_some());
        assert!(index.get("missing").is_none());
    }

    #[test]
    fn test_query_empty_returns_everything() {
        let index = SymbolIndex::load(TABLE).unwrap();
        assert_eq!(index.query("").count(), index.len());
    }

    #[test]
    fn test_query_ranking() {
        let index = SymbolIndex::load(TABLE).unwrap();
        // exact, then prefix by key, then substring
        assert_eq!(
            keys(index.query("rws")),
            vec!["rws"]
        );
        assert_eq!(
            keys(index.query("r")),
            vec!["rank", "rewrite", "rules_cbegin", "rws", "prewrite"]
        );
        assert_eq!(keys(index.query("rewrite")), vec!["rewrite", "prewrite"]);
    }

    #[test]
    fn test_query_prefix_mode_skips_substrings() {
        let index = SymbolIndex::load(TABLE).unwrap();
        assert_eq!(
            keys(index.query_with("rewrite", MatchMode::Prefix)),
            vec!["rewrite"]
        );
    }

    #[test]
    fn test_next_ranked_reports_rank() {
        let index = SymbolIndex::load(TABLE).unwrap();
        let mut results = index.query("rewrite");
        assert_eq!(results.len(), 2);
        assert_eq!(results.next_ranked().unwrap().0, MatchRank::Exact);
        assert_eq!(results.next_ranked().unwrap().0, MatchRank::Substring);
        assert!(results.next_ranked().is_none());
    }

    #[test]
    fn test_identical_duplicate_is_merged() {
        let text = r#"[
            ["rank", [["rank()", "../a.html#x", "A"]]],
            ["rank", [["rank()", "../a.html#x", "A"]]]
        ]"#;
        let index = SymbolIndex::load(text).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_conflicting_duplicate_is_rejected() {
        let text = r#"[
            ["rank", [["rank()", "../a.html#x", "A"]]],
            ["rank", [["rank()", "../b.html#y", "B"]]]
        ]"#;
        let err = SymbolIndex::load(text).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, IndexError::DuplicateKey { ref key, .. } if key == "rank"));
    }

    #[test]
    fn test_duplicates_across_shards() {
        let a = r#"[["rank", [["rank()", "../a.html#x", "A"]]]]"#;
        let b = r#"[["rank", [["rank()", "../b.html#y", "B"]]]]"#;
        let err = SymbolIndex::load_shards([("all_1.json", a), ("all_2.json", b)]).unwrap_err();
        assert!(err.to_string().contains("all_2.json"));
    }

    #[test]
    fn test_from_entries_rejects_empty_targets() {
        let entry = IndexEntry::new("x".into(), "x".into(), vec![]);
        assert!(SymbolIndex::from_entries(vec![entry]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_empty_index() {
        let index = SymbolIndex::empty();
        assert!(index.is_empty());
        assert_eq!(index.query("").count(), 0);
        assert!(index.shards().is_empty());
    }

    #[test]
    fn test_from_entries_normalizes_keys() {
        let target = Target::new("RWS", "../rws.html", "ns", TargetKind::Class);
        let entry = IndexEntry::new(" RWS ".into(), "RWS".into(), vec![target.clone()]);
        let index = SymbolIndex::from_entries(vec![entry]).unwrap();
        assert_eq!(index.entries()[0].key, "rws");
        assert_eq!(index.get("RWS"), Some(&[target][..]));
    }

    #[test]
    fn test_from_entries_rejects_case_variant_duplicates() {
        let upper = IndexEntry::new(
            "RWS".into(),
            "RWS".into(),
            vec![Target::new("RWS", "../rws.html", "ns", TargetKind::Class)],
        );
        let lower = IndexEntry::new(
            "rws".into(),
            "rws".into(),
            vec![Target::new("rws()", "../x.html#a", "ns", TargetKind::Function)],
        );
        let err = SymbolIndex::from_entries(vec![upper, lower]).unwrap_err();
        assert!(matches!(err, IndexError::DuplicateKey { ref key, .. } if key == "rws"));
    }

    #[test]
    fn test_from_entries_rejects_blank_key() {
        let entry = IndexEntry::new(
            "  ".into(),
            "x".into(),
            vec![Target::new("x", "../x.html#a", "ns", TargetKind::Function)],
        );
        assert!(SymbolIndex::from_entries(vec![entry]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_deeply_nested_shard_is_malformed() {
        let text = format!("var searchData={}", "[".repeat(20_000));
        assert!(SymbolIndex::load(&text).unwrap_err().is_malformed());
    }

    #[test]
    fn test_invalid_utf8_escape_is_malformed() {
        let err = SymbolIndex::load("var searchData=[['a_ff',['a',['../a.html#x',1,'ns']]]];")
            .unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_whitespace_query_is_not_trimmed() {
        let index = SymbolIndex::load(TABLE).unwrap();
        assert_eq!(index.query(" ").count(), 0);
        assert_eq!(keys(index.query("RANK")), vec!["rank"]);
    }
}
