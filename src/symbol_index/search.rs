//! Symbol search functionality
//!
//! Provides structured queries and result types for searching
//! the symbol index.

use serde::{Deserialize, Serialize};

use super::escape::normalize_key;
use super::index::{MatchMode, MatchRank, SymbolIndex};
use super::types::{IndexEntry, TargetKind};

/// Structured search query
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Text matched against symbol names
    pub text: String,
    pub mode: MatchMode,
    /// Keep only targets of these kinds
    pub kinds: Option<Vec<TargetKind>>,
    /// Keep only targets whose scope starts with this
    pub scope: Option<String>,
    /// Maximum results to return
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Create a simple text search query
    pub fn text(query: &str) -> Self {
        Self {
            text: query.to_string(),
            limit: Some(50),
            ..Default::default()
        }
    }

    /// Add a limit to the query
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add kind filter
    pub fn with_kinds(mut self, kinds: Vec<TargetKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Add scope filter
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }
}

/// Search result with relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched entry, narrowed to the targets that passed the filters
    pub entry: IndexEntry,
    pub rank: MatchRank,
    /// Relevance score (0.0 to 1.0)
    pub score: f32,
    /// Matched byte ranges of the display name (for highlighting)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub highlights: Vec<(usize, usize)>,
}

/// Execute a search query against the symbol index
pub fn execute_search(index: &SymbolIndex, query: &SearchQuery) -> Vec<SearchResult> {
    let limit = query.limit.unwrap_or(usize::MAX);
    let mut hits = index.query_with(&query.text, query.mode);
    let mut results = Vec::new();

    while results.len() < limit {
        let Some((rank, entry)) = hits.next_ranked() else {
            break;
        };

        let targets: Vec<_> = entry
            .targets
            .iter()
            .filter(|t| {
                query.kinds.as_ref().map_or(true, |kinds| kinds.contains(&t.kind))
                    && query
                        .scope
                        .as_ref()
                        .map_or(true, |scope| t.scope.starts_with(scope.as_str()))
            })
            .cloned()
            .collect();

        if targets.is_empty() {
            continue;
        }

        results.push(SearchResult {
            entry: IndexEntry::new(entry.key.clone(), entry.name.clone(), targets),
            rank,
            score: calculate_relevance(&entry.name, &entry.key, &query.text),
            highlights: find_highlights(&entry.name, &query.text),
        });
    }

    results
}

/// Calculate relevance score between query and symbol name
fn calculate_relevance(name: &str, key: &str, query: &str) -> f32 {
    let query_lower = normalize_key(query);
    if query_lower.is_empty() {
        return 0.5;
    }

    [name.to_lowercase(), key.to_string()]
        .iter()
        .map(|candidate| {
            if *candidate == query_lower {
                1.0
            } else if candidate.starts_with(&query_lower) {
                0.9
            } else if let Some(pos) = candidate.find(&query_lower) {
                // Earlier matches score higher
                let len = candidate.len() as f32;
                0.7 - (pos as f32 / len) * 0.3
            } else {
                0.0
            }
        })
        .fold(0.0, f32::max)
}

/// Byte ranges of case-insensitive occurrences of `query` in `name`
fn find_highlights(name: &str, query: &str) -> Vec<(usize, usize)> {
    let needle = normalize_key(query);
    if needle.is_empty() {
        return vec![];
    }

    // Lowercasing can change byte lengths; only highlight when it doesn't.
    let haystack = name.to_lowercase();
    if haystack.len() != name.len() {
        return vec![];
    }

    haystack
        .match_indices(needle.as_str())
        .map(|(start, m)| (start, start + m.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_index() -> SymbolIndex {
        SymbolIndex::load(
            r#"[
            ["rewrite", [
                ["libsemigroups::RWS::rewrite(rws_word_t *w) const", "../rws.html#a1", "libsemigroups::RWS"],
                ["libsemigroups::RWS::rewrite(std::string w) const", "../rws.html#a2", "libsemigroups::RWS"]
            ]],
            ["rws", [
                ["libsemigroups::RWS", "../rws.html", "libsemigroups"],
                ["libsemigroups::RWS::RWS()", "../rws.html#a5", "libsemigroups::RWS"]
            ]],
            ["rank", [
                ["libsemigroups::Blocks::rank()", "../blocks.html#a9", "libsemigroups::Blocks"],
                ["libsemigroups::Bipartition::rank()", "../bip.html#a8", "libsemigroups::Bipartition"]
            ]],
            ["prewrite", [["prewrite", "../p.html#a4", "libsemigroups"]]]
        ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_relevance_exact_match() {
        assert_eq!(calculate_relevance("rewrite", "rewrite", "rewrite"), 1.0);
    }

    #[test]
    fn test_relevance_prefix_match() {
        let score = calculate_relevance("rewrite", "rewrite", "rew");
        assert!(score > 0.8 && score <= 0.9);
    }

    #[test]
    fn test_relevance_contains_match() {
        let score = calculate_relevance("prewrite", "prewrite", "write");
        assert!(score > 0.4 && score < 0.7);
    }

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::text("rew")
            .with_limit(10)
            .with_kinds(vec![TargetKind::Overload])
            .with_mode(MatchMode::Prefix);

        assert_eq!(query.text, "rew");
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.mode, MatchMode::Prefix);
        assert!(query.kinds.is_some());
    }

    #[test]
    fn test_search_limit() {
        let index = test_index();
        let results = execute_search(&index, &SearchQuery::text("").with_limit(2));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_search_kind_filter_narrows_targets() {
        let index = test_index();
        let results = execute_search(
            &index,
            &SearchQuery::text("rws").with_kinds(vec![TargetKind::Class]),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.targets.len(), 1);
        assert_eq!(results[0].entry.targets[0].url, "../rws.html");
    }

    #[test]
    fn test_search_scope_filter_drops_entries() {
        let index = test_index();
        let results = execute_search(
            &index,
            &SearchQuery::text("").with_scope("libsemigroups::Blocks"),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.key, "rank");
        assert_eq!(results[0].entry.targets.len(), 1);
    }

    #[test]
    fn test_search_highlights_and_rank() {
        let index = test_index();
        let results = execute_search(&index, &SearchQuery::text("WRITE"));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry.key, "prewrite");
        assert_eq!(results[0].highlights, vec![(3, 8)]);
        assert_eq!(results[1].highlights, vec![(2, 7)]);
        assert_eq!(results[0].rank, MatchRank::Substring);
    }

    #[test]
    fn test_search_result_serializes() {
        let index = test_index();
        let results = execute_search(&index, &SearchQuery::text("rank"));
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["rank"], "exact");
        assert_eq!(json["entry"]["targets"][0]["kind"], "function");
        assert!(json.get("highlights").is_some());
    }
}
