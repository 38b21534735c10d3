//! Status exclusion and keyword matching
//!
//! Matching is case-insensitive substring containment of each query token
//! in the text of each requested field. Results keep input order; there is
//! no ranking.

use crate::record::Record;
use papercompass_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statuses dropped unless rejected papers are requested
pub const EXCLUDED_STATUSES: [&str; 3] = ["Withdraw", "Reject", "Desk Reject"];

/// Fields searched when expansion is on and the caller picked none
pub const DEFAULT_FIELDS: &[&str] = &["title", "abstract", "keywords", "primary_area"];

/// How multiple tokens combine
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SearchMode {
    /// Any token in any field
    #[default]
    #[serde(rename = "OR", alias = "or")]
    Or,
    /// Every token in at least one field
    #[serde(rename = "AND", alias = "and")]
    And,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Or => "OR",
            SearchMode::And => "AND",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a query on commas and whitespace, dropping empty pieces
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_excluded_status(record: &Record) -> bool {
    record
        .status()
        .map(|status| EXCLUDED_STATUSES.contains(&status))
        .unwrap_or(false)
}

/// All records, or those whose status is not excluded
pub fn filter_by_status(records: &[Record], include_rejected: bool) -> Vec<&Record> {
    records
        .iter()
        .filter(|record| include_rejected || !is_excluded_status(record))
        .collect()
}

/// A validated keyword query
#[derive(Debug, Clone)]
pub struct KeywordQuery {
    tokens: Vec<String>,
    fields: Vec<String>,
    mode: SearchMode,
}

impl KeywordQuery {
    /// Build a query from raw input.
    ///
    /// `Ok(None)` when there are neither tokens nor fields (no keyword
    /// filtering). Tokens without fields, or fields without tokens, is a
    /// configuration error.
    pub fn parse(query: &str, fields: &[String], mode: SearchMode) -> Result<Option<Self>> {
        let tokens = tokenize(query);

        match (tokens.is_empty(), fields.is_empty()) {
            (true, true) => Ok(None),
            (false, true) => Err(AppError::SearchConfiguration {
                message: "Select at least one field to search".to_string(),
            }),
            (true, false) => Err(AppError::SearchConfiguration {
                message: "Enter at least one keyword".to_string(),
            }),
            (false, false) => Ok(Some(Self {
                tokens: tokens.iter().map(|t| t.to_lowercase()).collect(),
                fields: fields.to_vec(),
                mode,
            })),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn matches(&self, record: &Record) -> bool {
        let texts: Vec<String> = self
            .fields
            .iter()
            .filter_map(|field| record.field_text(field))
            .map(|text| text.to_lowercase())
            .collect();

        let token_hits = |token: &String| texts.iter().any(|text| text.contains(token.as_str()));

        match self.mode {
            SearchMode::Or => self.tokens.iter().any(token_hits),
            SearchMode::And => self.tokens.iter().all(token_hits),
        }
    }

    pub fn filter<'a>(&self, records: &[&'a Record]) -> Vec<&'a Record> {
        records.iter().copied().filter(|record| self.matches(record)).collect()
    }
}

/// Status-filtered set and the keyword-matched subset of it
#[derive(Debug)]
pub struct FilterResult<'a> {
    pub status_filtered: Vec<&'a Record>,
    pub matched: Vec<&'a Record>,
}

/// Apply status exclusion then keyword matching.
///
/// Configuration errors are reported before anything is filtered.
pub fn filter_records<'a>(
    records: &'a [Record],
    query: &str,
    fields: &[String],
    mode: SearchMode,
    include_rejected: bool,
) -> Result<FilterResult<'a>> {
    let keyword_query = KeywordQuery::parse(query, fields, mode)?;
    let status_filtered = filter_by_status(records, include_rejected);

    let matched = match &keyword_query {
        Some(keyword_query) => keyword_query.filter(&status_filtered),
        None => status_filtered.clone(),
    };

    Ok(FilterResult {
        status_filtered,
        matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record;
    use serde_json::json;

    fn corpus() -> Vec<Record> {
        vec![
            record(json!({ "id": 1, "title": "Dense Passage Indexing", "abstract": "We study indexing at scale.", "status": "Poster" })),
            record(json!({ "id": 2, "title": "Planning with LLMs", "abstract": "An Agent that plans.", "status": "Oral" })),
            record(json!({ "id": 3, "title": "Vision Transformers", "abstract": "Images.", "status": "Reject" })),
        ]
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("retrieval agent"), vec!["retrieval", "agent"]);
        assert_eq!(tokenize(" retrieval,,agent , "), vec!["retrieval", "agent"]);
        assert!(tokenize(" , ").is_empty());
    }

    #[test]
    fn test_status_exclusion() {
        let records = corpus();
        assert_eq!(filter_by_status(&records, false).len(), 2);
        assert_eq!(filter_by_status(&records, true).len(), 3);

        // Only exact matches are excluded
        let lower = vec![record(json!({ "status": "reject" })), record(json!({ "status": "Desk Reject" }))];
        assert_eq!(filter_by_status(&lower, false).len(), 1);
    }

    #[test]
    fn test_status_exclusion_is_idempotent() {
        let records = corpus();
        let once: Vec<Record> = filter_by_status(&records, false).into_iter().cloned().collect();
        let twice = filter_by_status(&once, false);
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_or_mode_single_match() {
        let records = corpus();
        let result =
            filter_records(&records, "retrieval agent", &fields(&["title", "abstract"]), SearchMode::Or, false)
                .unwrap();

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].get("id"), Some(&json!(2)));
    }

    #[test]
    fn test_and_mode_requires_every_token() {
        let records = corpus();
        let result =
            filter_records(&records, "retrieval agent", &fields(&["title", "abstract"]), SearchMode::And, true)
                .unwrap();
        assert!(result.matched.is_empty());
        assert_eq!(result.status_filtered.len(), 3);
    }

    #[test]
    fn test_and_is_subset_of_or() {
        let records = corpus();
        let fields = fields(&["title", "abstract"]);
        for query in ["plan agent", "indexing", "the a", "images vision", "scale dense"] {
            let or = filter_records(&records, query, &fields, SearchMode::Or, true).unwrap().matched;
            let and = filter_records(&records, query, &fields, SearchMode::And, true).unwrap().matched;
            assert!(and.iter().all(|r| or.iter().any(|o| std::ptr::eq(*o, *r))), "query {}", query);
        }
    }

    #[test]
    fn test_configuration_errors() {
        let records = corpus();
        assert!(matches!(
            filter_records(&records, "agent", &[], SearchMode::Or, false),
            Err(AppError::SearchConfiguration { .. })
        ));
        assert!(matches!(
            filter_records(&records, " ", &fields(&["title"]), SearchMode::Or, false),
            Err(AppError::SearchConfiguration { .. })
        ));

        let unfiltered = filter_records(&records, "", &[], SearchMode::And, false).unwrap();
        assert_eq!(unfiltered.matched.len(), unfiltered.status_filtered.len());
    }

    #[test]
    fn test_absent_fields_and_lists() {
        let records = vec![
            record(json!({ "title": null, "keywords": ["Graph Learning", "GNN"] })),
            record(json!({ "keywords": "graph, learning" })),
        ];
        let result = filter_records(&records, "gnn", &fields(&["title", "keywords"]), SearchMode::Or, false).unwrap();
        assert_eq!(result.matched.len(), 1);
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_value(SearchMode::And).unwrap(), json!("AND"));
        assert_eq!(serde_json::from_value::<SearchMode>(json!("or")).unwrap(), SearchMode::Or);
    }
}
