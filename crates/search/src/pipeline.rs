//! Request-scoped search pipeline
//!
//! load (memoized per conference) -> status + keyword filter -> key-field
//! facet -> category facet -> counts

use crate::catalog::{Categories, CatalogStore};
use crate::facets::{
    apply_category_filters, apply_key_field_filters, describe_category_selection,
    describe_key_field_filters, CategorySelection, KeyFieldFilters,
};
use crate::filter::{filter_records, tokenize, KeywordQuery, SearchMode, DEFAULT_FIELDS};
use crate::loader::ConferenceCache;
use crate::record::{fields, Record};
use crate::report::{export_filename, ExportDocument, SearchCounts};
use papercompass_common::errors::{AppError, Result};
use papercompass_common::expansion::{expand_keywords, KeywordExpander};
use papercompass_common::metrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use validator::Validate;

/// Fields shown when the caller does not ask for every field
pub const DISPLAY_FIELDS: &[&str] = &[
    "title", "status", "track", "abstract", "site", "keywords", "primary_area", "award", "source", "id",
];

/// Which papers a search runs over
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DataSource {
    /// Every discovered conference
    AllPapers,
    /// The listed conferences; enables faceting
    Conferences { conferences: Vec<String> },
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::AllPapers => "all_papers",
            DataSource::Conferences { .. } => "conferences",
        }
    }
}

/// Everything one search needs, built per request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchContext {
    /// Free-text query as typed
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub keyword: String,
    #[serde(default)]
    pub search_mode: SearchMode,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub fields: Vec<String>,
    #[serde(default)]
    pub include_rejected: bool,
    #[serde(default)]
    pub show_all_fields: bool,
    /// Turn the query into keywords with the expansion endpoint
    #[serde(default)]
    pub use_nl: bool,
    pub data_source: DataSource,
    #[serde(default)]
    pub key_field_filters: KeyFieldFilters,
    #[serde(default)]
    pub categories: CategorySelection,
}

/// Result of a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub counts: SearchCounts,
    /// Data-source descriptor, e.g. `acl+iclr` or `All Papers (acl, iclr)`
    pub source: String,
    /// Keywords actually matched
    pub keywords: String,
    /// Fields actually searched
    pub fields: Vec<String>,
    pub notices: Vec<String>,
    #[serde(skip)]
    pub matches: Vec<Record>,
}

impl SearchOutcome {
    /// Matches as shown to the caller
    pub fn displayed(&self, show_all_fields: bool) -> Vec<Record> {
        if show_all_fields {
            self.matches.clone()
        } else {
            self.matches.iter().map(|r| r.project(DISPLAY_FIELDS)).collect()
        }
    }

    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::new(self.counts, self.matches.clone())
    }

    pub fn export_filename(&self) -> String {
        export_filename(&self.source, &self.keywords)
    }
}

struct LoadedData {
    records: Vec<Record>,
    source: String,
    notices: Vec<String>,
}

/// Runs searches against the conference data
pub struct SearchEngine {
    cache: Arc<ConferenceCache>,
    catalogs: CatalogStore,
}

impl SearchEngine {
    pub fn new(cache: Arc<ConferenceCache>, catalogs: CatalogStore) -> Self {
        Self { cache, catalogs }
    }

    pub fn cache(&self) -> &ConferenceCache {
        &self.cache
    }

    pub fn catalogs(&self) -> &CatalogStore {
        &self.catalogs
    }

    /// Conferences available for searching
    pub async fn conferences(&self) -> Result<Vec<String>> {
        self.cache.loader().discover_conferences().await
    }

    /// Run a search; no state is touched when the parameters contradict each other
    pub async fn search(
        &self,
        ctx: &SearchContext,
        expander: Option<&dyn KeywordExpander>,
    ) -> Result<SearchOutcome> {
        ctx.validate()?;

        let started = Instant::now();
        let mut notices = Vec::new();

        let (keywords, search_fields) = if ctx.use_nl {
            let expansion = expand_keywords(expander, &ctx.keyword).await;
            if let Some(notice) = expansion.notice {
                notices.push(notice);
            }
            if !expansion.keywords.is_empty() {
                notices.push(format!("Generated keywords: {}", expansion.keywords));
            }
            (expansion.keywords, expanded_fields(&ctx.fields))
        } else {
            (ctx.keyword.clone(), ctx.fields.clone())
        };

        // Fail on contradictory input before reading anything
        KeywordQuery::parse(&keywords, &search_fields, ctx.search_mode)?;
        if let DataSource::Conferences { conferences } = &ctx.data_source {
            if conferences.is_empty() {
                return Err(AppError::SearchConfiguration {
                    message: "Select at least one conference".to_string(),
                });
            }
        }

        notices.push(describe_keywords(&keywords, ctx.search_mode));

        let loaded = self.load(&ctx.data_source).await?;
        notices.extend(loaded.notices);

        let filtered = filter_records(
            &loaded.records,
            &keywords,
            &search_fields,
            ctx.search_mode,
            ctx.include_rejected,
        )?;

        let mut matched = filtered.matched;
        if let DataSource::Conferences { .. } = &ctx.data_source {
            notices.extend(describe_key_field_filters(&ctx.key_field_filters));
            notices.extend(describe_category_selection(&ctx.categories));

            matched = apply_key_field_filters(matched, &ctx.key_field_filters);

            let catalogs = self.category_catalogs(&ctx.categories, &mut notices).await;
            matched = apply_category_filters(matched, &ctx.categories, &catalogs);
        }

        let counts = SearchCounts::new(loaded.records.len(), filtered.status_filtered.len(), matched.len());
        let matches: Vec<Record> = matched.into_iter().cloned().collect();

        metrics::record_search(started.elapsed().as_secs_f64(), ctx.search_mode.as_str(), matches.len());
        info!(
            source = %loaded.source,
            total = counts.total_papers,
            matching = counts.matching_results,
            "Search completed"
        );

        Ok(SearchOutcome {
            counts,
            source: loaded.source,
            keywords,
            fields: search_fields,
            notices,
            matches,
        })
    }

    async fn load(&self, data_source: &DataSource) -> Result<LoadedData> {
        let mut records = Vec::new();
        let mut notices = Vec::new();

        match data_source {
            DataSource::AllPapers => {
                let mut loaded = Vec::new();
                for conference in self.conferences().await? {
                    match self.cache.get(&conference).await {
                        Ok(data) => {
                            records.extend(data.iter().cloned());
                            loaded.push(conference);
                        }
                        Err(e) => {
                            warn!(conference = %conference, error = %e, "Skipping conference");
                            notices.push(format!("Skipped {}: {}", conference, e));
                        }
                    }
                }

                if loaded.is_empty() {
                    return Err(AppError::MissingData {
                        message: "No conference data could be loaded".to_string(),
                    });
                }

                notices.push(format!("Loaded {} papers from {} conferences", records.len(), loaded.len()));
                Ok(LoadedData {
                    records,
                    source: format!("All Papers ({})", loaded.join(", ")),
                    notices,
                })
            }
            DataSource::Conferences { conferences } => {
                for conference in conferences {
                    match self.cache.get(conference).await {
                        Ok(data) => records.extend(data.iter().cloned()),
                        Err(AppError::MalformedInput { path, message }) => {
                            warn!(conference = %conference, path = %path, error = %message, "Unreadable conference data");
                            notices.push(format!("Could not parse data for {}, treated as empty", conference));
                        }
                        Err(e) => return Err(e),
                    }
                }

                Ok(LoadedData {
                    records,
                    source: conferences.join("+"),
                    notices,
                })
            }
        }
    }

    /// Category catalogs for the conferences with a selection
    async fn category_catalogs(
        &self,
        selection: &CategorySelection,
        notices: &mut Vec<String>,
    ) -> HashMap<String, Categories> {
        let mut catalogs = HashMap::new();

        for (conference, selected) in selection {
            if selected.is_empty() {
                continue;
            }
            match self.catalogs.categories(conference, None).await {
                Ok(categories) if !categories.is_empty() => {
                    catalogs.insert(conference.clone(), categories);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(conference = %conference, error = %e, "Category catalog unavailable");
                    notices.push(format!("Category filter for {} ignored: {}", conference, e));
                }
            }
        }

        catalogs
    }
}

/// Caller's fields (or the defaults) plus `full_text`
pub fn expanded_fields(selected: &[String]) -> Vec<String> {
    let mut searched: Vec<String> = if selected.is_empty() {
        DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
    } else {
        selected.to_vec()
    };

    if !searched.iter().any(|f| f == fields::FULL_TEXT) {
        searched.push(fields::FULL_TEXT.to_string());
    }

    searched
}

fn describe_keywords(keywords: &str, mode: SearchMode) -> String {
    let tokens = tokenize(keywords);
    match (tokens.len(), mode) {
        (0, _) => "No keywords entered, showing every paper that passes the filters".to_string(),
        (1, _) => format!("Papers containing: {}", tokens[0]),
        (_, SearchMode::Or) => format!("Papers containing any of: {}", tokens.join(", ")),
        (_, SearchMode::And) => format!("Papers containing all of: {}", tokens.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_support::write_json;
    use crate::loader::DataLoader;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct Fixture {
        _data: tempfile::TempDir,
        _catalogs: tempfile::TempDir,
        engine: SearchEngine,
    }

    fn fixture() -> Fixture {
        let data = tempfile::tempdir().unwrap();
        let catalogs = tempfile::tempdir().unwrap();

        write_json(data.path(), "acl", "acl2025.json", &json!([
            { "id": "a1", "title": "Retrieval Agents", "abstract": "Tools.", "status": "Oral", "award": true, "authors": "X" },
            { "id": "a2", "title": "Speech", "abstract": "An agent that listens.", "status": "Poster", "award": false },
            { "id": "a3", "title": "Withdrawn work", "abstract": "agent", "status": "Withdraw" }
        ]));
        write_json(data.path(), "iclr", "iclr2025.json", &json!({ "data": [
            { "id": 1, "title": "Diffusion", "abstract": "Images.", "status": "Poster" }
        ]}));
        write_json(catalogs.path(), "acl", "acl2025.json", &json!({
            "status": ["Oral", "Poster"],
            "categories": { "Speech": ["a2"] }
        }));

        let cache = Arc::new(ConferenceCache::new(DataLoader::new(data.path())));
        let engine = SearchEngine::new(cache, CatalogStore::new(catalogs.path()));

        Fixture { _data: data, _catalogs: catalogs, engine }
    }

    fn context(data_source: DataSource) -> SearchContext {
        SearchContext {
            keyword: String::new(),
            search_mode: SearchMode::Or,
            fields: Vec::new(),
            include_rejected: false,
            show_all_fields: false,
            use_nl: false,
            data_source,
            key_field_filters: KeyFieldFilters::new(),
            categories: CategorySelection::new(),
        }
    }

    fn acl() -> DataSource {
        DataSource::Conferences { conferences: vec!["acl".into()] }
    }

    #[tokio::test]
    async fn test_all_papers_without_keywords() {
        let f = fixture();
        let outcome = f.engine.search(&context(DataSource::AllPapers), None).await.unwrap();

        assert_eq!(outcome.counts, SearchCounts::new(4, 3, 3));
        assert_eq!(outcome.source, "All Papers (acl, iclr)");
    }

    #[tokio::test]
    async fn test_keyword_search_and_display() {
        let f = fixture();
        let mut ctx = context(acl());
        ctx.keyword = "agent".into();
        ctx.fields = vec!["abstract".into()];

        let outcome = f.engine.search(&ctx, None).await.unwrap();
        assert_eq!(outcome.counts, SearchCounts::new(3, 2, 1));
        assert_eq!(outcome.source, "acl");

        let shown = outcome.displayed(false);
        assert!(!shown[0].contains("authors") && shown[0].contains("source"));
        assert_eq!(outcome.export_filename(), "filtered_results-acl-agent.json");
    }

    #[tokio::test]
    async fn test_facets_apply_to_conference_mode() {
        let f = fixture();
        let mut ctx = context(DataSource::Conferences { conferences: vec!["acl".into(), "iclr".into()] });
        ctx.key_field_filters = BTreeMap::from([(
            "award".to_string(),
            BTreeMap::from([("acl".to_string(), vec![json!("True")])]),
        )]);

        let outcome = f.engine.search(&ctx, None).await.unwrap();
        let ids: Vec<_> = outcome.matches.iter().filter_map(|r| r.id().cloned()).collect();
        assert_eq!(ids, vec![json!("a1"), json!(1)]);
        assert_eq!(outcome.source, "acl+iclr");

        let mut ctx = context(acl());
        ctx.categories = BTreeMap::from([("acl".to_string(), vec!["Speech".to_string()])]);
        let outcome = f.engine.search(&ctx, None).await.unwrap();
        assert_eq!(outcome.counts.matching_results, 1);
        assert!(outcome.notices.iter().any(|n| n.starts_with("Category filters")));
    }

    #[tokio::test]
    async fn test_facets_ignored_for_all_papers() {
        let f = fixture();
        let mut ctx = context(DataSource::AllPapers);
        ctx.categories = BTreeMap::from([("acl".to_string(), vec!["Speech".to_string()])]);

        let outcome = f.engine.search(&ctx, None).await.unwrap();
        assert_eq!(outcome.counts.matching_results, 3);
    }

    #[tokio::test]
    async fn test_configuration_and_missing_data_errors() {
        let f = fixture();

        let mut ctx = context(acl());
        ctx.keyword = "agent".into();
        assert!(matches!(f.engine.search(&ctx, None).await, Err(AppError::SearchConfiguration { .. })));

        let ctx = context(DataSource::Conferences { conferences: vec![] });
        assert!(matches!(f.engine.search(&ctx, None).await, Err(AppError::SearchConfiguration { .. })));

        let ctx = context(DataSource::Conferences { conferences: vec!["cvpr".into()] });
        assert!(matches!(f.engine.search(&ctx, None).await, Err(AppError::MissingData { .. })));
    }

    #[tokio::test]
    async fn test_expansion_fallback_widens_fields() {
        let f = fixture();
        let mut ctx = context(acl());
        ctx.keyword = "Speech".into();
        ctx.use_nl = true;

        let outcome = f.engine.search(&ctx, None).await.unwrap();
        assert_eq!(outcome.keywords, "speech");
        assert_eq!(outcome.fields.last().map(String::as_str), Some("full_text"));
        assert_eq!(outcome.counts.matching_results, 1);
    }

    #[tokio::test]
    async fn test_counts_invariant_and_export_round_trip() {
        let f = fixture();
        let mut ctx = context(DataSource::AllPapers);
        ctx.keyword = "agent, images".into();
        ctx.fields = vec!["title".into(), "abstract".into()];
        ctx.include_rejected = true;

        let outcome = f.engine.search(&ctx, None).await.unwrap();
        let c = outcome.counts;
        assert!(c.matching_results <= c.papers_after_status_filter && c.papers_after_status_filter <= c.total_papers);

        let document = outcome.export_document();
        let parsed = ExportDocument::from_json(&document.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed.counts, c);
        assert_eq!(parsed.filtered_papers, outcome.matches);
    }

    #[tokio::test]
    async fn test_oversized_query_rejected() {
        let f = fixture();

        let mut ctx = context(acl());
        ctx.keyword = "agent ".repeat(200);
        ctx.fields = vec!["title".into()];
        assert!(matches!(f.engine.search(&ctx, None).await, Err(AppError::Validation { .. })));

        let mut ctx = context(acl());
        ctx.keyword = "agent".into();
        ctx.fields = vec!["title".to_string(); 33];
        let err = f.engine.search(&ctx, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref name), .. } if name == "fields"));
        assert_eq!(f.engine.cache().len().await, 0);
    }

    #[test]
    fn test_expanded_fields() {
        assert_eq!(expanded_fields(&[]), vec!["title", "abstract", "keywords", "primary_area", "full_text"]);
        assert_eq!(expanded_fields(&["full_text".into()]), vec!["full_text"]);
    }

    #[test]
    fn test_context_deserializes() {
        let ctx: SearchContext = serde_json::from_value(json!({
            "keyword": "agent",
            "search_mode": "AND",
            "fields": ["title"],
            "data_source": { "mode": "conferences", "conferences": ["acl"] },
            "key_field_filters": { "status": { "acl": ["Oral"] } }
        }))
        .unwrap();

        assert_eq!(ctx.search_mode, SearchMode::And);
        assert_eq!(ctx.data_source, acl());
        assert!(!ctx.use_nl);
    }
}
