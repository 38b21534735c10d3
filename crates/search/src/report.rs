//! Search counts and the downloadable export document

use crate::record::Record;
use papercompass_common::errors::Result;
use serde::{Deserialize, Serialize};

/// Sizes of the three stages of a search
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchCounts {
    pub total_papers: usize,
    pub papers_after_status_filter: usize,
    pub matching_results: usize,
}

impl SearchCounts {
    /// Counts from the loaded, status-filtered and final sets.
    ///
    /// Each stage is a subset of the previous one.
    pub fn new(total: usize, status_filtered: usize, matching: usize) -> Self {
        debug_assert!(matching <= status_filtered && status_filtered <= total);

        Self {
            total_papers: total,
            papers_after_status_filter: status_filtered,
            matching_results: matching,
        }
    }
}

/// Export artifact: counts plus the full matching records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    #[serde(flatten)]
    pub counts: SearchCounts,
    pub filtered_papers: Vec<Record>,
}

impl ExportDocument {
    pub fn new(counts: SearchCounts, filtered_papers: Vec<Record>) -> Self {
        Self {
            counts,
            filtered_papers,
        }
    }

    /// Pretty-printed JSON; non-ASCII text is written as is
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Suggested download name: `filtered_results-<source>[-<keyword>].json`.
///
/// Anything other than alphanumerics, `-`, `_` and `.` becomes `_`, so the
/// name is always a valid quoted `Content-Disposition` parameter.
pub fn export_filename(source: &str, keyword: &str) -> String {
    let mut name = format!("filtered_results-{}", filename_safe(source));

    if !keyword.is_empty() {
        name.push('-');
        name.push_str(&filename_safe(keyword));
    }

    name.push_str(".json");
    name
}

fn filename_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}
