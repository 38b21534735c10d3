//! Record preprocessing for the model panel

use crate::loader::records_from_values;
use crate::record::{fields, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

const AUGMENTED_SUFFIX: &str = " (Augmented)";

/// Keep only object-shaped items
pub fn validate_records(items: Vec<Value>) -> Vec<Record> {
    let records = records_from_values(items);
    info!(count = records.len(), "Records validated");
    records
}

/// Add `title_length` (characters) and `keyword_count` (comma-separated parts) to each record
pub fn extract_features(records: &mut [Record]) {
    for record in records.iter_mut() {
        let title_length = record.field_text(fields::TITLE).map(|t| t.chars().count()).unwrap_or(0);
        let keyword_count = record
            .field_text(fields::KEYWORDS)
            .unwrap_or_default()
            .split(',')
            .count();

        record.insert("title_length", title_length);
        record.insert("keyword_count", keyword_count);
    }

    info!(count = records.len(), "Features extracted");
}

/// Originals followed by a copy of each with a marked title
pub fn augment(records: Vec<Record>) -> Vec<Record> {
    let copies: Vec<Record> = records
        .iter()
        .map(|record| {
            let mut copy = record.clone();
            let title = record.field_text(fields::TITLE).unwrap_or_default();
            copy.insert(fields::TITLE, format!("{}{}", title, AUGMENTED_SUFFIX));
            copy
        })
        .collect();

    info!(count = copies.len(), "Augmented records generated");

    let mut all = records;
    all.extend(copies);
    all
}

/// Field coverage summary
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityReport {
    pub total_records: usize,
    /// For every field seen, the number of records lacking it
    pub missing_fields: BTreeMap<String, usize>,
}

pub fn quality_report(records: &[Record]) -> QualityReport {
    if records.is_empty() {
        warn!("No records, empty quality report");
        return QualityReport::default();
    }

    let mut present: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        for key in record.keys() {
            *present.entry(key.clone()).or_default() += 1;
        }
    }

    let total = records.len();
    QualityReport {
        total_records: total,
        missing_fields: present.into_iter().map(|(k, n)| (k, total - n)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record;
    use serde_json::json;

    #[test]
    fn test_features() {
        let mut records = vec![
            record(json!({ "title": "Héllo", "keywords": "a, b, c" })),
            record(json!({ "id": 2 })),
        ];
        extract_features(&mut records);

        assert_eq!(records[0].get("title_length"), Some(&json!(5)));
        assert_eq!(records[0].get("keyword_count"), Some(&json!(3)));
        assert_eq!(records[1].get("title_length"), Some(&json!(0)));
        assert_eq!(records[1].get("keyword_count"), Some(&json!(1)));
    }

    #[test]
    fn test_augment_doubles() {
        let records = vec![record(json!({ "title": "A" })), record(json!({ "id": 1 }))];
        let augmented = augment(records);

        assert_eq!(augmented.len(), 4);
        assert_eq!(augmented[0].title(), Some("A"));
        assert_eq!(augmented[2].title(), Some("A (Augmented)"));
        assert_eq!(augmented[3].title(), Some(" (Augmented)"));
    }

    #[test]
    fn test_quality_report() {
        assert_eq!(quality_report(&[]), QualityReport::default());

        let records = validate_records(vec![
            json!({ "id": 1, "title": "T" }),
            json!({ "id": 2 }),
            json!("not a record"),
        ]);
        let report = quality_report(&records);

        assert_eq!(report.total_records, 2);
        assert_eq!(report.missing_fields["id"], 0);
        assert_eq!(report.missing_fields["title"], 1);
    }
}
