//! Conference data loading
//!
//! Layout on disk: `<data_dir>/<conference>/<conference>*.json`. The
//! lexicographically last matching file is the current dump.

mod cache;

pub use cache::ConferenceCache;

use crate::record::Record;
use papercompass_common::errors::{AppError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory names under the data root that are never conferences
const IGNORED_DIRS: &[&str] = &["tools"];

/// Reads conference dumps from the data directory
#[derive(Debug, Clone)]
pub struct DataLoader {
    data_dir: PathBuf,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Conference names: subdirectories of the data root, sorted
    pub async fn discover_conferences(&self) -> Result<Vec<String>> {
        list_subdirs(&self.data_dir).await
    }

    /// Path of the current dump for a conference
    pub async fn latest_file(&self, conference: &str) -> Result<PathBuf> {
        validate_conference_name(conference)?;

        let conf_dir = self.data_dir.join(conference);
        if !tokio::fs::metadata(&conf_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(AppError::MissingData {
                message: format!("No data directory for conference '{}'", conference),
            });
        }

        let prefix = conference.to_string();
        let mut files = json_files(&conf_dir, |name| name.starts_with(&prefix)).await?;
        files.sort();

        files.pop().ok_or_else(|| AppError::MissingData {
            message: format!("No data file for conference '{}'", conference),
        })
    }

    /// Load and normalize one conference; every record is tagged with `source`
    pub async fn load_conference(&self, conference: &str) -> Result<Vec<Record>> {
        let path = self.latest_file(conference).await?;
        let content = tokio::fs::read_to_string(&path).await?;

        let value: Value = serde_json::from_str(&content).map_err(|e| AppError::MalformedInput {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut records = normalize(value);
        for record in &mut records {
            record.set_source(conference);
        }

        info!(
            conference = %conference,
            file = %path.display(),
            count = records.len(),
            "Loaded conference data"
        );

        Ok(records)
    }
}

/// Flatten the supported top-level shapes into a list of records.
///
/// - a list of objects
/// - an object with `categories` (each entry becomes `{category, papers}`)
/// - an object with a `data` or `records` list
///
/// Anything else yields no records. Non-object list items are skipped.
pub fn normalize(value: Value) -> Vec<Record> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(categories) = map.remove("categories") {
                let Value::Object(categories) = categories else {
                    warn!("'categories' is not an object, no records extracted");
                    return Vec::new();
                };
                debug!(count = categories.len(), "Flattening category mapping");
                return categories
                    .into_iter()
                    .map(|(category, papers)| {
                        let mut record = Record::new();
                        record.insert("category", category);
                        record.insert("papers", papers);
                        record
                    })
                    .collect();
            }

            match (map.remove("data"), map.remove("records")) {
                (Some(Value::Array(items)), _) => items,
                (_, Some(Value::Array(items))) => items,
                _ => {
                    warn!("No record list found in object, no records extracted");
                    return Vec::new();
                }
            }
        }
        _ => {
            warn!("Top-level JSON value is neither a list nor an object");
            return Vec::new();
        }
    };

    records_from_values(items)
}

/// Keep the object items, skipping everything else with a warning
pub fn records_from_values(items: Vec<Value>) -> Vec<Record> {
    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match Record::try_from(item) {
            Ok(record) => Some(record),
            Err(other) => {
                warn!(item = %other, "Skipping non-object entry");
                None
            }
        })
        .collect();

    if records.len() < total {
        debug!(kept = records.len(), total, "Skipped invalid entries");
    }

    records
}

/// Reject names that would escape the data root
pub fn validate_conference_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..");

    if invalid {
        return Err(AppError::Validation {
            message: format!("Invalid conference name '{}'", name),
            field: Some("conference".to_string()),
        });
    }

    Ok(())
}

/// Sorted subdirectory names, skipping hidden and ignored ones.
/// A missing root yields an empty list.
pub(crate) async fn list_subdirs(root: &Path) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(dir = %root.display(), "Directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || IGNORED_DIRS.contains(&name.as_str()) {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// `.json` files in `dir` whose file name passes `accept`
pub(crate) async fn json_files(dir: &Path, accept: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") && accept(&name) && entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }

    Ok(files)
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::Value;
    use std::path::Path;

    /// Write `value` to `<root>/<conference>/<file>`
    pub fn write_json(root: &Path, conference: &str, file: &str, value: &Value) {
        let dir = root.join(conference);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), serde_json::to_string(value).unwrap()).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::write_json;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_shapes() {
        let list = normalize(json!([{ "id": 1 }, "junk", { "id": 2 }]));
        assert_eq!(list.len(), 2);

        let data = normalize(json!({ "data": [{ "id": 1 }] }));
        assert_eq!(data.len(), 1);

        let records = normalize(json!({ "records": [{ "id": 1 }, { "id": 2 }] }));
        assert_eq!(records.len(), 2);

        let categories = normalize(json!({ "categories": { "NLP": ["p1", "p2"] } }));
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].get("category"), Some(&json!("NLP")));
        assert_eq!(categories[0].get("papers"), Some(&json!(["p1", "p2"])));

        assert!(normalize(json!({ "something": 1 })).is_empty());
        assert!(normalize(json!(42)).is_empty());
    }

    #[tokio::test]
    async fn test_discover_conferences() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["nips", "iclr", "tools", ".git"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("README.md"), "x").unwrap();

        let loader = DataLoader::new(dir.path());
        assert_eq!(loader.discover_conferences().await.unwrap(), vec!["iclr", "nips"]);

        let missing = DataLoader::new(dir.path().join("nope"));
        assert!(missing.discover_conferences().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_uses_latest_file_and_tags_source() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "iclr", "iclr2024.json", &json!([{ "id": "old" }]));
        write_json(dir.path(), "iclr", "iclr2025.json", &json!([{ "id": "a" }, { "id": "b" }]));
        write_json(dir.path(), "iclr", "other.json", &json!([{ "id": "ignored" }]));

        let loader = DataLoader::new(dir.path());
        let records = loader.load_conference("iclr").await.unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source() == Some("iclr")));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();
        let bad = dir.path().join("bad");
        std::fs::create_dir_all(&bad).unwrap();
        std::fs::write(bad.join("bad2025.json"), "{ not json").unwrap();

        let loader = DataLoader::new(dir.path());
        assert!(matches!(loader.load_conference("absent").await, Err(AppError::MissingData { .. })));
        assert!(matches!(loader.load_conference("empty").await, Err(AppError::MissingData { .. })));
        assert!(matches!(loader.load_conference("bad").await, Err(AppError::MalformedInput { .. })));
        assert!(matches!(loader.load_conference("../etc").await, Err(AppError::Validation { .. })));
    }
}
