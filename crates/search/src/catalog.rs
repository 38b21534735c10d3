//! Key-field and category catalogs
//!
//! One precomputed JSON file per conference and year under
//! `<key_infos_dir>/<conference>/`, mapping each key field to its sorted
//! distinct values. An optional `categories` entry maps research-area names
//! to paper id lists.

use crate::loader::{json_files, list_subdirs, validate_conference_name};
use crate::record::fields;
use papercompass_common::errors::{AppError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Field name to allowed values
pub type KeyFields = BTreeMap<String, Vec<Value>>;

/// Category name to the ids of its papers
pub type Categories = BTreeMap<String, Vec<Value>>;

const CATEGORIES_KEY: &str = "categories";

/// Read access to the key-field catalog directory
#[derive(Debug, Clone)]
pub struct CatalogStore {
    root: PathBuf,
}

impl CatalogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Conferences that have a catalog directory
    pub async fn conferences(&self) -> Result<Vec<String>> {
        list_subdirs(&self.root).await
    }

    /// Catalog file for a conference: the first whose name contains `year`,
    /// else the lexicographically last one
    pub async fn catalog_file(&self, conference: &str, year: Option<&str>) -> Result<Option<PathBuf>> {
        validate_conference_name(conference)?;

        let conf_dir = self.root.join(conference);
        if !tokio::fs::metadata(&conf_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            warn!(conference = %conference, "No catalog directory");
            return Ok(None);
        }

        let mut files = json_files(&conf_dir, |_| true).await?;
        files.sort();

        if let Some(year) = year.filter(|y| !y.is_empty()) {
            let by_year = files.iter().find(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().contains(year))
                    .unwrap_or(false)
            });
            if let Some(path) = by_year {
                return Ok(Some(path.clone()));
            }
        }

        Ok(files.pop())
    }

    async fn read_catalog(&self, conference: &str, year: Option<&str>) -> Result<Map<String, Value>> {
        let Some(path) = self.catalog_file(conference, year).await? else {
            return Ok(Map::new());
        };

        let content = tokio::fs::read_to_string(&path).await?;
        match serde_json::from_str(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::MalformedInput {
                path: path.display().to_string(),
                message: "catalog is not a JSON object".to_string(),
            }),
            Err(e) => Err(AppError::MalformedInput {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Key fields of a conference, without `categories` and with `award`
    /// values stringified (`true` becomes `"True"`)
    pub async fn key_fields(&self, conference: &str, year: Option<&str>) -> Result<KeyFields> {
        let mut catalog = self.read_catalog(conference, year).await?;
        catalog.remove(CATEGORIES_KEY);

        Ok(catalog
            .into_iter()
            .map(|(field, values)| {
                let values = match values {
                    Value::Array(values) => values,
                    Value::Null => Vec::new(),
                    other => vec![other],
                };
                let values = if field == fields::AWARD {
                    values.iter().map(|v| Value::String(display_value(v))).collect()
                } else {
                    values
                };
                (field, values)
            })
            .collect())
    }

    /// Category mapping of a conference; empty when the catalog has none
    pub async fn categories(&self, conference: &str, year: Option<&str>) -> Result<Categories> {
        let mut catalog = self.read_catalog(conference, year).await?;

        match catalog.remove(CATEGORIES_KEY) {
            Some(Value::Object(categories)) => Ok(categories
                .into_iter()
                .map(|(name, ids)| match ids {
                    Value::Array(ids) => (name, ids),
                    other => (name, vec![other]),
                })
                .collect()),
            _ => Ok(Categories::new()),
        }
    }

    /// Years with a catalog: the digits of each catalog file name, sorted
    pub async fn years(&self, conference: &str) -> Result<Vec<String>> {
        validate_conference_name(conference)?;

        let conf_dir = self.root.join(conference);
        if !tokio::fs::metadata(&conf_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut years: Vec<String> = json_files(&conf_dir, |_| true)
            .await?
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|digits| !digits.is_empty())
            .collect();

        years.sort();
        Ok(years)
    }
}

/// Display form used for stringified catalog values
fn display_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => crate::record::value_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_support::write_json;
    use serde_json::json;

    fn catalog() -> Value {
        json!({
            "status": ["Oral", "Poster"],
            "award": [false, true],
            "categories": { "NLP": ["p1", "p2"], "Vision": [3] }
        })
    }

    #[tokio::test]
    async fn test_key_fields_strip_categories_and_stringify_award() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "acl", "acl2025.json", &catalog());

        let store = CatalogStore::new(dir.path());
        let key_fields = store.key_fields("acl", None).await.unwrap();

        assert!(!key_fields.contains_key("categories"));
        assert_eq!(key_fields["award"], vec![json!("False"), json!("True")]);
        assert_eq!(key_fields["status"], vec![json!("Oral"), json!("Poster")]);
    }

    #[tokio::test]
    async fn test_year_selection_falls_back_to_latest() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "iclr", "iclr2024.json", &json!({ "status": ["A"] }));
        write_json(dir.path(), "iclr", "iclr2025.json", &json!({ "status": ["B"] }));

        let store = CatalogStore::new(dir.path());
        assert_eq!(store.key_fields("iclr", Some("2024")).await.unwrap()["status"], vec![json!("A")]);
        assert_eq!(store.key_fields("iclr", Some("1999")).await.unwrap()["status"], vec![json!("B")]);
        assert_eq!(store.key_fields("iclr", None).await.unwrap()["status"], vec![json!("B")]);
        assert_eq!(store.years("iclr").await.unwrap(), vec!["2024", "2025"]);
    }

    #[tokio::test]
    async fn test_categories_and_missing_conference() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "acl", "acl2025.json", &catalog());

        let store = CatalogStore::new(dir.path());
        let categories = store.categories("acl", None).await.unwrap();
        assert_eq!(categories["NLP"], vec![json!("p1"), json!("p2")]);

        assert!(store.categories("nips", None).await.unwrap().is_empty());
        assert!(store.key_fields("nips", None).await.unwrap().is_empty());
        assert!(store.years("nips").await.unwrap().is_empty());
        assert_eq!(store.conferences().await.unwrap(), vec!["acl"]);
    }
}
