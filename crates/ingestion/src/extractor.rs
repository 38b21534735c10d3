//! Distinct-value extraction for key-field catalogs
//!
//! For every known conference, each dump under `<data_dir>/<conf>/` is
//! scanned and the sorted distinct values of the conference's key fields are
//! written to `<key_infos_dir>/<conf>/<same file name>`.

use crate::errors::{IngestionError, Result};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Key fields tracked per conference
pub const CONFERENCE_KEY_FIELDS: &[(&str, &[&str])] = &[
    ("aaai", &["track", "status", "primary_area"]),
    ("acl", &["track", "status", "award"]),
    ("acmmm", &["track", "status", "primary_area"]),
    ("aistats", &["track", "status", "primary_area"]),
    ("colm", &["track", "status", "primary_area"]),
    ("corl", &["track", "status", "primary_area"]),
    ("cvpr", &["track", "status"]),
    ("eccv", &["track", "status"]),
    ("emnlp", &["track", "status", "award"]),
    ("iccv", &["track", "status", "award", "session"]),
    ("iclr", &["track", "status", "primary_area"]),
    ("icml", &["track", "status", "primary_area"]),
    ("ijcai", &["track", "status", "primary_area"]),
    ("nips", &["track", "status", "primary_area"]),
    ("siggraph", &["track", "status", "sess"]),
    ("siggraphasia", &["track", "status", "sess"]),
    ("wacv", &["track", "status"]),
    ("www", &["track", "status", "primary_area"]),
];

pub fn key_fields_for(conference: &str) -> Option<&'static [&'static str]> {
    CONFERENCE_KEY_FIELDS
        .iter()
        .find(|(name, _)| *name == conference)
        .map(|(_, fields)| *fields)
}

/// Sorted distinct non-null values of `fields` across the objects of `data`.
///
/// `data` is either a list of objects or an object whose values are objects.
pub fn unique_values(data: &Value, fields: &[&str]) -> Option<Map<String, Value>> {
    let items: Vec<&Map<String, Value>> = match data {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => map.values().filter_map(Value::as_object).collect(),
        _ => return None,
    };

    let mut result = Map::new();
    for field in fields {
        let mut values: Vec<Value> = Vec::new();
        for item in &items {
            match item.get(*field) {
                Some(Value::Null) | None => {}
                Some(value) if !values.contains(value) => values.push(value.clone()),
                Some(_) => {}
            }
        }
        values.sort_by(compare_values);
        result.insert(field.to_string(), Value::Array(values));
    }

    Some(result)
}

/// Total order over JSON values: booleans, numbers, strings, then everything else
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Extract the catalog of one dump file
pub fn extract_file(path: &Path, fields: &[&str]) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&content).map_err(|e| IngestionError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    unique_values(&data, fields).ok_or_else(|| IngestionError::UnsupportedShape(path.display().to_string()))
}

/// Write `value` as JSON indented by four spaces, keeping non-ASCII text
pub fn write_pretty(path: &Path, value: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    std::fs::write(path, buffer)?;

    Ok(())
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct ExtractionSummary {
    pub written: Vec<PathBuf>,
    pub skipped_conferences: Vec<String>,
    pub failed_files: Vec<PathBuf>,
}

/// Regenerate the catalogs of the selected conferences (all known ones when empty)
pub fn process_conference_files(data_dir: &Path, key_infos_dir: &Path, only: &[String]) -> Result<ExtractionSummary> {
    let mut summary = ExtractionSummary::default();

    for (conference, fields) in CONFERENCE_KEY_FIELDS {
        if !only.is_empty() && !only.iter().any(|c| c == conference) {
            continue;
        }

        let conf_dir = data_dir.join(conference);
        if !conf_dir.is_dir() {
            warn!(conference = %conference, dir = %conf_dir.display(), "Conference directory missing, skipping");
            summary.skipped_conferences.push(conference.to_string());
            continue;
        }

        info!(conference = %conference, "Processing conference files");
        let output_dir = key_infos_dir.join(conference);

        let mut files: Vec<PathBuf> = std::fs::read_dir(&conf_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        files.sort();

        for input in files {
            let Some(file_name) = input.file_name() else {
                continue;
            };

            match extract_file(&input, fields) {
                Ok(values) => {
                    let output = output_dir.join(file_name);
                    write_pretty(&output, &values)?;
                    info!(file = %output.display(), "Catalog written");
                    summary.written.push(output);
                }
                Err(e) => {
                    warn!(file = %input.display(), error = %e, "Skipping file");
                    summary.failed_files.push(input);
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unique_values_sorted_and_distinct() {
        let data = json!([
            { "status": "Poster", "award": true, "track": "main" },
            { "status": "Oral", "award": false, "track": null },
            { "status": "Poster", "award": true },
            "not a paper"
        ]);

        let values = unique_values(&data, &["status", "award", "track", "sess"]).unwrap();
        assert_eq!(values["status"], json!(["Oral", "Poster"]));
        assert_eq!(values["award"], json!([false, true]));
        assert_eq!(values["track"], json!(["main"]));
        assert_eq!(values["sess"], json!([]));
    }

    #[test]
    fn test_object_of_objects() {
        let data = json!({ "p1": { "status": "B" }, "p2": { "status": "A" } });
        assert_eq!(unique_values(&data, &["status"]).unwrap()["status"], json!(["A", "B"]));
        assert!(unique_values(&json!("x"), &["status"]).is_none());
    }

    #[test]
    fn test_key_fields_table() {
        assert_eq!(key_fields_for("iccv"), Some(&["track", "status", "award", "session"][..]));
        assert_eq!(key_fields_for("unknown"), None);
    }

    #[test]
    fn test_process_conference_files() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let acl = data.path().join("acl");
        std::fs::create_dir_all(&acl).unwrap();
        std::fs::write(acl.join("acl2025.json"), r#"[{"track":"Main","status":"Oral","award":true,"title":"Über"}]"#).unwrap();
        std::fs::write(acl.join("broken.json"), "{ nope").unwrap();

        let summary = process_conference_files(data.path(), out.path(), &[]).unwrap();
        assert_eq!(summary.written.len(), 1);
        assert_eq!(summary.failed_files.len(), 1);
        assert!(summary.skipped_conferences.contains(&"iclr".to_string()));

        let written = std::fs::read_to_string(out.path().join("acl").join("acl2025.json")).unwrap();
        assert!(written.contains("\n    \"award\": [\n        true\n    ]"));

        let restricted = process_conference_files(data.path(), out.path(), &["iclr".to_string()]).unwrap();
        assert!(restricted.written.is_empty());
        assert_eq!(restricted.skipped_conferences, vec!["iclr"]);
    }
}
