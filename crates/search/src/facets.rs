//! Per-conference faceting by key-field values and research categories

use crate::catalog::Categories;
use crate::record::{fields, value_text, Record};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// `field -> conference -> allowed values`
pub type KeyFieldFilters = BTreeMap<String, BTreeMap<String, Vec<Value>>>;

/// `conference -> selected category names`
pub type CategorySelection = BTreeMap<String, Vec<String>>;

/// Whether a record's value for `field` is in the allow-list.
///
/// Missing or null values never pass. Boolean `award` values compare
/// case-insensitively with the string forms of the allow-list; other values
/// match by JSON equality or, for scalars, by string form.
pub fn value_allowed(field: &str, value: Option<&Value>, allowed: &[Value]) -> bool {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return false;
    };

    if field == fields::AWARD {
        if let Value::Bool(flag) = value {
            let flag = flag.to_string();
            return allowed
                .iter()
                .any(|candidate| value_text(candidate).to_lowercase() == flag);
        }
    }

    if allowed.contains(value) {
        return true;
    }

    if is_scalar(value) {
        let text = value_text(value);
        return allowed
            .iter()
            .filter(|candidate| is_scalar(candidate))
            .any(|candidate| value_text(candidate) == text);
    }

    false
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Keep records whose values pass every allow-list set for their conference
pub fn apply_key_field_filters<'a>(records: Vec<&'a Record>, filters: &KeyFieldFilters) -> Vec<&'a Record> {
    if filters.is_empty() {
        return records;
    }

    records
        .into_iter()
        .filter(|record| {
            let Some(conference) = record.source() else {
                return true;
            };

            filters.iter().all(|(field, by_conference)| match by_conference.get(conference) {
                Some(allowed) if !allowed.is_empty() => value_allowed(field, record.get(field), allowed),
                _ => true,
            })
        })
        .collect()
}

/// Keep records whose id belongs to one of the selected categories of their conference.
///
/// Conferences with no selection or no catalog data pass through.
pub fn apply_category_filters<'a>(
    records: Vec<&'a Record>,
    selection: &CategorySelection,
    catalogs: &HashMap<String, Categories>,
) -> Vec<&'a Record> {
    if selection.is_empty() {
        return records;
    }

    // Union of the selected id lists, per conference, as strings
    let allowed_ids: HashMap<&str, HashSet<String>> = selection
        .iter()
        .filter(|(_, selected)| !selected.is_empty())
        .filter_map(|(conference, selected)| {
            let catalog = catalogs.get(conference).filter(|c| !c.is_empty())?;
            let ids = selected
                .iter()
                .filter_map(|category| catalog.get(category))
                .flatten()
                .map(value_text)
                .collect();
            Some((conference.as_str(), ids))
        })
        .collect();

    records
        .into_iter()
        .filter(|record| {
            let Some(ids) = record.source().and_then(|conference| allowed_ids.get(conference)) else {
                return true;
            };
            record.id().map(|id| ids.contains(&value_text(id))).unwrap_or(false)
        })
        .collect()
}

/// Human-readable summary of the applied key-field filters
pub fn describe_key_field_filters(filters: &KeyFieldFilters) -> Option<String> {
    let parts: Vec<String> = filters
        .iter()
        .filter_map(|(field, by_conference)| {
            let described: Vec<String> = by_conference
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(conference, values)| {
                    let values: Vec<String> = values.iter().map(value_text).collect();
                    format!("{} {}: {}", conference, capitalize(field), values.join(", "))
                })
                .collect();
            (!described.is_empty()).then(|| described.join(" | "))
        })
        .collect();

    (!parts.is_empty()).then(|| format!("Key field filters: {}", parts.join("; ")))
}

/// Human-readable summary of the category selection
pub fn describe_category_selection(selection: &CategorySelection) -> Option<String> {
    let parts: Vec<String> = selection
        .iter()
        .filter(|(_, categories)| !categories.is_empty())
        .map(|(conference, categories)| format!("{} categories: {}", conference, categories.join(", ")))
        .collect();

    (!parts.is_empty()).then(|| format!("Category filters: {}", parts.join(" | ")))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
