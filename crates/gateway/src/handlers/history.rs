//! Search history of the caller

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;
use papercompass_common::{auth::AuthContext, db::models::SearchHistory, errors::Result};

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i32,
    pub keyword: Option<String>,
    pub search_mode: Option<String>,
    pub fields_to_search: Vec<String>,
    pub data_search_mode: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<SearchHistory> for HistoryEntry {
    fn from(entry: SearchHistory) -> Self {
        let fields_to_search = entry
            .fields_to_search
            .as_deref()
            .map(|fields| fields.split(',').filter(|f| !f.is_empty()).map(String::from).collect())
            .unwrap_or_default();

        Self {
            id: entry.id,
            keyword: entry.keyword,
            search_mode: entry.search_mode,
            fields_to_search,
            data_search_mode: entry.data_search_mode,
            timestamp: entry.timestamp,
        }
    }
}

/// Newest first
pub async fn history(State(state): State<AppState>, auth: AuthContext) -> Result<Json<Vec<HistoryEntry>>> {
    let entries = state.repo.search_history(auth.user_id).await?;
    Ok(Json(entries.into_iter().map(HistoryEntry::from).collect()))
}
