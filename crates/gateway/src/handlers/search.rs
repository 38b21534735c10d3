//! Search handlers

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::time::Instant;

use crate::AppState;
use papercompass_common::{
    auth::AuthContext,
    db::NewSearchRecord,
    errors::Result,
};
use papercompass_search::{Record, SearchContext, SearchOutcome};

/// Search response
#[derive(Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub outcome: SearchOutcome,
    /// Matches, projected to the display fields unless every field was requested
    pub results: Vec<Record>,
    pub processing_time_ms: u64,
}

/// Run a search and append it to the caller's history
pub async fn search(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(ctx): Json<SearchContext>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    let outcome = state.engine.search(&ctx, state.expander()).await?;

    state
        .repo
        .record_search(NewSearchRecord {
            user_id: auth.user_id,
            keyword: ctx.keyword.clone(),
            search_mode: ctx.search_mode.as_str().to_string(),
            fields_to_search: outcome.fields.clone(),
            data_search_mode: outcome.source.clone(),
        })
        .await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        user_id = auth.user_id,
        request_id = %auth.request_id,
        source = %outcome.source,
        results = outcome.counts.matching_results,
        latency_ms = processing_time_ms,
        "Search served"
    );

    Ok(Json(SearchResponse {
        results: outcome.displayed(ctx.show_all_fields),
        outcome,
        processing_time_ms,
    }))
}

/// Run a search and return the matches as a downloadable JSON document
pub async fn export(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(ctx): Json<SearchContext>,
) -> Result<impl IntoResponse> {
    let outcome = state.engine.search(&ctx, state.expander()).await?;

    let body = outcome.export_document().to_json_pretty()?;
    let filename = outcome.export_filename();

    tracing::info!(user_id = auth.user_id, file = %filename, results = outcome.counts.matching_results, "Search exported");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    ))
}
