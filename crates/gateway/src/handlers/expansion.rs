//! Keyword expansion credential check

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::AppState;
use papercompass_common::{
    auth::AuthContext,
    errors::Result,
    expansion::{probe, KeywordExpander, ProbeResult, TextGenerationClient},
};

#[derive(Debug, Default, Deserialize)]
pub struct ProbeRequest {
    /// Credential to try instead of the configured one
    #[serde(default)]
    pub api_key: Option<String>,
}

pub async fn probe_expansion(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(request): Json<ProbeRequest>,
) -> Result<Json<ProbeResult>> {
    let result = match request.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            let expansion = &state.config.expansion;
            let client = TextGenerationClient::new(
                expansion.endpoint.clone(),
                key.to_string(),
                expansion.max_tokens,
                state.config.expansion_timeout(),
            )?;
            probe(Some(&client as &dyn KeywordExpander)).await
        }
        None => probe(state.expander()).await,
    };

    tracing::info!(ok = result.ok, "Expansion probe finished");
    Ok(Json(result))
}
