//! Natural-language keyword expansion
//!
//! Turns a free-text search intent into a comma-separated list of short
//! English keywords by calling an external text-generation endpoint. The
//! call is best effort: any failure falls back to a local tokenizer so a
//! search is never blocked by the remote service.

use crate::config::ExpansionConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Response keys that may carry the generated text, in lookup order
const TEXT_KEYS: &[&str] = &["result", "output", "text", "choices", "data"];

/// Keys inside a list element that may carry the generated text
const ITEM_TEXT_KEYS: &[&str] = &["content", "text", "output"];

/// Trait for keyword generation backends
#[async_trait]
pub trait KeywordExpander: Send + Sync {
    /// Generate a comma-separated keyword list for the query
    async fn generate(&self, query: &str) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Where the keywords of an expansion came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionSource {
    Model,
    Fallback,
}

impl ExpansionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpansionSource::Model => "model",
            ExpansionSource::Fallback => "fallback",
        }
    }
}

/// Result of expanding a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expansion {
    pub keywords: String,
    pub source: ExpansionSource,
    /// Informational message when the remote call was not used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// HTTP client for a text-generation endpoint
pub struct TextGenerationClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

impl TextGenerationClient {
    /// Create a new client with a fixed request timeout
    pub fn new(endpoint: String, api_key: String, max_tokens: u32, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            max_tokens,
        })
    }

    /// Build a client from configuration; `None` when disabled or no credential is configured
    pub fn from_config(config: &ExpansionConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Some(Self::new(
                config.endpoint.clone(),
                key.to_string(),
                config.max_tokens,
                Duration::from_secs(config.timeout_secs),
            )?)),
            _ => Ok(None),
        }
    }

    async fn make_request(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest {
            prompt,
            max_tokens: self.max_tokens,
        };

        let response = self.client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::KeywordExpansion {
                message: format!("Request failed: {}", e),
            })?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::KeywordExpansion {
                message: format!("API error {}: {}", status, body),
            });
        }

        let body: Value = response.json().await.map_err(|e| AppError::KeywordExpansion {
            message: format!("Failed to parse response: {}", e),
        })?;

        Ok(extract_text(&body))
    }
}

#[async_trait]
impl KeywordExpander for TextGenerationClient {
    async fn generate(&self, query: &str) -> Result<String> {
        self.make_request(&build_prompt(query)).await
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

/// Prompt asking for comma-separated English keywords
pub fn build_prompt(query: &str) -> String {
    format!(
        "Turn the following search intent into a short list of English keywords or \
         short phrases, separated by commas. Keep each keyword short and cover the main \
         intent. Output only the keyword list, no explanation.\n\n\
         User query: {}\n\nKeywords:",
        query
    )
}

/// Pull the generated text out of a response whose shape varies by provider
pub fn extract_text(body: &Value) -> String {
    if let Value::Object(map) = body {
        for key in TEXT_KEYS {
            match map.get(*key) {
                Some(Value::Array(items)) if !items.is_empty() => match &items[0] {
                    Value::Object(item) => {
                        for sub in ITEM_TEXT_KEYS {
                            if let Some(Value::String(text)) = item.get(*sub) {
                                return text.trim().to_string();
                            }
                        }
                    }
                    Value::String(text) => return text.trim().to_string(),
                    _ => {}
                },
                Some(Value::String(text)) => return text.trim().to_string(),
                _ => {}
            }
        }
    }

    // Unknown shape: hand back the raw body
    body.to_string()
}

/// Local tokenizer: lower-case, split on commas and whitespace, join with ", "
pub fn local_keywords(query: &str) -> String {
    query
        .replace(',', " ")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Expand a query, absorbing every remote failure into the local fallback
pub async fn expand_keywords(expander: Option<&dyn KeywordExpander>, query: &str) -> Expansion {
    if query.trim().is_empty() {
        return Expansion {
            keywords: String::new(),
            source: ExpansionSource::Fallback,
            notice: None,
        };
    }

    let notice = match expander {
        Some(expander) => match expander.generate(query).await {
            Ok(text) if !text.trim().is_empty() => {
                crate::metrics::record_expansion(ExpansionSource::Model.as_str());
                tracing::debug!(backend = expander.name(), keywords = %text, "Query expanded");
                return Expansion {
                    keywords: text.trim().to_string(),
                    source: ExpansionSource::Model,
                    notice: None,
                };
            }
            Ok(_) => {
                tracing::warn!(backend = expander.name(), "Keyword expansion returned no text");
                "Keyword expansion returned no text, using local keywords".to_string()
            }
            Err(e) => {
                tracing::warn!(backend = expander.name(), error = %e, "Keyword expansion failed");
                format!("Keyword expansion unavailable ({}), using local keywords", e)
            }
        },
        None => "Keyword expansion is not configured, using local keywords".to_string(),
    };

    crate::metrics::record_expansion(ExpansionSource::Fallback.as_str());

    Expansion {
        keywords: local_keywords(query),
        source: ExpansionSource::Fallback,
        notice: Some(notice),
    }
}

/// Outcome of a credential check against the endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub ok: bool,
    pub message: String,
}

/// Make one minimal call to check that the endpoint and credential work
pub async fn probe(expander: Option<&dyn KeywordExpander>) -> ProbeResult {
    let Some(expander) = expander else {
        return ProbeResult {
            ok: false,
            message: "No expansion API key configured".to_string(),
        };
    };

    match expander.generate("test").await {
        Ok(text) if !text.trim().is_empty() => ProbeResult {
            ok: true,
            message: "Expansion endpoint responded".to_string(),
        },
        Ok(_) => ProbeResult {
            ok: false,
            message: "Expansion endpoint returned an empty response".to_string(),
        },
        Err(e) => ProbeResult {
            ok: false,
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn stub_endpoint(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/generate",
            post(move |headers: HeaderMap, Json(request): Json<Value>| {
                let body = body.clone();
                async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer test-key");
                    let well_formed = request.get("prompt").and_then(Value::as_str).is_some()
                        && request.get("max_tokens") == Some(&json!(150));
                    if authorized && well_formed {
                        (status, Json(body))
                    } else {
                        (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad request" })))
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/generate", addr)
    }

    fn client(endpoint: String) -> TextGenerationClient {
        TextGenerationClient::new(endpoint, "test-key".into(), 150, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = ExpansionConfig::default();
        assert!(TextGenerationClient::from_config(&config).unwrap().is_none());

        config.api_key = Some("  ".into());
        assert!(TextGenerationClient::from_config(&config).unwrap().is_none());

        config.api_key = Some("key".into());
        assert!(TextGenerationClient::from_config(&config).unwrap().is_some());

        config.enabled = false;
        assert!(TextGenerationClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_local_keywords() {
        assert_eq!(local_keywords("Retrieval,  Agent planning"), "retrieval, agent, planning");
        assert_eq!(local_keywords(" , "), "");
    }

    #[test]
    fn test_extract_text_shapes() {
        assert_eq!(extract_text(&json!({ "result": " llm, agents " })), "llm, agents");
        assert_eq!(
            extract_text(&json!({ "choices": [{ "text": "rag, retrieval" }] })),
            "rag, retrieval"
        );
        assert_eq!(extract_text(&json!({ "data": ["graph neural networks"] })), "graph neural networks");
        assert_eq!(extract_text(&json!({ "unexpected": 1 })), r#"{"unexpected":1}"#);
    }

    #[tokio::test]
    async fn test_expand_with_model() {
        let endpoint = stub_endpoint(StatusCode::OK, json!({ "result": "retrieval, agent" })).await;
        let client = client(endpoint);

        let expansion = expand_keywords(Some(&client), "find agent papers about retrieval").await;
        assert_eq!(expansion.source, ExpansionSource::Model);
        assert_eq!(expansion.keywords, "retrieval, agent");
        assert!(expansion.notice.is_none());
    }

    #[tokio::test]
    async fn test_non_200_falls_back() {
        let endpoint = stub_endpoint(StatusCode::SERVICE_UNAVAILABLE, json!({ "result": "x" })).await;
        let client = client(endpoint);

        let expansion = expand_keywords(Some(&client), "Retrieval Agent").await;
        assert_eq!(expansion.source, ExpansionSource::Fallback);
        assert_eq!(expansion.keywords, "retrieval, agent");
        assert!(expansion.notice.is_some());
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        // Nothing listens on port 9 of the loopback interface
        let client = client("http://127.0.0.1:9/generate".into());

        let expansion = expand_keywords(Some(&client), "Diffusion, Models").await;
        assert_eq!(expansion.source, ExpansionSource::Fallback);
        assert_eq!(expansion.keywords, "diffusion, models");
    }

    #[tokio::test]
    async fn test_empty_query_and_missing_backend() {
        let empty = expand_keywords(None, "   ").await;
        assert_eq!(empty.keywords, "");

        let unconfigured = expand_keywords(None, "Vision Transformers").await;
        assert_eq!(unconfigured.keywords, "vision, transformers");
        assert!(unconfigured.notice.is_some());
    }

    #[tokio::test]
    async fn test_probe() {
        assert!(!probe(None).await.ok);

        let endpoint = stub_endpoint(StatusCode::OK, json!({ "output": "test" })).await;
        let client = client(endpoint);
        assert!(probe(Some(&client)).await.ok);
    }
}
