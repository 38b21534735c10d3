//! Model panel: preprocessing, training, evaluation and prediction

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::AppState;
use papercompass_common::{auth::AuthContext, errors::Result};
use papercompass_search::{
    model::Prediction,
    preprocess::{augment, extract_features, quality_report, validate_records, QualityReport},
};

#[derive(Debug, Deserialize)]
pub struct RecordsRequest {
    #[serde(default)]
    pub records: Vec<Value>,
    /// Append an augmented copy of every record before training
    #[serde(default)]
    pub augment: bool,
}

#[derive(Serialize)]
pub struct TrainResponse {
    pub status: String,
    pub records: usize,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
}

/// Mark the persisted model as loaded so evaluation and prediction run
pub async fn load(State(state): State<AppState>, _auth: AuthContext) -> Json<Value> {
    state.model.lock().await.load();
    Json(serde_json::json!({ "status": "loaded" }))
}

pub async fn train(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(request): Json<RecordsRequest>,
) -> Result<Json<TrainResponse>> {
    let mut records = validate_records(request.records);
    extract_features(&mut records);
    if request.augment {
        records = augment(records);
    }

    state.model.lock().await.train(&records)?;

    Ok(Json(TrainResponse {
        status: "trained".to_string(),
        records: records.len(),
    }))
}

pub async fn evaluate(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(request): Json<RecordsRequest>,
) -> Json<BTreeMap<String, f64>> {
    let records = validate_records(request.records);
    Json(state.model.lock().await.evaluate(&records))
}

pub async fn predict(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(request): Json<RecordsRequest>,
) -> Json<PredictResponse> {
    let records = validate_records(request.records);
    Json(PredictResponse {
        predictions: state.model.lock().await.predict(&records),
    })
}

pub async fn data_quality(_auth: AuthContext, Json(request): Json<RecordsRequest>) -> Json<QualityReport> {
    Json(quality_report(&validate_records(request.records)))
}
