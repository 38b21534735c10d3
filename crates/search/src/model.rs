//! Placeholder classification model
//!
//! Only the train/evaluate/predict shape is real; outputs are fixed.

use crate::record::Record;
use papercompass_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelState {
    Empty,
    Loaded,
    Trained,
}

/// Prediction for one input record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub id: Value,
    pub prediction: String,
}

#[derive(Debug, Clone)]
pub struct PasaModel {
    model_path: String,
    state: ModelState,
}

impl PasaModel {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            state: ModelState::Empty,
        }
    }

    pub fn load(&mut self) {
        self.state = ModelState::Loaded;
        info!(path = %self.model_path, "Model loaded");
    }

    pub fn is_ready(&self) -> bool {
        self.state != ModelState::Empty
    }

    pub fn train(&mut self, data: &[Record]) -> Result<()> {
        if data.is_empty() {
            error!("Training data is empty");
            return Err(AppError::Validation {
                message: "Training data is empty".to_string(),
                field: Some("records".to_string()),
            });
        }

        info!(count = data.len(), "Training model");
        self.state = ModelState::Trained;
        Ok(())
    }

    /// Fixed metrics; empty when nothing is loaded or trained
    pub fn evaluate(&self, data: &[Record]) -> BTreeMap<String, f64> {
        if !self.is_ready() {
            error!("Model not loaded, cannot evaluate");
            return BTreeMap::new();
        }

        info!(count = data.len(), "Evaluating model");
        BTreeMap::from([("accuracy".to_string(), 0.95), ("f1_score".to_string(), 0.92)])
    }

    pub fn predict(&self, input: &[Record]) -> Vec<Prediction> {
        if !self.is_ready() {
            error!("Model not loaded, cannot predict");
            return Vec::new();
        }

        input
            .iter()
            .map(|record| Prediction {
                id: record.id().cloned().unwrap_or(Value::Null),
                prediction: "Positive".to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record;
    use serde_json::json;

    #[test]
    fn test_unloaded_model_is_inert() {
        let model = PasaModel::new("models/pasa.bin");
        let data = vec![record(json!({ "id": 1 }))];

        assert!(model.evaluate(&data).is_empty());
        assert!(model.predict(&data).is_empty());
    }

    #[test]
    fn test_train_evaluate_predict() {
        let mut model = PasaModel::new("models/pasa.bin");
        assert!(model.train(&[]).is_err());

        let data = vec![record(json!({ "id": "p1" })), record(json!({ "title": "no id" }))];
        model.train(&data).unwrap();

        let metrics = model.evaluate(&data);
        assert_eq!(metrics["accuracy"], 0.95);
        assert_eq!(metrics["f1_score"], 0.92);

        let predictions = model.predict(&data);
        assert_eq!(predictions[0], Prediction { id: json!("p1"), prediction: "Positive".into() });
        assert_eq!(predictions[1].id, Value::Null);
    }

    #[test]
    fn test_load_enables_predictions() {
        let mut model = PasaModel::new("models/pasa.bin");
        model.load();
        assert_eq!(model.predict(&[record(json!({ "id": 3 }))]).len(), 1);
    }
}
