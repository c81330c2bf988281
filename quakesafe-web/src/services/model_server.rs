//! Model-server clients
//!
//! The tabular classifier and the three crack detectors are served over
//! HTTP with a TensorFlow-Serving-style predict API:
//!
//! - Request: `POST <endpoint>` with `{"instances": [...]}`
//! - Response: `{"predictions": [...]}`
//!
//! **Structural:** instance is the six-element feature row; the prediction is
//! `{"label": 0|1, "probabilities": [p0, p1]}`.
//!
//! **Crack detectors:** instance is `{"image_bytes": {"b64": ...}, "target_size": [h, w]}`;
//! the prediction is either `p` or `[p]`. The server resizes to `target_size`
//! and scales pixels to `[0, 1]` before inference.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quakesafe_common::config::{DetectorConfig, EndpointConfig};
use quakesafe_common::{BuildingFeatureVector, StructuralPrediction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{CrackDetector, InferenceError, StructuralClassifier};

const USER_AGENT: &str = concat!("quakesafe/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct PredictRequest<I> {
    instances: Vec<I>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse<P> {
    predictions: Vec<P>,
}

#[derive(Debug, Deserialize)]
struct StructuralOutput {
    label: u8,
    probabilities: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ImageInstance<'a> {
    image_bytes: EncodedBytes,
    target_size: &'a [u32; 2],
}

#[derive(Debug, Serialize)]
struct EncodedBytes {
    b64: String,
}

/// Detector output: bare probability or a one-element row
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectorOutput {
    Scalar(f64),
    Row(Vec<f64>),
}

impl DetectorOutput {
    fn probability(&self) -> Option<f64> {
        match self {
            DetectorOutput::Scalar(p) => Some(*p),
            DetectorOutput::Row(row) => row.first().copied(),
        }
    }
}

/// Shared HTTP transport for all model endpoints
#[derive(Debug, Clone)]
pub struct ModelServerClient {
    http_client: reqwest::Client,
}

impl ModelServerClient {
    /// Create new model-server client
    pub fn new(timeout: Duration) -> Result<Self, InferenceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    /// POST one instance and return the first prediction
    async fn predict_one<I, P>(&self, endpoint: &str, instance: I) -> Result<P, InferenceError>
    where
        I: Serialize,
        P: DeserializeOwned,
    {
        let request = PredictRequest {
            instances: vec![instance],
        };

        let response = self.http_client.post(endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api(status.as_u16(), error_text));
        }

        let body: PredictResponse<P> = response
            .json()
            .await
            .map_err(|e| InferenceError::Parse(e.to_string()))?;

        body.predictions
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::InvalidOutput("empty predictions".to_string()))
    }
}

/// Collapse-risk classifier behind a model-server endpoint
pub struct HttpStructuralClassifier {
    client: ModelServerClient,
    endpoint: String,
}

impl HttpStructuralClassifier {
    pub fn new(client: ModelServerClient, config: &EndpointConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait::async_trait]
impl StructuralClassifier for HttpStructuralClassifier {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn predict(
        &self,
        features: &BuildingFeatureVector,
    ) -> Result<StructuralPrediction, InferenceError> {
        let row = features.as_row();
        debug!(endpoint = %self.endpoint, ?row, "Querying structural classifier");

        let output: StructuralOutput = self.client.predict_one(&self.endpoint, row).await?;

        let probabilities: [f64; 2] = output.probabilities.as_slice().try_into().map_err(|_| {
            InferenceError::InvalidOutput(format!(
                "expected 2 class probabilities, got {}",
                output.probabilities.len()
            ))
        })?;

        StructuralPrediction::new(output.label, probabilities)
            .map_err(|e| InferenceError::InvalidOutput(e.to_string()))
    }
}

/// Binary crack detector behind a model-server endpoint
pub struct HttpCrackDetector {
    client: ModelServerClient,
    name: String,
    endpoint: String,
    target_size: [u32; 2],
}

impl HttpCrackDetector {
    pub fn new(client: ModelServerClient, name: impl Into<String>, config: &DetectorConfig) -> Self {
        Self {
            client,
            name: name.into(),
            endpoint: config.endpoint.clone(),
            target_size: config.target_size,
        }
    }
}

#[async_trait::async_trait]
impl CrackDetector for HttpCrackDetector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, image: &[u8]) -> Result<f64, InferenceError> {
        debug!(
            detector = %self.name,
            endpoint = %self.endpoint,
            bytes = image.len(),
            target_size = ?self.target_size,
            "Querying crack detector"
        );

        let instance = ImageInstance {
            image_bytes: EncodedBytes {
                b64: BASE64.encode(image),
            },
            target_size: &self.target_size,
        };

        let output: DetectorOutput = self.client.predict_one(&self.endpoint, instance).await?;

        match output.probability() {
            Some(p) if p.is_finite() && (0.0..=1.0).contains(&p) => Ok(p),
            Some(p) => Err(InferenceError::InvalidOutput(format!(
                "{} returned probability {} outside [0, 1]",
                self.name, p
            ))),
            None => Err(InferenceError::InvalidOutput(format!(
                "{} returned an empty prediction row",
                self.name
            ))),
        }
    }
}
