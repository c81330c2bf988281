//! Interfaces to the external collaborators
//!
//! Every prediction and every natural-language reply is produced by a model
//! trained or hosted elsewhere. Handlers only see these traits, so the
//! concrete clients in [`crate::services`] can be swapped for stubs in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! struct AlwaysSafe;
//!
//! #[async_trait::async_trait]
//! impl StructuralClassifier for AlwaysSafe {
//!     fn name(&self) -> &str { "always-safe" }
//!
//!     async fn predict(
//!         &self,
//!         _features: &BuildingFeatureVector,
//!     ) -> Result<StructuralPrediction, InferenceError> {
//!         StructuralPrediction::new(0, [1.0, 0.0])
//!             .map_err(|e| InferenceError::InvalidOutput(e.to_string()))
//!     }
//! }
//! ```

use quakesafe_common::{BuildingFeatureVector, StructuralPrediction};
use thiserror::Error;

/// Failure of an external model call
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream returned a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Upstream response was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Upstream response parsed but its values are unusable
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InferenceError::Parse(err.to_string())
        } else {
            InferenceError::Network(err.to_string())
        }
    }
}

/// Tabular collapse-risk classifier
#[async_trait::async_trait]
pub trait StructuralClassifier: Send + Sync {
    /// Model name for logging
    fn name(&self) -> &str;

    /// Predict the label and class probabilities for one building
    async fn predict(
        &self,
        features: &BuildingFeatureVector,
    ) -> Result<StructuralPrediction, InferenceError>;
}

/// Binary image classifier over a wall photograph
#[async_trait::async_trait]
pub trait CrackDetector: Send + Sync {
    /// Model name for logging
    fn name(&self) -> &str;

    /// Probability output for the encoded image (PNG/JPEG/GIF bytes)
    ///
    /// Resizing and normalization are the detector's concern.
    async fn score(&self, image: &[u8]) -> Result<f64, InferenceError>;
}

/// Hosted text-in/text-out language model
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model name for logging
    fn name(&self) -> &str;

    /// Send a single user message and return the reply text unmodified
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}
