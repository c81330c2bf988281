//! Crack analysis of one uploaded image
//!
//! Runs the generic, X-shape and Y-shape detectors on the same image and
//! composes their scores into a single [`CrackVerdict`].

use std::sync::Arc;

use quakesafe_common::{CrackScores, CrackVerdict};
use tracing::info;

use crate::types::{CrackDetector, InferenceError};

/// The three detectors that make up a crack verdict
#[derive(Clone)]
pub struct CrackPipeline {
    generic: Arc<dyn CrackDetector>,
    x_shape: Arc<dyn CrackDetector>,
    y_shape: Arc<dyn CrackDetector>,
}

impl CrackPipeline {
    pub fn new(
        generic: Arc<dyn CrackDetector>,
        x_shape: Arc<dyn CrackDetector>,
        y_shape: Arc<dyn CrackDetector>,
    ) -> Self {
        Self {
            generic,
            x_shape,
            y_shape,
        }
    }

    /// Score the image with all three detectors
    ///
    /// The calls are independent and run concurrently; the first failure
    /// aborts the analysis.
    pub async fn score(&self, image: &[u8]) -> Result<CrackScores, InferenceError> {
        let (generic, x_shape, y_shape) = tokio::try_join!(
            self.generic.score(image),
            self.x_shape.score(image),
            self.y_shape.score(image),
        )?;

        Ok(CrackScores {
            generic,
            x_shape,
            y_shape,
        })
    }

    /// Score the image and compose the verdict
    pub async fn analyse(&self, image: &[u8]) -> Result<CrackVerdict, InferenceError> {
        let scores = self.score(image).await?;
        let verdict = CrackVerdict::from_scores(&scores);

        info!(
            generic = scores.generic,
            x_shape = scores.x_shape,
            y_shape = scores.y_shape,
            cracked = verdict.has_crack(),
            ?verdict,
            "Crack analysis complete"
        );

        Ok(verdict)
    }
}
