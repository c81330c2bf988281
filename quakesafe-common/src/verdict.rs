//! Verdict composition
//!
//! Turns raw classifier outputs into the closed set of user-facing verdicts.
//! The crack branch combines three detector probabilities; the structural
//! branch pairs the tabular classifier's label with its probability.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Decision threshold shared by all crack detectors
pub const CRACK_THRESHOLD: f64 = 0.5;

/// Probabilities from the three crack detectors for one image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrackScores {
    /// Generic crack presence
    pub generic: f64,
    /// X-shape detector output (below threshold means X-shaped)
    pub x_shape: f64,
    /// Y-shape detector output (below threshold means Y-shaped)
    pub y_shape: f64,
}

/// Crack classification of one uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrackVerdict {
    NoCrack,
    GenericCrack,
    XCrack,
    YCrack,
}

impl CrackVerdict {
    /// All verdicts, in no particular order
    pub const ALL: [CrackVerdict; 4] = [
        CrackVerdict::NoCrack,
        CrackVerdict::GenericCrack,
        CrackVerdict::XCrack,
        CrackVerdict::YCrack,
    ];

    /// Compose a verdict from detector scores
    ///
    /// Presence is gated first. Shape detectors are only consulted for a
    /// cracked wall, X before Y.
    pub fn from_scores(scores: &CrackScores) -> Self {
        if scores.generic <= CRACK_THRESHOLD {
            CrackVerdict::NoCrack
        } else if scores.x_shape < CRACK_THRESHOLD {
            CrackVerdict::XCrack
        } else if scores.y_shape < CRACK_THRESHOLD {
            CrackVerdict::YCrack
        } else {
            CrackVerdict::GenericCrack
        }
    }

    /// Canonical message shown to the user as `image_status`
    pub fn message(&self) -> &'static str {
        match self {
            CrackVerdict::NoCrack => "這張圖片被判定為沒有裂縫",
            CrackVerdict::GenericCrack => "這張圖片被判定為有裂縫，且是一般形狀的裂縫",
            CrackVerdict::XCrack => "這張圖片被判定為有裂縫，且被判定為X型裂縫",
            CrackVerdict::YCrack => "這張圖片被判定為有裂縫，且被判定為Y型裂縫",
        }
    }

    /// True unless the wall was judged undamaged
    pub fn has_crack(&self) -> bool {
        !matches!(self, CrackVerdict::NoCrack)
    }
}

impl std::fmt::Display for CrackVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Raw output of the structural classifier for one building
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuralPrediction {
    /// Predicted class: 0 = stands, 1 = may collapse
    pub label: u8,
    /// Class probabilities `[p0, p1]`
    pub probabilities: [f64; 2],
}

impl StructuralPrediction {
    /// Validate classifier output
    pub fn new(label: u8, probabilities: [f64; 2]) -> Result<Self> {
        if label > 1 {
            return Err(Error::InvalidInput(format!(
                "structural label must be 0 or 1, got {}",
                label
            )));
        }
        if probabilities
            .iter()
            .any(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
        {
            return Err(Error::InvalidInput(format!(
                "structural probabilities out of range: {:?}",
                probabilities
            )));
        }
        Ok(Self {
            label,
            probabilities,
        })
    }
}

/// Collapse-risk verdict category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructuralOutcome {
    Safe,
    AtRisk,
}

/// Collapse-risk verdict with the classifier's confidence in it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuralVerdict {
    pub outcome: StructuralOutcome,
    /// Probability of the predicted class
    pub confidence: f64,
}

impl StructuralVerdict {
    /// Pair the predicted label with its own probability
    pub fn from_prediction(prediction: &StructuralPrediction) -> Self {
        let [p_safe, p_at_risk] = prediction.probabilities;
        if prediction.label == 0 {
            Self {
                outcome: StructuralOutcome::Safe,
                confidence: p_safe,
            }
        } else {
            Self {
                outcome: StructuralOutcome::AtRisk,
                confidence: p_at_risk,
            }
        }
    }

    /// User-facing verdict text (`result` field)
    pub fn label(&self) -> &'static str {
        match self.outcome {
            StructuralOutcome::Safe => "大概不會倒",
            StructuralOutcome::AtRisk => "有可能會倒喔",
        }
    }

    /// Confidence formatted to five decimals (`prediction` field)
    pub fn confidence_text(&self) -> String {
        format!("系統信心 {:.5}", self.confidence)
    }
}
