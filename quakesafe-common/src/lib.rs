//! # QuakeSafe Common Library
//!
//! Shared code for the QuakeSafe building-risk service including:
//! - Categorical encoding of free-text building descriptions
//! - Verdict composition from classifier outputs
//! - Fixed verdict messages and language-model prompts
//! - API request/response types
//! - Configuration loading

pub mod api;
pub mod config;
pub mod encoding;
pub mod error;
pub mod prompts;
pub mod verdict;

pub use encoding::{BuildingFeatureVector, BuildingForm};
pub use error::{Error, Result};
pub use verdict::{
    CrackScores, CrackVerdict, StructuralOutcome, StructuralPrediction, StructuralVerdict,
};
