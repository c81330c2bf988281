//! API module for shared HTTP request/response types
//!
//! # Design Principle
//!
//! This module contains ONLY serde types, with no HTTP framework
//! dependencies. The web crate wraps them with axum extractors and
//! responses; integration tests decode responses into the same types.

pub mod types;

pub use types::{ChatReply, ChatRequest, ErrorBody, ErrorResponse, SubmitResponse};
