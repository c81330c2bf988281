//! Natural-language explanations
//!
//! Attaches the fixed prompt for a verdict (or the chat language instruction)
//! and forwards it to the language model. The model's text is returned as is.

use std::sync::Arc;

use quakesafe_common::prompts::{self, ChatRoute};
use quakesafe_common::CrackVerdict;
use tracing::info;

use crate::types::{InferenceError, LanguageModel};

/// Explanation requester backed by a language model
#[derive(Clone)]
pub struct Explainer {
    llm: Arc<dyn LanguageModel>,
}

impl Explainer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Explain a crack verdict to the user
    pub async fn explain_crack(&self, verdict: CrackVerdict) -> Result<String, InferenceError> {
        let prompt = prompts::crack_prompt(verdict);
        let reply = self.llm.generate(&prompt).await?;
        info!(model = self.llm.name(), ?verdict, "Crack explanation generated");
        Ok(reply)
    }

    /// Answer a free-text chat message
    ///
    /// Prediction requests get the fixed redirect without a model call.
    pub async fn chat(&self, message: &str) -> Result<String, InferenceError> {
        match prompts::route_chat(message) {
            ChatRoute::Redirect(reply) => {
                info!("Chat message asks for a prediction, redirecting to form");
                Ok(reply.to_string())
            }
            ChatRoute::Forward(prompt) => self.llm.generate(&prompt).await,
        }
    }
}
