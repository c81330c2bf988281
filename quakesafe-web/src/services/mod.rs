//! Service modules: external model clients and request-scoped helpers

pub mod crack_pipeline;
pub mod explainer;
pub mod gemini_client;
pub mod model_server;
pub mod upload_store;

pub use crack_pipeline::CrackPipeline;
pub use explainer::Explainer;
pub use gemini_client::GeminiClient;
pub use model_server::{HttpCrackDetector, HttpStructuralClassifier, ModelServerClient};
pub use upload_store::{allowed_extension, StoredUpload, UploadStore, ALLOWED_EXTENSIONS};
