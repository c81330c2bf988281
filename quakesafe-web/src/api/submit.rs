//! Building assessment endpoint
//!
//! `POST /submit` takes a multipart form with the building description and
//! a wall photograph and answers with both verdicts.
//!
//! **Order of work:**
//! 1. Parse and encode the building form, run the structural classifier
//! 2. Check the upload (present, named, allowed extension)
//! 3. Store the upload under a per-request name
//! 4. Run the crack detectors and compose the crack verdict
//! 5. Ask the language model to explain the crack verdict
//!
//! A disallowed extension still returns the structural result, with
//! `image_status` set to the rejection notice.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use quakesafe_common::api::SubmitResponse;
use quakesafe_common::{BuildingForm, StructuralVerdict};
use tracing::info;

use crate::services::allowed_extension;
use crate::types::InferenceError;
use crate::{ApiError, ApiResult, AppState};

/// Multipart field carrying the photograph
pub const IMAGE_FIELD: &str = "image";

/// Uploaded photograph as received
struct ImagePart {
    file_name: String,
    bytes: Bytes,
}

/// Split the multipart body into text fields and the image part
async fn read_form(
    multipart: &mut Multipart,
) -> ApiResult<(HashMap<String, String>, Option<ImagePart>)> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        // Only a part with a filename is an upload; a plain `image` text
        // part is an ordinary form value
        match field.file_name().map(str::to_string) {
            Some(file_name) if name == IMAGE_FIELD => {
                let bytes = field.bytes().await?;
                image = Some(ImagePart { file_name, bytes });
            }
            _ => {
                let value = field.text().await?;
                fields.insert(name, value);
            }
        }
    }

    Ok((fields, image))
}

/// Record an upstream failure before turning it into a response
async fn upstream<T>(state: &AppState, result: Result<T, InferenceError>) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            state.record_error(&e).await;
            Err(ApiError::Upstream(e))
        }
    }
}

/// POST /submit
pub async fn submit_form(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<SubmitResponse>> {
    let (fields, image) = read_form(&mut multipart).await?;

    // Structural prediction
    let building = BuildingForm::from_form(&fields)?;
    let features = building.encode();
    let prediction = upstream(&state, state.structural.predict(&features).await).await?;
    let structural = StructuralVerdict::from_prediction(&prediction);

    info!(
        result = structural.label(),
        confidence = structural.confidence,
        "Structural prediction complete"
    );

    // Upload checks
    let image = image.ok_or_else(|| ApiError::BadRequest("No file part".to_string()))?;
    if image.file_name.is_empty() {
        return Err(ApiError::BadRequest("No selected file".to_string()));
    }
    let Some(extension) = allowed_extension(&image.file_name) else {
        info!(file_name = %image.file_name, "Upload rejected: file type not allowed");
        return Ok(Json(SubmitResponse::file_type_rejected(&structural)));
    };

    // Crack analysis on the stored upload
    let upload = state.uploads.save(&extension, &image.bytes).await?;
    drop(image);
    let image_bytes = upload.read().await?;

    let crack = upstream(&state, state.crack.analyse(&image_bytes).await).await?;
    let img_reply = upstream(&state, state.explainer.explain_crack(crack).await).await?;

    info!(upload_id = %upload.id(), verdict = %crack, "Image assessment complete");

    Ok(Json(SubmitResponse::analysed(&structural, crack, img_reply)))
}

pub fn submit_routes() -> Router<AppState> {
    Router::new().route("/submit", post(submit_form))
}
