use aws_sdk_s3::primitives::ByteStream;
use axum::{Extension, Json, extract::State};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    models::{JerseyGenerateRequest, JerseyGenerateResponse},
    services::{
        image_generation_service::{JERSEY_VARIATIONS, build_jersey_prompt},
        storage_service::PendingObject,
    },
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn generate_jersey(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<JerseyGenerateRequest>,
) -> Result<Json<JerseyGenerateResponse>> {
    let user_id = extract_user_id(&claims)?;

    let prompt = build_jersey_prompt(&payload.prompt, payload.custom_instructions.as_deref())?;

    let images = state
        .image_generator
        .generate(&prompt, JERSEY_VARIATIONS)
        .await?;

    let prefix = state.environment.storage_prefix("jerseys");
    let pending = images
        .into_iter()
        .map(|image| PendingObject {
            key: format!("{}/{}/{}.png", prefix, user_id, Uuid::new_v4()),
            content_type: "image/png".to_string(),
            data: ByteStream::from(image),
        })
        .collect();

    let image_urls: Vec<String> = state
        .storage
        .put_many(pending)
        .await?
        .into_iter()
        .map(|object| object.url)
        .collect();

    tracing::info!("Generated {} jersey designs for user {}", image_urls.len(), user_id);

    Ok(Json(JerseyGenerateResponse { image_urls }))
}
