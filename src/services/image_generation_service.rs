use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{
    config::ImageGenerationConfig,
    error::{AppError, Result},
};

pub const JERSEY_VARIATIONS: u8 = 2;
const MAX_PROMPT_CHARS: usize = 1000;
const IMAGE_SIZE: &str = "1024x1024";

#[derive(Clone)]
pub struct ImageGenerator {
    client: reqwest::Client,
    config: ImageGenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

impl ImageGenerator {
    pub fn new(config: ImageGenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// One outbound call, no retry. Returns decoded PNG bytes per image.
    pub async fn generate(&self, prompt: &str, count: u8) -> Result<Vec<Vec<u8>>> {
        if self.config.api_key.is_empty() {
            return Err(AppError::ConfigError("IMAGE_API_KEY not set".to_string()));
        }

        let request_body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "n": count,
            "size": IMAGE_SIZE,
            "response_format": "b64_json",
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Upstream("Image generation timed out".to_string())
                } else {
                    AppError::Upstream(format!("Image generation request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let upstream_message = body
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();

            return Err(map_upstream_status(status, &upstream_message));
        }

        let body: GenerationResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("Failed to parse image generation response: {}", e))
        })?;

        let images = body
            .data
            .into_iter()
            .map(|image| {
                let encoded = image.b64_json.ok_or_else(|| {
                    AppError::Upstream("Image generation response missing image data".to_string())
                })?;
                STANDARD
                    .decode(encoded)
                    .map_err(|e| AppError::Upstream(format!("Invalid image payload: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        if images.len() < count as usize {
            return Err(AppError::Upstream(format!(
                "Expected {} images, received {}",
                count,
                images.len()
            )));
        }

        Ok(images)
    }
}

pub fn map_upstream_status(status: StatusCode, upstream_message: &str) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(
            "Image generation rate limit reached, please try again later".to_string(),
        ),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(
            "Image generation service rejected the configured credentials".to_string(),
        ),
        StatusCode::BAD_REQUEST => AppError::BadRequest(format!(
            "Image generation rejected the prompt: {}",
            upstream_message
        )),
        _ => AppError::Upstream(format!(
            "Image generation failed ({}): {}",
            status.as_u16(),
            upstream_message
        )),
    }
}

pub fn build_jersey_prompt(prompt: &str, custom_instructions: Option<&str>) -> Result<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("prompt is required".to_string()));
    }

    let mut full = format!(
        "Flat front view of a sports jersey design for garment printing. Theme: {}.",
        prompt
    );

    if let Some(extra) = custom_instructions.map(str::trim).filter(|s| !s.is_empty()) {
        full.push_str(" Additional instructions: ");
        full.push_str(extra);
        if !extra.ends_with('.') {
            full.push('.');
        }
    }

    full.push_str(" Plain white background, no mannequin, no watermark.");

    if full.chars().count() > MAX_PROMPT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Prompt and instructions exceed {} characters",
            MAX_PROMPT_CHARS
        )));
    }

    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_theme_and_instructions() {
        let prompt = build_jersey_prompt("  tiger stripes ", Some("use navy and gold")).unwrap();

        assert!(prompt.contains("Theme: tiger stripes."));
        assert!(prompt.contains("Additional instructions: use navy and gold."));
    }

    #[test]
    fn blank_instructions_are_ignored() {
        let prompt = build_jersey_prompt("flames", Some("   ")).unwrap();
        assert!(!prompt.contains("Additional instructions"));
    }

    #[test]
    fn empty_prompt_is_rejected() {
        assert!(build_jersey_prompt(" ", None).is_err());
    }

    #[test]
    fn overlong_prompt_is_rejected() {
        let long = "a".repeat(MAX_PROMPT_CHARS);
        assert!(build_jersey_prompt(&long, None).is_err());
    }

    #[test]
    fn rate_limit_and_auth_failures_map_to_client_codes() {
        assert!(matches!(
            map_upstream_status(StatusCode::TOO_MANY_REQUESTS, ""),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            map_upstream_status(StatusCode::UNAUTHORIZED, ""),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            map_upstream_status(StatusCode::FORBIDDEN, ""),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            map_upstream_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            AppError::Upstream(msg) if msg.contains("boom")
        ));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let generator = ImageGenerator::new(ImageGenerationConfig {
            api_url: "http://127.0.0.1:9/unused".to_string(),
            api_key: String::new(),
            model: "dall-e-2".to_string(),
            timeout_secs: 1,
        })
        .unwrap();

        let err = generator.generate("x", 2).await.unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
