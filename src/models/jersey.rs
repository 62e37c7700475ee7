use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct JerseyGenerateRequest {
    pub prompt: String,
    #[serde(default, alias = "customInstructions")]
    pub custom_instructions: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JerseyGenerateResponse {
    pub image_urls: Vec<String>,
}
