use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};

use crate::error::{AppError, Result};

pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_GRAPHICS_PER_UPLOAD: usize = 50;
pub const MAX_STICKERS_PER_UPLOAD: usize = 50;
pub const MAX_PRODUCT_IMAGES_PER_UPLOAD: usize = 20;
pub const MAX_BULK_DELETE_IDS: usize = 100;

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Reads a multipart body into memory, enforcing the per-request file cap
/// and the per-file size cap while streaming so oversized input is dropped
/// before it is fully buffered.
pub async fn collect_upload(mut multipart: Multipart, max_files: usize) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid form field: {}", e.body_text())))?;
            form.fields.insert(name, value);
            continue;
        };

        if form.files.len() == max_files {
            return Err(too_many_files(max_files));
        }

        let content_type = field
            .content_type()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        check_content_type(&file_name, &content_type)?;

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(format!("Upload interrupted: {}", e.body_text())))?
        {
            if data.len() + chunk.len() > MAX_FILE_BYTES {
                return Err(file_too_large(&file_name));
            }
            data.extend_from_slice(&chunk);
        }

        form.files.push(UploadedFile {
            file_name,
            content_type,
            data: Bytes::from(data),
        });
    }

    validate_batch(&form.files, max_files)?;

    Ok(form)
}

/// Caps checked before anything is written to storage or the database.
pub fn validate_batch(files: &[UploadedFile], max_files: usize) -> Result<()> {
    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    if files.len() > max_files {
        return Err(too_many_files(max_files));
    }

    for file in files {
        check_content_type(&file.file_name, &file.content_type)?;
        if file.data.len() > MAX_FILE_BYTES {
            return Err(file_too_large(&file.file_name));
        }
        if file.data.is_empty() {
            return Err(AppError::BadRequest(format!(
                "File '{}' is empty",
                file.file_name
            )));
        }
    }

    Ok(())
}

/// Deduplicates ids while keeping their first-seen order.
pub fn validate_bulk_delete(ids: &[i32]) -> Result<Vec<i32>> {
    if ids.is_empty() {
        return Err(AppError::BadRequest("No ids provided".to_string()));
    }

    if ids.len() > MAX_BULK_DELETE_IDS {
        return Err(AppError::BadRequest(format!(
            "Bulk delete exceeds the limit of {} ids",
            MAX_BULK_DELETE_IDS
        )));
    }

    let mut seen = std::collections::HashSet::new();
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}

pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Display name derived from the uploaded file name, without extension.
pub fn display_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };

    let name = stem.trim();
    if name.is_empty() {
        "untitled".to_string()
    } else {
        name.chars().take(255).collect()
    }
}

fn check_content_type(file_name: &str, content_type: &str) -> Result<()> {
    if ALLOWED_IMAGE_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "File '{}' has unsupported type '{}'",
            file_name, content_type
        )))
    }
}

fn too_many_files(max_files: usize) -> AppError {
    AppError::BadRequest(format!(
        "Upload exceeds the limit of {} files",
        max_files
    ))
}

fn file_too_large(file_name: &str) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File '{}' exceeds the {} MB limit",
        file_name,
        MAX_FILE_BYTES / (1024 * 1024)
    ))
}
