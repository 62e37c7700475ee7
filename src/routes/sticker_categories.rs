use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        CreateStickerCategoryRequest, StickerCategory, StickerCategorySummary,
        UpdateStickerCategoryRequest,
    },
    queries::sticker_queries,
};

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<StickerCategorySummary>>> {
    let categories = sticker_queries::list_categories(&state.db).await?;

    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateStickerCategoryRequest>,
) -> Result<Json<StickerCategory>> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    if sticker_queries::find_category_by_name(&state.db, name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Sticker category '{}' already exists",
            name
        )));
    }

    let category = sticker_queries::create_category(&state.db, &payload).await?;

    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStickerCategoryRequest>,
) -> Result<Json<StickerCategory>> {
    if let Some(name) = payload.name.as_deref().map(str::trim) {
        if name.is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }

        let clash = sticker_queries::find_category_by_name(&state.db, name).await?;
        if clash.is_some_and(|existing| existing.id != id) {
            return Err(AppError::Conflict(format!(
                "Sticker category '{}' already exists",
                name
            )));
        }
    }

    let category = sticker_queries::update_category(&state.db, id, &payload)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    if sticker_queries::find_category(&state.db, id).await?.is_none() {
        return Err(not_found(id));
    }

    let sticker_count = sticker_queries::count_stickers_in_category(&state.db, id).await?;
    if sticker_count > 0 {
        return Err(AppError::Conflict(format!(
            "Category still contains {} stickers",
            sticker_count
        )));
    }

    if sticker_queries::delete_category(&state.db, id).await? == 0 {
        return Err(not_found(id));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Sticker category {} not found", id))
}
