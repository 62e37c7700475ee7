use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{BatchDeleteRequest, BatchDeleteResponse, Graphic, GraphicListResponse, GraphicQuery},
    queries::graphic_queries,
    services::upload_service::{self, MAX_GRAPHICS_PER_UPLOAD},
};

pub async fn list_graphics(
    State(state): State<AppState>,
    Query(params): Query<GraphicQuery>,
) -> Result<Json<GraphicListResponse>> {
    let graphics = graphic_queries::list_graphics(&state.db, &params).await?;

    Ok(Json(graphics))
}

pub async fn upload_graphics(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vec<Graphic>>> {
    let form = upload_service::collect_upload(multipart, MAX_GRAPHICS_PER_UPLOAD).await?;

    let prefix = state.environment.storage_prefix("graphics");
    let stored = state.storage.put_batch(&prefix, &form.files).await?;
    let entries: Vec<_> = form.files.iter().zip(stored).collect();

    match graphic_queries::create_graphics(&state.db, &entries).await {
        Ok(graphics) => {
            tracing::info!("Uploaded {} graphics", graphics.len());
            Ok(Json(graphics))
        }
        Err(e) => {
            let keys: Vec<String> = entries.iter().map(|(_, object)| object.key.clone()).collect();
            state.storage.delete_keys(&keys).await;
            Err(e)
        }
    }
}

pub async fn delete_graphic(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let graphic = graphic_queries::delete_graphic(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Graphic {} not found", id)))?;

    state.storage.delete_keys(&[graphic.storage_key]).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_delete_graphics(
    State(state): State<AppState>,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<Json<BatchDeleteResponse>> {
    let ids = upload_service::validate_bulk_delete(&payload.ids)?;

    let deleted = graphic_queries::delete_graphics(&state.db, &ids).await?;

    let deleted_count = deleted.len();
    let keys: Vec<String> = deleted.into_iter().map(|g| g.storage_key).collect();
    state.storage.delete_keys(&keys).await;

    tracing::info!("Batch deleted {} of {} graphics", deleted_count, ids.len());

    Ok(Json(BatchDeleteResponse {
        deleted: deleted_count as u64,
    }))
}
