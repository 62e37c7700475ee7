use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Graphic, GraphicListResponse, GraphicQuery},
    services::{
        storage_service::StoredObject,
        upload_service::{UploadedFile, display_name},
    },
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub async fn list_graphics(pool: &PgPool, params: &GraphicQuery) -> Result<GraphicListResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let graphics = sqlx::query_as::<_, Graphic>(
        "SELECT * FROM graphics ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM graphics")
        .fetch_one(pool)
        .await?;

    Ok(GraphicListResponse {
        graphics,
        total,
        limit,
        offset,
    })
}

/// One row per uploaded file inside a single transaction.
pub async fn create_graphics(
    pool: &PgPool,
    entries: &[(&UploadedFile, StoredObject)],
) -> Result<Vec<Graphic>> {
    let mut tx = pool.begin().await?;
    let mut graphics = Vec::with_capacity(entries.len());

    for (file, object) in entries {
        let graphic = sqlx::query_as::<_, Graphic>(
            "INSERT INTO graphics (name, image_url, storage_key, mime_type, size_bytes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(display_name(&file.file_name))
        .bind(&object.url)
        .bind(&object.key)
        .bind(&file.content_type)
        .bind(file.data.len() as i64)
        .fetch_one(&mut *tx)
        .await?;

        graphics.push(graphic);
    }

    tx.commit().await?;

    Ok(graphics)
}

pub async fn delete_graphic(pool: &PgPool, id: i32) -> Result<Option<Graphic>> {
    let graphic = sqlx::query_as::<_, Graphic>("DELETE FROM graphics WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(graphic)
}

pub async fn delete_graphics(pool: &PgPool, ids: &[i32]) -> Result<Vec<Graphic>> {
    let graphics =
        sqlx::query_as::<_, Graphic>("DELETE FROM graphics WHERE id = ANY($1) RETURNING *")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(graphics)
}
