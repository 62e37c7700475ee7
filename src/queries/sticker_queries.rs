use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        CreateStickerCategoryRequest, Sticker, StickerCategory, StickerCategorySummary,
        StickerQuery, UpdateStickerCategoryRequest,
    },
    services::{
        storage_service::StoredObject,
        upload_service::{UploadedFile, display_name},
    },
};

// CATEGORIES

pub async fn find_category(pool: &PgPool, id: i32) -> Result<Option<StickerCategory>> {
    let category =
        sqlx::query_as::<_, StickerCategory>("SELECT * FROM sticker_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(category)
}

pub async fn find_category_by_name(pool: &PgPool, name: &str) -> Result<Option<StickerCategory>> {
    let category = sqlx::query_as::<_, StickerCategory>(
        "SELECT * FROM sticker_categories WHERE LOWER(name) = LOWER($1)",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<StickerCategorySummary>> {
    let categories = sqlx::query_as::<_, StickerCategorySummary>(
        "SELECT c.*, COUNT(s.id)::bigint AS sticker_count
         FROM sticker_categories c
         LEFT JOIN stickers s ON s.category_id = c.id
         GROUP BY c.id
         ORDER BY c.sort_order ASC, c.name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn create_category(
    pool: &PgPool,
    req: &CreateStickerCategoryRequest,
) -> Result<StickerCategory> {
    let category = sqlx::query_as::<_, StickerCategory>(
        "INSERT INTO sticker_categories (name, description, is_active, sort_order)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.is_active.unwrap_or(true))
    .bind(req.sort_order.unwrap_or(0))
    .fetch_one(pool)
    .await?;

    Ok(category)
}

pub async fn update_category(
    pool: &PgPool,
    id: i32,
    req: &UpdateStickerCategoryRequest,
) -> Result<Option<StickerCategory>> {
    let category = sqlx::query_as::<_, StickerCategory>(
        r#"
        UPDATE sticker_categories
        SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            is_active = COALESCE($4, is_active),
            sort_order = COALESCE($5, sort_order),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(req.is_active)
    .bind(req.sort_order)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

pub async fn count_stickers_in_category(pool: &PgPool, category_id: i32) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stickers WHERE category_id = $1")
        .bind(category_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// A sticker inserted after the emptiness check still blocks the delete
/// through the RESTRICT foreign key; that surfaces as a conflict.
pub async fn delete_category(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sticker_categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::Conflict(format!("Sticker category {} still contains stickers", id))
            }
            other => AppError::DatabaseError(other),
        })?;

    Ok(result.rows_affected())
}

// STICKERS

pub async fn list_stickers(pool: &PgPool, params: &StickerQuery) -> Result<Vec<Sticker>> {
    let mut query_builder =
        sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM stickers WHERE 1=1");

    if let Some(category_id) = params.category_id {
        query_builder.push(" AND category_id = ");
        query_builder.push_bind(category_id);
    }

    if let Some(is_active) = params.is_active {
        query_builder.push(" AND is_active = ");
        query_builder.push_bind(is_active);
    }

    query_builder.push(" ORDER BY created_at DESC, id DESC");

    let stickers = query_builder
        .build_query_as::<Sticker>()
        .fetch_all(pool)
        .await?;

    Ok(stickers)
}

/// Stickers visible to shoppers: active stickers in active categories.
pub async fn list_public_stickers(pool: &PgPool, category_id: Option<i32>) -> Result<Vec<Sticker>> {
    let stickers = sqlx::query_as::<_, Sticker>(
        "SELECT s.* FROM stickers s
         JOIN sticker_categories c ON c.id = s.category_id
         WHERE s.is_active = true AND c.is_active = true
           AND ($1::int IS NULL OR s.category_id = $1)
         ORDER BY s.usage_count DESC, s.id DESC",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;

    Ok(stickers)
}

/// One row per stored object, all or nothing.
pub async fn create_stickers(
    pool: &PgPool,
    category_id: i32,
    entries: &[(&UploadedFile, StoredObject)],
) -> Result<Vec<Sticker>> {
    let mut tx = pool.begin().await?;
    let mut stickers = Vec::with_capacity(entries.len());

    for (file, object) in entries {
        let sticker = sqlx::query_as::<_, Sticker>(
            "INSERT INTO stickers (category_id, name, image_url, storage_key)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(category_id)
        .bind(display_name(&file.file_name))
        .bind(&object.url)
        .bind(&object.key)
        .fetch_one(&mut *tx)
        .await?;

        stickers.push(sticker);
    }

    tx.commit().await?;

    Ok(stickers)
}

pub async fn toggle_sticker(pool: &PgPool, id: i32) -> Result<Option<Sticker>> {
    let sticker = sqlx::query_as::<_, Sticker>(
        "UPDATE stickers SET is_active = NOT is_active WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(sticker)
}

pub async fn move_sticker(pool: &PgPool, id: i32, category_id: i32) -> Result<Option<Sticker>> {
    let sticker = sqlx::query_as::<_, Sticker>(
        "UPDATE stickers SET category_id = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(category_id)
    .fetch_optional(pool)
    .await?;

    Ok(sticker)
}

pub async fn increment_usage(pool: &PgPool, id: i32) -> Result<Option<Sticker>> {
    let sticker = sqlx::query_as::<_, Sticker>(
        "UPDATE stickers SET usage_count = usage_count + 1
         WHERE id = $1 AND is_active = true
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(sticker)
}

pub async fn delete_sticker(pool: &PgPool, id: i32) -> Result<Option<Sticker>> {
    let sticker = sqlx::query_as::<_, Sticker>("DELETE FROM stickers WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(sticker)
}
