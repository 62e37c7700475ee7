use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        Product, ProductDetail, ProductImageUploadResponse, ProductListResponse, ProductPayload,
        ProductQuery, UpdateProductStatusRequest,
    },
    queries::product_queries::{self, CatalogScope},
    services::{
        upload_service::{self, MAX_PRODUCT_IMAGES_PER_UPLOAD},
        variant_service,
    },
};

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductDetail>> {
    let new_product = variant_service::validate_new_product(&payload)?;

    let id = product_queries::create_product(&state.db, &new_product).await?;

    Ok(Json(load_detail(&state, id).await?))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<ProductListResponse>> {
    let products =
        product_queries::search_products(&state.db, &params, CatalogScope::Admin).await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetail>> {
    Ok(Json(load_detail(&state, id).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductDetail>> {
    variant_service::validate_update(&payload)?;

    if !product_queries::update_product(&state.db, id, &payload).await? {
        return Err(not_found(id));
    }

    Ok(Json(load_detail(&state, id).await?))
}

pub async fn update_product_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductStatusRequest>,
) -> Result<Json<Product>> {
    let product = product_queries::set_active(&state.db, id, payload.is_active)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(product))
}

/// Stores images under the product's own prefix so deleting the product
/// removes them too. The returned URLs are attached with a product update.
pub async fn upload_product_images(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ProductImageUploadResponse>> {
    let form = upload_service::collect_upload(multipart, MAX_PRODUCT_IMAGES_PER_UPLOAD).await?;

    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found(id));
    }

    let prefix = product_prefix(&state, id);
    let stored = state.storage.put_batch(&prefix, &form.files).await?;

    tracing::info!("Uploaded {} images for product {}", stored.len(), id);

    Ok(Json(ProductImageUploadResponse {
        urls: stored.into_iter().map(|object| object.url).collect(),
    }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    if product_queries::delete_product(&state.db, id).await? == 0 {
        return Err(not_found(id));
    }

    let prefix = format!("{}/", product_prefix(&state, id));
    match state.storage.delete_objects_by_prefix(&prefix).await {
        Ok(count) => tracing::info!("Deleted product {} and {} stored objects", id, count),
        Err(e) => tracing::warn!("Product {} deleted but storage cleanup failed: {}", id, e),
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn load_detail(state: &AppState, id: i32) -> Result<ProductDetail> {
    product_queries::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn product_prefix(state: &AppState, id: i32) -> String {
    format!("{}/{}", state.environment.storage_prefix("products"), id)
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Product with id {} not found", id))
}
