use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ProductDetail, ProductListResponse, ProductQuery},
    queries::product_queries::{self, CatalogScope},
};

pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<ProductListResponse>> {
    let products =
        product_queries::search_products(&state.db, &params, CatalogScope::Public).await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetail>> {
    let product = product_queries::find_detail(&state.db, id)
        .await?
        .filter(|detail| detail.product.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}
