use axum::{
    Extension, Json,
    extract::{Path, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AddWishlistRequest, ProductSummary, WishlistItem},
    queries::{product_queries, wishlist_queries},
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ProductSummary>>> {
    let user_id = extract_user_id(&claims)?;

    let products = wishlist_queries::list_products(&state.db, user_id).await?;
    let summaries = product_queries::summarize(&state.db, products).await?;

    Ok(Json(summaries))
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddWishlistRequest>,
) -> Result<Json<WishlistItem>> {
    let user_id = extract_user_id(&claims)?;

    product_queries::find_by_id(&state.db, payload.product_id)
        .await?
        .filter(|product| product.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let item = wishlist_queries::add_item(&state.db, user_id, payload.product_id).await?;

    Ok(Json(item))
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    let user_id = extract_user_id(&claims)?;

    if wishlist_queries::remove_item(&state.db, user_id, product_id).await? == 0 {
        return Err(AppError::NotFound(
            "Product is not on the wishlist".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
