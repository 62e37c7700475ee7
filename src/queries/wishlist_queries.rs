use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Product, WishlistItem},
};

/// Wishlisted products, most recently added first. Inactive products are
/// hidden but stay on the list in case they come back.
pub async fn list_products(pool: &PgPool, user_id: i32) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT p.* FROM wishlist_items w
         JOIN products p ON p.id = w.product_id
         WHERE w.user_id = $1 AND p.is_active = true
         ORDER BY w.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

/// Idempotent: adding an existing entry returns it unchanged.
pub async fn add_item(pool: &PgPool, user_id: i32, product_id: i32) -> Result<WishlistItem> {
    let item = sqlx::query_as::<_, WishlistItem>(
        "INSERT INTO wishlist_items (user_id, product_id)
         VALUES ($1, $2)
         ON CONFLICT (user_id, product_id) DO UPDATE SET user_id = EXCLUDED.user_id
         RETURNING *",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

pub async fn remove_item(pool: &PgPool, user_id: i32, product_id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
