use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{
        ColorDetail, ColorImage, ColorInput, ColorSwatch, Product, ProductColor, ProductDetail,
        ProductImage, ProductListResponse, ProductPayload, ProductQuery, ProductSize,
        ProductSummary, SizeInput, SortBy,
    },
    services::variant_service::{self, ColorAction, NewProduct, Pricing, normalize_size_label},
    utils::sku::generate_sku,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogScope {
    /// Storefront: active products only.
    Public,
    /// Admin dashboard: everything, optionally filtered by `is_active`.
    Admin,
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

/// Product with images, colors, color images and sizes. Images and colors
/// follow `sort_order`; sizes are ordered by price.
pub async fn find_detail(pool: &PgPool, id: i32) -> Result<Option<ProductDetail>> {
    let Some(product) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = $1 ORDER BY sort_order, id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let colors = sqlx::query_as::<_, ProductColor>(
        "SELECT * FROM product_colors WHERE product_id = $1 ORDER BY sort_order, id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let color_ids: Vec<i32> = colors.iter().map(|c| c.id).collect();

    let color_images = sqlx::query_as::<_, ColorImage>(
        "SELECT * FROM color_images WHERE color_id = ANY($1) ORDER BY color_id, sort_order, id",
    )
    .bind(&color_ids)
    .fetch_all(pool)
    .await?;

    let sizes = sqlx::query_as::<_, ProductSize>(
        "SELECT * FROM product_sizes WHERE color_id = ANY($1) ORDER BY price ASC, size ASC",
    )
    .bind(&color_ids)
    .fetch_all(pool)
    .await?;

    let mut images_map: HashMap<i32, Vec<ColorImage>> = HashMap::new();
    for image in color_images {
        images_map.entry(image.color_id).or_default().push(image);
    }

    let mut sizes_map: HashMap<i32, Vec<ProductSize>> = HashMap::new();
    for size in sizes {
        sizes_map.entry(size.color_id).or_default().push(size);
    }

    let colors = colors
        .into_iter()
        .map(|color| ColorDetail {
            images: images_map.remove(&color.id).unwrap_or_default(),
            sizes: sizes_map.remove(&color.id).unwrap_or_default(),
            color,
        })
        .collect();

    Ok(Some(ProductDetail {
        product,
        images,
        colors,
    }))
}

pub async fn search_products(
    pool: &PgPool,
    params: &ProductQuery,
    scope: CatalogScope,
) -> Result<ProductListResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT p.*, COUNT(*) OVER() AS total_count FROM products p WHERE 1=1");

    match scope {
        CatalogScope::Public => {
            query.push(" AND p.is_active = true");
        }
        CatalogScope::Admin => {
            if let Some(is_active) = params.is_active {
                query.push(" AND p.is_active = ");
                query.push_bind(is_active);
            }
        }
    }

    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        query.push(" AND (p.name ILIKE ");
        query.push_bind(format!("%{}%", q));
        query.push(" OR p.description ILIKE ");
        query.push_bind(format!("%{}%", q));
        query.push(")");
    }

    if let Some(ref audience) = params.audience {
        query.push(" AND LOWER(p.audience) = LOWER(");
        query.push_bind(audience);
        query.push(")");
    }

    if let Some(ref product_type) = params.product_type {
        query.push(" AND LOWER(p.product_type) = LOWER(");
        query.push_bind(product_type);
        query.push(")");
    }

    if let Some(ref color) = params.color {
        query.push(
            " AND EXISTS (SELECT 1 FROM product_colors pc WHERE pc.product_id = p.id AND LOWER(pc.name) = LOWER(",
        );
        query.push_bind(color);
        query.push("))");
    }

    if let Some(min_price) = params.min_price {
        query.push(" AND p.min_price >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = params.max_price {
        query.push(" AND p.min_price <= ");
        query.push_bind(max_price);
    }

    if params.available_only.unwrap_or(false) {
        query.push(" AND p.is_available = true");
    }

    query.push(match params.sort.unwrap_or(SortBy::Newest) {
        SortBy::Newest => " ORDER BY p.created_at DESC, p.id DESC",
        SortBy::PriceAsc => " ORDER BY p.min_price ASC, p.id ASC",
        SortBy::PriceDesc => " ORDER BY p.min_price DESC, p.id ASC",
    });

    query.push(" LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        product: Product,
        total_count: i64,
    }

    let results = query
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let products = results.into_iter().map(|r| r.product).collect();

    Ok(ProductListResponse {
        products: summarize(pool, products).await?,
        total,
        limit,
        offset,
    })
}

/// Attaches the primary image and color swatches to each product.
pub async fn summarize(pool: &PgPool, products: Vec<Product>) -> Result<Vec<ProductSummary>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();

    let primary_images: Vec<(i32, String)> = sqlx::query_as(
        "SELECT product_id, url FROM product_images WHERE product_id = ANY($1) AND is_primary = true",
    )
    .bind(&product_ids)
    .fetch_all(pool)
    .await?;

    let swatches = sqlx::query_as::<_, ColorSwatch>(
        "SELECT product_id, name, hex_code FROM product_colors
         WHERE product_id = ANY($1)
         ORDER BY product_id, sort_order, id",
    )
    .bind(&product_ids)
    .fetch_all(pool)
    .await?;

    let mut images_map: HashMap<i32, String> = primary_images.into_iter().collect();
    let mut swatch_map: HashMap<i32, Vec<ColorSwatch>> = HashMap::new();
    for swatch in swatches {
        swatch_map.entry(swatch.product_id).or_default().push(swatch);
    }

    Ok(products
        .into_iter()
        .map(|product| ProductSummary {
            primary_image: images_map.remove(&product.id),
            colors: swatch_map.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect())
}

/// Inserts the product and its whole variant tree in one transaction.
pub async fn create_product(pool: &PgPool, new: &NewProduct<'_>) -> Result<i32> {
    let mut tx = pool.begin().await?;

    let product_id: i32 = sqlx::query_scalar(
        "INSERT INTO products (name, description, audience, product_type, min_price, is_available, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(new.name)
    .bind(new.description.map(str::trim).filter(|d| !d.is_empty()))
    .bind(new.audience)
    .bind(new.product_type)
    .bind(new.pricing.min_price)
    .bind(new.pricing.is_available)
    .bind(new.is_active)
    .fetch_one(&mut *tx)
    .await?;

    replace_product_images(&mut tx, product_id, new.images).await?;

    for (index, color) in new.colors.iter().enumerate() {
        let color_id = insert_color(&mut tx, product_id, color, index).await?;

        if let Some(images) = color.images.as_deref() {
            replace_color_images(&mut tx, color_id, images).await?;
        }

        for size in color.sizes.as_deref().unwrap_or_default() {
            insert_size(&mut tx, product_id, color_id, &color.name, size).await?;
        }
    }

    tx.commit().await?;

    tracing::info!(
        "Created product {} with {} colors",
        product_id,
        new.colors.len()
    );

    Ok(product_id)
}

/// Applies a (possibly partial) product payload. Colors are matched by id,
/// sizes by label within their color. All writes share one transaction, so
/// any failure leaves the stored product exactly as it was.
///
/// Returns `false` when the product does not exist.
pub async fn update_product(pool: &PgPool, id: i32, payload: &ProductPayload) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let locked: Option<i32> =
        sqlx::query_scalar("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    if locked.is_none() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE products
        SET
            name = COALESCE($2, name),
            description = CASE WHEN $3::text IS NULL THEN description ELSE NULLIF($3, '') END,
            audience = COALESCE($4, audience),
            product_type = COALESCE($5, product_type),
            is_active = COALESCE($6, is_active),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.description.as_deref().map(str::trim))
    .bind(payload.audience.as_deref().map(str::trim))
    .bind(payload.product_type.as_deref().map(str::trim))
    .bind(payload.is_active)
    .execute(&mut *tx)
    .await?;

    if let Some(images) = payload.images.as_deref() {
        sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        replace_product_images(&mut tx, id, images).await?;
    }

    if let Some(colors) = payload.colors.as_deref() {
        reconcile_colors(&mut tx, id, colors).await?;
        let pricing = recompute_pricing(&mut tx, id).await?;

        tracing::debug!(
            "Product {} repriced: min_price={}, is_available={}",
            id,
            pricing.min_price,
            pricing.is_available
        );
    }

    tx.commit().await?;

    tracing::info!("Updated product {}", id);

    Ok(true)
}

async fn reconcile_colors(
    conn: &mut PgConnection,
    product_id: i32,
    colors: &[ColorInput],
) -> Result<()> {
    let existing = sqlx::query_as::<_, ProductColor>(
        "SELECT * FROM product_colors WHERE product_id = $1 ORDER BY sort_order, id FOR UPDATE",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let plan = variant_service::plan_colors(&existing, colors)?;

    // Dropped colors go first so their names are free for the rest of the loop.
    if !plan.removed.is_empty() {
        let deleted = sqlx::query("DELETE FROM product_colors WHERE id = ANY($1)")
            .bind(&plan.removed)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        tracing::debug!("Removed {} colors from product {}", deleted, product_id);
    }

    for (index, action) in plan.actions.into_iter().enumerate() {
        let (color_id, input) = match action {
            ColorAction::Update { id, input } => {
                sqlx::query(
                    "UPDATE product_colors SET name = $2, hex_code = $3, sort_order = $4 WHERE id = $1",
                )
                .bind(id)
                .bind(input.name.trim())
                .bind(input.hex_code.as_deref())
                .bind(index as i32)
                .execute(&mut *conn)
                .await?;
                (id, input)
            }
            ColorAction::Create { input } => {
                let id = insert_color(&mut *conn, product_id, input, index).await?;
                (id, input)
            }
        };

        if let Some(images) = input.images.as_deref() {
            sqlx::query("DELETE FROM color_images WHERE color_id = $1")
                .bind(color_id)
                .execute(&mut *conn)
                .await?;
            replace_color_images(&mut *conn, color_id, images).await?;
        }

        if let Some(sizes) = input.sizes.as_deref() {
            reconcile_sizes(&mut *conn, product_id, color_id, &input.name, sizes).await?;
        }
    }

    Ok(())
}

async fn reconcile_sizes(
    conn: &mut PgConnection,
    product_id: i32,
    color_id: i32,
    color_name: &str,
    sizes: &[SizeInput],
) -> Result<()> {
    let existing =
        sqlx::query_as::<_, ProductSize>("SELECT * FROM product_sizes WHERE color_id = $1")
            .bind(color_id)
            .fetch_all(&mut *conn)
            .await?;

    let removed = variant_service::removed_sizes(&existing, sizes);
    if !removed.is_empty() {
        sqlx::query("DELETE FROM product_sizes WHERE id = ANY($1)")
            .bind(&removed)
            .execute(&mut *conn)
            .await?;
    }

    for size in sizes {
        let updated = sqlx::query(
            "UPDATE product_sizes SET mrp = $3, price = $4, stock = $5, cost_price = $6
             WHERE color_id = $1 AND size = $2",
        )
        .bind(color_id)
        .bind(normalize_size_label(&size.size))
        .bind(size.mrp.unwrap_or(size.price))
        .bind(size.price)
        .bind(size.stock)
        .bind(size.cost_price)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if updated == 0 {
            insert_size(&mut *conn, product_id, color_id, color_name, size).await?;
        }
    }

    Ok(())
}

/// Recomputes `min_price` / `is_available` from every size of the product.
async fn recompute_pricing(conn: &mut PgConnection, product_id: i32) -> Result<Pricing> {
    let (min_price, is_available): (Decimal, bool) = sqlx::query_as(
        r#"
        UPDATE products p
        SET
            min_price = COALESCE(s.min_price, 0),
            is_available = COALESCE(s.available, false),
            updated_at = NOW()
        FROM (
            SELECT MIN(ps.price) AS min_price, BOOL_OR(ps.stock > 0) AS available
            FROM product_sizes ps
            JOIN product_colors pc ON pc.id = ps.color_id
            WHERE pc.product_id = $1
        ) s
        WHERE p.id = $1
        RETURNING p.min_price, p.is_available
        "#,
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Pricing {
        min_price,
        is_available,
    })
}

async fn insert_color(
    conn: &mut PgConnection,
    product_id: i32,
    color: &ColorInput,
    sort_order: usize,
) -> Result<i32> {
    let id = sqlx::query_scalar(
        "INSERT INTO product_colors (product_id, name, hex_code, sort_order)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(product_id)
    .bind(color.name.trim())
    .bind(color.hex_code.as_deref())
    .bind(sort_order as i32)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

async fn insert_size(
    conn: &mut PgConnection,
    product_id: i32,
    color_id: i32,
    color_name: &str,
    size: &SizeInput,
) -> Result<()> {
    let label = normalize_size_label(&size.size);

    sqlx::query(
        "INSERT INTO product_sizes (color_id, size, sku, mrp, price, stock, cost_price)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(color_id)
    .bind(&label)
    .bind(generate_sku(product_id, color_name, &label))
    .bind(size.mrp.unwrap_or(size.price))
    .bind(size.price)
    .bind(size.stock)
    .bind(size.cost_price)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Bulk insert; index 0 becomes the primary image.
async fn replace_product_images(
    conn: &mut PgConnection,
    product_id: i32,
    urls: &[String],
) -> Result<()> {
    if urls.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO product_images (product_id, url, sort_order, is_primary)
         SELECT $1, u.url, (u.ord - 1)::int, u.ord = 1
         FROM UNNEST($2::text[]) WITH ORDINALITY AS u(url, ord)",
    )
    .bind(product_id)
    .bind(urls)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn replace_color_images(conn: &mut PgConnection, color_id: i32, urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO color_images (color_id, url, sort_order)
         SELECT $1, u.url, (u.ord - 1)::int
         FROM UNNEST($2::text[]) WITH ORDINALITY AS u(url, ord)",
    )
    .bind(color_id)
    .bind(urls)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn set_active(pool: &PgPool, id: i32, is_active: bool) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
