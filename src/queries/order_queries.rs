use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        CreateOrderRequest, Order, OrderItem, OrderLineRequest, OrderQuery, OrderResponse,
        OrderSearchResponse, PurchasableSize, UpdateOrderStatusRequest,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// An order line resolved against the locked size row.
#[derive(Debug, Clone)]
struct PricedLine<'a> {
    line: &'a OrderLineRequest,
    size: &'a PurchasableSize,
}

/// Checks availability against the total demand per size and sums the order.
fn price_lines<'a>(
    lines: &'a [OrderLineRequest],
    sizes: &'a HashMap<i32, PurchasableSize>,
) -> Result<(Decimal, Vec<PricedLine<'a>>)> {
    let mut demand: HashMap<i32, i32> = HashMap::new();
    for line in lines {
        let entry = demand.entry(line.product_size_id).or_insert(0);
        *entry = entry.checked_add(line.quantity).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Quantity for product size {} is too large",
                line.product_size_id
            ))
        })?;
    }

    let mut total = Decimal::ZERO;
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let size = sizes.get(&line.product_size_id).ok_or_else(|| {
            AppError::NotFound(format!("Product size {} not found", line.product_size_id))
        })?;

        if !size.product_active {
            return Err(AppError::BadRequest(format!(
                "{} is no longer available",
                size.product_name
            )));
        }

        if size.stock < demand[&line.product_size_id] {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {} ({} / {})",
                size.product_name, size.color_name, size.size
            )));
        }

        total += size.price * Decimal::from(line.quantity);
        priced.push(PricedLine { line, size });
    }

    Ok((total, priced))
}

pub async fn create_order(
    pool: &PgPool,
    user_id: i32,
    req: &CreateOrderRequest,
) -> Result<OrderResponse> {
    let mut tx = pool.begin().await?;

    let size_ids: Vec<i32> = req.items.iter().map(|i| i.product_size_id).collect();

    let sizes: HashMap<i32, PurchasableSize> = sqlx::query_as::<_, PurchasableSize>(
        "SELECT ps.id AS size_id, ps.sku, ps.size, ps.price, ps.stock,
                pc.name AS color_name, p.name AS product_name, p.is_active AS product_active
         FROM product_sizes ps
         JOIN product_colors pc ON pc.id = ps.color_id
         JOIN products p ON p.id = pc.product_id
         WHERE ps.id = ANY($1)
         FOR UPDATE OF ps",
    )
    .bind(&size_ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|s| (s.size_id, s))
    .collect();

    let (total, priced) = price_lines(&req.items, &sizes)?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (user_id, total_amount, shipping_address)
         VALUES ($1, $2, $3)
         RETURNING *",
    )
    .bind(user_id)
    .bind(total)
    .bind(req.shipping_address.trim())
    .fetch_one(&mut *tx)
    .await?;

    let line_size_ids: Vec<i32> = priced.iter().map(|p| p.size.size_id).collect();
    let skus: Vec<&str> = priced.iter().map(|p| p.size.sku.as_str()).collect();
    let product_names: Vec<&str> = priced.iter().map(|p| p.size.product_name.as_str()).collect();
    let color_names: Vec<&str> = priced.iter().map(|p| p.size.color_name.as_str()).collect();
    let size_labels: Vec<&str> = priced.iter().map(|p| p.size.size.as_str()).collect();
    let quantities: Vec<i32> = priced.iter().map(|p| p.line.quantity).collect();
    let prices: Vec<Decimal> = priced.iter().map(|p| p.size.price).collect();
    let design_images: Vec<Option<&str>> = priced
        .iter()
        .map(|p| p.line.design_image_url.as_deref())
        .collect();
    let mockups: Vec<Option<&str>> = priced.iter().map(|p| p.line.mockup_url.as_deref()).collect();
    let pdfs: Vec<Option<&str>> = priced
        .iter()
        .map(|p| p.line.design_pdf_url.as_deref())
        .collect();

    let items = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, product_size_id, sku, product_name, color_name, size,
                                  quantity, unit_price, design_image_url, mockup_url, design_pdf_url)
         SELECT $1, * FROM UNNEST($2::int[], $3::varchar[], $4::varchar[], $5::varchar[], $6::varchar[],
                                  $7::int[], $8::numeric[], $9::text[], $10::text[], $11::text[])
         RETURNING *",
    )
    .bind(order.id)
    .bind(&line_size_ids)
    .bind(&skus)
    .bind(&product_names)
    .bind(&color_names)
    .bind(&size_labels)
    .bind(&quantities)
    .bind(&prices)
    .bind(&design_images)
    .bind(&mockups)
    .bind(&pdfs)
    .fetch_all(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE product_sizes ps SET stock = ps.stock - d.qty
         FROM (SELECT id, SUM(qty)::int AS qty FROM UNNEST($1::int[], $2::int[]) AS u(id, qty) GROUP BY id) d
         WHERE ps.id = d.id",
    )
    .bind(&line_size_ids)
    .bind(&quantities)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE products p
         SET is_available = EXISTS (
                 SELECT 1 FROM product_sizes ps
                 JOIN product_colors pc ON pc.id = ps.color_id
                 WHERE pc.product_id = p.id AND ps.stock > 0
             ),
             updated_at = NOW()
         WHERE p.id IN (
             SELECT pc.product_id FROM product_colors pc
             JOIN product_sizes ps ON ps.color_id = pc.id
             WHERE ps.id = ANY($1)
         )",
    )
    .bind(&line_size_ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Order {} placed by user {} for {}",
        order.id,
        user_id,
        order.total_amount
    );

    Ok(OrderResponse { order, items })
}

pub async fn get_user_orders(pool: &PgPool, user_id: i32) -> Result<Vec<OrderResponse>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    attach_items(pool, orders).await
}

pub async fn find_order(pool: &PgPool, id: i32) -> Result<Option<OrderResponse>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match order {
        Some(order) => Ok(attach_items(pool, vec![order]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn search_orders(pool: &PgPool, params: &OrderQuery) -> Result<OrderSearchResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT *, COUNT(*) OVER() as total_count FROM orders WHERE 1=1",
    );

    if let Some(user_id) = params.user_id {
        query_builder.push(" AND user_id = ");
        query_builder.push_bind(user_id);
    }

    if let Some(payment_status) = params.payment_status {
        query_builder.push(" AND payment_status = ");
        query_builder.push_bind(payment_status);
    }

    if let Some(fulfillment_status) = params.fulfillment_status {
        query_builder.push(" AND fulfillment_status = ");
        query_builder.push_bind(fulfillment_status);
    }

    query_builder.push(" ORDER BY created_at DESC, id DESC");
    query_builder.push(" LIMIT ");
    query_builder.push_bind(limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        order: Order,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let orders: Vec<Order> = results.into_iter().map(|r| r.order).collect();

    Ok(OrderSearchResponse {
        orders: attach_items(pool, orders).await?,
        total,
        limit,
        offset,
    })
}

async fn attach_items(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderResponse>> {
    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();

    let all_items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id",
    )
    .bind(&order_ids)
    .fetch_all(pool)
    .await?;

    let mut items_map: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in all_items {
        items_map.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_map.remove(&order.id).unwrap_or_default();
            OrderResponse { order, items }
        })
        .collect())
}

/// Updates payment and/or fulfillment status. Fulfillment may only move
/// forward (see `FulfillmentStatus::can_transition_to`).
pub async fn update_status(
    pool: &PgPool,
    id: i32,
    req: &UpdateOrderStatusRequest,
) -> Result<Option<Order>> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(current) = current else {
        return Ok(None);
    };

    if let Some(next) = req.fulfillment_status {
        if !current.fulfillment_status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Cannot move order {} from {:?} to {:?}",
                id, current.fulfillment_status, next
            )));
        }
    }

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders
         SET payment_status = COALESCE($2, payment_status),
             fulfillment_status = COALESCE($3, fulfillment_status),
             updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(req.payment_status)
    .bind(req.fulfillment_status)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(order))
}

pub async fn assign_vendor(
    pool: &PgPool,
    order_id: i32,
    item_id: i32,
    vendor_id: Option<i32>,
) -> Result<Option<OrderItem>> {
    let item = sqlx::query_as::<_, OrderItem>(
        "UPDATE order_items SET vendor_id = $3 WHERE id = $2 AND order_id = $1 RETURNING *",
    )
    .bind(order_id)
    .bind(item_id)
    .bind(vendor_id)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn line(size_id: i32, quantity: i32) -> OrderLineRequest {
        OrderLineRequest {
            product_size_id: size_id,
            quantity,
            design_image_url: None,
            mockup_url: None,
            design_pdf_url: None,
        }
    }

    fn size(id: i32, price: Decimal, stock: i32) -> (i32, PurchasableSize) {
        (
            id,
            PurchasableSize {
                size_id: id,
                sku: format!("SKU-{}", id),
                size: "M".to_string(),
                price,
                stock,
                color_name: "Red".to_string(),
                product_name: "Classic Tee".to_string(),
                product_active: true,
            },
        )
    }

    #[test]
    fn totals_sum_price_times_quantity() {
        let sizes: HashMap<_, _> = [size(1, dec!(299.50), 10), size(2, dec!(100), 3)].into();
        let lines = vec![line(1, 2), line(2, 3)];

        let (total, priced) = price_lines(&lines, &sizes).unwrap();

        assert_eq!(total, dec!(899.00));
        assert_eq!(priced.len(), 2);
    }

    #[test]
    fn stock_is_checked_against_combined_demand() {
        let sizes: HashMap<_, _> = [size(1, dec!(10), 3)].into();
        let lines = vec![line(1, 2), line(1, 2)];

        let err = price_lines(&lines, &sizes).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn overflowing_combined_demand_is_rejected() {
        let sizes: HashMap<_, _> = [size(1, dec!(10), i32::MAX)].into();
        let lines = vec![line(1, i32::MAX), line(1, i32::MAX)];

        let err = price_lines(&lines, &sizes).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_size_is_not_found() {
        let sizes: HashMap<i32, PurchasableSize> = HashMap::new();
        let err = price_lines(&[line(9, 1)], &sizes).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn inactive_products_cannot_be_ordered() {
        let (id, mut s) = size(1, dec!(10), 5);
        s.product_active = false;
        let sizes: HashMap<_, _> = [(id, s)].into();

        assert!(price_lines(&[line(1, 1)], &sizes).is_err());
    }
}
