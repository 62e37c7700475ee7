use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        AssignVendorRequest, CreateOrderRequest, KycStatus, Order, OrderItem, OrderQuery,
        OrderResponse, OrderSearchResponse, UpdateOrderStatusRequest,
    },
    queries::{order_queries, vendor_queries},
    utils::{extractors::extract_user_id, jwt::Claims},
};

const MAX_LINES_PER_ORDER: usize = 50;
const MAX_QUANTITY_PER_LINE: i32 = 1000;

pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let user_id = extract_user_id(&claims)?;

    validate_order(&payload)?;

    let order = order_queries::create_order(&state.db, user_id, &payload).await?;

    tracing::info!(
        "Order {} placed by user {} ({} items, total {})",
        order.order.id,
        user_id,
        order.items.len(),
        order.order.total_amount
    );

    Ok(Json(order))
}

pub async fn get_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderResponse>>> {
    let user_id = extract_user_id(&claims)?;

    let orders = order_queries::get_user_orders(&state.db, user_id).await?;

    Ok(Json(orders))
}

// ADMIN

pub async fn search_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderQuery>,
) -> Result<Json<OrderSearchResponse>> {
    let orders = order_queries::search_orders(&state.db, &params).await?;

    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderResponse>> {
    let order = order_queries::find_order(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(order))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>> {
    if payload.payment_status.is_none() && payload.fulfillment_status.is_none() {
        return Err(AppError::BadRequest(
            "payment_status or fulfillment_status is required".to_string(),
        ));
    }

    let order = order_queries::update_status(&state.db, id, &payload)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(
        "Order {} now {:?} / {:?}",
        id,
        order.payment_status,
        order.fulfillment_status
    );

    Ok(Json(order))
}

/// Assigns an approved vendor to one order item; `vendor_id: null` unassigns.
pub async fn assign_vendor(
    State(state): State<AppState>,
    Path((order_id, item_id)): Path<(i32, i32)>,
    Json(payload): Json<AssignVendorRequest>,
) -> Result<Json<OrderItem>> {
    if let Some(vendor_id) = payload.vendor_id {
        let vendor = vendor_queries::find_by_id(&state.db, vendor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vendor {} not found", vendor_id)))?;

        if vendor.kyc_status != KycStatus::Approved {
            return Err(AppError::BadRequest(format!(
                "Vendor {} has not passed KYC",
                vendor_id
            )));
        }
    }

    let item = order_queries::assign_vendor(&state.db, order_id, item_id, payload.vendor_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Item {} not found on order {}",
                item_id, order_id
            ))
        })?;

    Ok(Json(item))
}

fn validate_order(payload: &CreateOrderRequest) -> Result<()> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".to_string()));
    }

    if payload.items.len() > MAX_LINES_PER_ORDER {
        return Err(AppError::BadRequest(format!(
            "Order exceeds the limit of {} lines",
            MAX_LINES_PER_ORDER
        )));
    }

    if payload.shipping_address.trim().is_empty() {
        return Err(AppError::BadRequest(
            "shipping_address is required".to_string(),
        ));
    }

    if let Some(line) = payload.items.iter().find(|line| line.quantity <= 0) {
        return Err(AppError::BadRequest(format!(
            "Invalid quantity for product size {}",
            line.product_size_id
        )));
    }

    if let Some(line) = payload
        .items
        .iter()
        .find(|line| line.quantity > MAX_QUANTITY_PER_LINE)
    {
        return Err(AppError::BadRequest(format!(
            "Quantity for product size {} exceeds the limit of {}",
            line.product_size_id, MAX_QUANTITY_PER_LINE
        )));
    }

    Ok(())
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Order {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderLineRequest;

    fn order(address: &str, quantities: &[i32]) -> CreateOrderRequest {
        CreateOrderRequest {
            shipping_address: address.to_string(),
            items: quantities
                .iter()
                .enumerate()
                .map(|(i, &quantity)| OrderLineRequest {
                    product_size_id: i as i32 + 1,
                    quantity,
                    design_image_url: None,
                    mockup_url: None,
                    design_pdf_url: None,
                })
                .collect(),
        }
    }

    #[test]
    fn order_needs_items_address_and_positive_quantities() {
        assert!(validate_order(&order("12 Loom St", &[1, 2])).is_ok());
        assert!(validate_order(&order("12 Loom St", &[])).is_err());
        assert!(validate_order(&order("   ", &[1])).is_err());
        assert!(validate_order(&order("12 Loom St", &[1, 0])).is_err());
    }

    #[test]
    fn quantities_are_capped_per_line() {
        assert!(validate_order(&order("12 Loom St", &[MAX_QUANTITY_PER_LINE])).is_ok());
        assert!(validate_order(&order("12 Loom St", &[MAX_QUANTITY_PER_LINE + 1])).is_err());
        assert!(validate_order(&order("12 Loom St", &[1, i32::MAX])).is_err());
    }
}
