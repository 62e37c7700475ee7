use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fulfillment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Placed,
    InProduction,
    Shipped,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    /// Forward-only progression; cancellation is allowed until shipping.
    pub fn can_transition_to(self, next: FulfillmentStatus) -> bool {
        use FulfillmentStatus::*;

        match (self, next) {
            (a, b) if a == b => true,
            (Placed, InProduction) | (InProduction, Shipped) | (Shipped, Delivered) => true,
            (Placed, Cancelled) | (InProduction, Cancelled) => true,
            _ => false,
        }
    }
}

// DB models

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_size_id: Option<i32>,
    pub vendor_id: Option<i32>,
    pub sku: String,
    pub product_name: String,
    pub color_name: String,
    pub size: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub design_image_url: Option<String>,
    pub mockup_url: Option<String>,
    pub design_pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A size row joined with its color and product, priced for an order line.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PurchasableSize {
    pub size_id: i32,
    pub sku: String,
    pub size: String,
    pub price: Decimal,
    pub stock: i32,
    pub color_name: String,
    pub product_name: String,
    pub product_active: bool,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_size_id: i32,
    pub quantity: i32,
    pub design_image_url: Option<String>,
    pub mockup_url: Option<String>,
    pub design_pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub user_id: Option<i32>,
    pub payment_status: Option<PaymentStatus>,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub payment_status: Option<PaymentStatus>,
    pub fulfillment_status: Option<FulfillmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AssignVendorRequest {
    pub vendor_id: Option<i32>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
pub struct OrderSearchResponse {
    pub orders: Vec<OrderResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::FulfillmentStatus::*;

    #[test]
    fn fulfillment_moves_forward_only() {
        assert!(Placed.can_transition_to(InProduction));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Placed.can_transition_to(Placed));
        assert!(!Delivered.can_transition_to(Shipped));
        assert!(!Placed.can_transition_to(Delivered));
    }

    #[test]
    fn cancellation_stops_at_shipping() {
        assert!(Placed.can_transition_to(Cancelled));
        assert!(InProduction.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Placed));
    }
}
