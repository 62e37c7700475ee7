use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// DB models

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub audience: String,
    pub product_type: String,
    pub min_price: Decimal,
    pub is_available: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub url: String,
    pub sort_order: i32,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductColor {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub hex_code: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ColorImage {
    pub id: i32,
    pub color_id: i32,
    pub url: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSize {
    pub id: i32,
    pub color_id: i32,
    pub size: String,
    pub sku: String,
    pub mrp: Decimal,
    pub price: Decimal,
    pub stock: i32,
    pub cost_price: Option<Decimal>,
}

// Request types

/// Body of both product create and product update. Every field is optional
/// so an update can carry only what changed; create enforces the required set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub audience: Option<String>,
    pub product_type: Option<String>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub colors: Option<Vec<ColorInput>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ColorInput {
    pub id: Option<i32>,
    pub name: String,
    pub hex_code: Option<String>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<SizeInput>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SizeInput {
    pub size: String,
    pub mrp: Option<Decimal>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub cost_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Newest,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub audience: Option<String>,
    pub product_type: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub available_only: Option<bool>,
    pub is_active: Option<bool>,
    pub sort: Option<SortBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct ColorDetail {
    #[serde(flatten)]
    pub color: ProductColor,
    pub images: Vec<ColorImage>,
    pub sizes: Vec<ProductSize>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub colors: Vec<ColorDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ColorSwatch {
    pub product_id: i32,
    pub name: String,
    pub hex_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product: Product,
    pub primary_image: Option<String>,
    pub colors: Vec<ColorSwatch>,
}

/// URLs of freshly stored product images, ready to be referenced from a
/// product or color payload.
#[derive(Debug, Serialize)]
pub struct ProductImageUploadResponse {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
