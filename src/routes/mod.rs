mod admin_products;
mod auth;
mod graphics;
mod health;
mod jersey;
mod orders;
mod products;
mod sticker_categories;
mod stickers;
mod vendors;
mod wishlist;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};

use crate::{
    AppState,
    middleware::{admin_middleware, auth_middleware},
    services::upload_service::{
        MAX_FILE_BYTES, MAX_GRAPHICS_PER_UPLOAD, MAX_PRODUCT_IMAGES_PER_UPLOAD,
        MAX_STICKERS_PER_UPLOAD,
    },
};

/// Multipart overhead allowance on top of the raw file bytes.
const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

fn upload_body_limit(max_files: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_files * MAX_FILE_BYTES + MULTIPART_SLACK_BYTES)
}

pub fn create_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/register", post(auth::register_user))
        .route("/auth/login", post(auth::login_user))
        .route("/products", get(products::search_products))
        .route("/products/{id}", get(products::get_product))
        .route("/stickers", get(stickers::list_public_stickers))
        .route("/stickers/{id}/use", post(stickers::use_sticker))
        .route("/graphics", get(graphics::list_graphics));

    let authenticated = Router::new()
        .route("/api/jersey/generate", post(jersey::generate_jersey))
        .route(
            "/wishlist",
            get(wishlist::get_wishlist).post(wishlist::add_to_wishlist),
        )
        .route(
            "/wishlist/{product_id}",
            delete(wishlist::remove_from_wishlist),
        )
        .route("/orders", post(orders::create_order).get(orders::get_my_orders))
        .route("/vendors/kyc", post(vendors::submit_kyc))
        .route("/vendors/me", get(vendors::get_my_vendor))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route(
            "/admin/products",
            post(admin_products::create_product).get(admin_products::list_products),
        )
        .route(
            "/admin/products/{id}",
            get(admin_products::get_product)
                .put(admin_products::update_product)
                .delete(admin_products::delete_product),
        )
        .route(
            "/admin/products/{id}/status",
            patch(admin_products::update_product_status),
        )
        .route(
            "/admin/products/{id}/images",
            post(admin_products::upload_product_images)
                .layer(upload_body_limit(MAX_PRODUCT_IMAGES_PER_UPLOAD)),
        )
        .route(
            "/admin/sticker-categories",
            get(sticker_categories::list_categories).post(sticker_categories::create_category),
        )
        .route(
            "/admin/sticker-categories/{id}",
            patch(sticker_categories::update_category).delete(sticker_categories::delete_category),
        )
        .route("/admin/stickers", get(stickers::list_stickers))
        .route(
            "/admin/stickers/upload",
            post(stickers::upload_stickers).layer(upload_body_limit(MAX_STICKERS_PER_UPLOAD)),
        )
        .route("/admin/stickers/{id}/toggle", patch(stickers::toggle_sticker))
        .route("/admin/stickers/{id}/category", patch(stickers::move_sticker))
        .route("/admin/stickers/{id}", delete(stickers::delete_sticker))
        .route(
            "/graphics/upload",
            post(graphics::upload_graphics).layer(upload_body_limit(MAX_GRAPHICS_PER_UPLOAD)),
        )
        .route("/graphics/batch-delete", post(graphics::batch_delete_graphics))
        .route("/graphics/{id}", delete(graphics::delete_graphic))
        .route("/admin/orders", get(orders::search_orders))
        .route("/admin/orders/{id}", get(orders::get_order))
        .route(
            "/admin/orders/{id}/status",
            patch(orders::update_order_status),
        )
        .route(
            "/admin/orders/{order_id}/items/{item_id}/vendor",
            patch(orders::assign_vendor),
        )
        .route("/admin/vendors", get(vendors::list_vendors))
        .route("/admin/vendors/{id}/kyc", patch(vendors::review_kyc))
        .route_layer(from_fn_with_state(state, admin_middleware));

    Router::new().merge(public).merge(authenticated).merge(admin)
}
