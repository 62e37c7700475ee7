//! Router-level tests. Every request here is rejected (or answered) before
//! any database or storage access, so no services need to be running.

mod common;

use http::StatusCode;
use serde_json::json;
use threadline::models::UserRole;
use tower::ServiceExt;

use common::{body_json, empty_request, json_request, multipart_request, test_app, token};

#[tokio::test]
async fn health_reports_ok() {
    let response = test_app()
        .oneshot(empty_request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let response = test_app()
        .oneshot(empty_request("GET", "/wishlist", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["message"].is_string());
}

#[tokio::test]
async fn tokens_signed_with_another_secret_are_rejected() {
    let forged =
        threadline::utils::jwt::generate_token("not-the-secret", 1, "x@y.z", UserRole::Admin)
            .unwrap();

    let response = test_app()
        .oneshot(empty_request("GET", "/admin/orders", Some(forged.as_str())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_cannot_reach_admin_routes() {
    let customer = token(UserRole::Customer);

    let response = test_app()
        .oneshot(empty_request("GET", "/admin/products", Some(customer.as_str())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["message"],
        "Admin access required"
    );
}

#[tokio::test]
async fn graphics_upload_rejects_fifty_one_files() {
    let admin = token(UserRole::Admin);

    let response = test_app()
        .oneshot(multipart_request("/graphics/upload", &admin, &[], 51))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message = body_json(response).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("50"), "unexpected message: {message}");
}

#[tokio::test]
async fn sticker_upload_rejects_fifty_one_files() {
    let admin = token(UserRole::Admin);

    let response = test_app()
        .oneshot(multipart_request(
            "/admin/stickers/upload",
            &admin,
            &[("category_id", "1")],
            51,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_image_upload_rejects_twenty_one_files() {
    let admin = token(UserRole::Admin);

    let response = test_app()
        .oneshot(multipart_request("/admin/products/1/images", &admin, &[], 21))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message = body_json(response).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("20"), "unexpected message: {message}");
}

#[tokio::test]
async fn product_image_upload_is_admin_only() {
    let customer = token(UserRole::Customer);

    let response = test_app()
        .oneshot(multipart_request("/admin/products/1/images", &customer, &[], 1))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn sticker_upload_requires_a_category() {
    let admin = token(UserRole::Admin);

    let response = test_app()
        .oneshot(multipart_request("/admin/stickers/upload", &admin, &[], 2))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "category_id is required"
    );
}

#[tokio::test]
async fn batch_delete_rejects_more_than_one_hundred_ids() {
    let admin = token(UserRole::Admin);
    let ids: Vec<i32> = (1..=101).collect();

    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/graphics/batch-delete",
            Some(admin.as_str()),
            json!({ "ids": ids }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_create_requires_colors_with_sizes() {
    let admin = token(UserRole::Admin);

    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/admin/products",
            Some(admin.as_str()),
            json!({
                "name": "Classic Tee",
                "audience": "unisex",
                "product_type": "t-shirt",
                "colors": [{ "name": "Red", "sizes": [] }]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_update_rejects_duplicate_color_names() {
    let admin = token(UserRole::Admin);

    let response = test_app()
        .oneshot(json_request(
            "PUT",
            "/admin/products/1",
            Some(admin.as_str()),
            json!({
                "colors": [
                    { "id": 1, "name": "Red" },
                    { "name": "red " }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn jersey_generation_requires_a_prompt() {
    let customer = token(UserRole::Customer);

    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/api/jersey/generate",
            Some(customer.as_str()),
            json!({ "prompt": "   ", "customInstructions": "gold trim" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_need_at_least_one_line() {
    let customer = token(UserRole::Customer);

    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/orders",
            Some(customer.as_str()),
            json!({ "shipping_address": "12 Loom St", "items": [] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn kyc_review_cannot_reset_to_pending() {
    let admin = token(UserRole::Admin);

    let response = test_app()
        .oneshot(json_request(
            "PATCH",
            "/admin/vendors/3/kyc",
            Some(admin.as_str()),
            json!({ "status": "pending" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_validates_before_lookup() {
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "no-at-sign", "name": "Ana", "password": "longenough" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
