use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{KycReviewRequest, KycStatus, KycSubmission, Vendor, VendorQuery},
    queries::vendor_queries,
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn submit_kyc(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<KycSubmission>,
) -> Result<Json<Vendor>> {
    let user_id = extract_user_id(&claims)?;

    validate_submission(&payload)?;

    if let Some(existing) = vendor_queries::find_by_user(&state.db, user_id).await? {
        if existing.kyc_status != KycStatus::Rejected {
            return Err(AppError::Conflict(format!(
                "KYC already submitted ({:?})",
                existing.kyc_status
            )));
        }
    }

    let vendor = vendor_queries::submit_kyc(&state.db, user_id, &payload)
        .await?
        .ok_or_else(|| AppError::Conflict("KYC already submitted".to_string()))?;

    tracing::info!("KYC submitted for vendor {} (user {})", vendor.id, user_id);

    Ok(Json(vendor))
}

pub async fn get_my_vendor(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vendor>> {
    let user_id = extract_user_id(&claims)?;

    let vendor = vendor_queries::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No vendor profile for this account".to_string()))?;

    Ok(Json(vendor))
}

// ADMIN

pub async fn list_vendors(
    State(state): State<AppState>,
    Query(params): Query<VendorQuery>,
) -> Result<Json<Vec<Vendor>>> {
    let vendors = vendor_queries::list_vendors(&state.db, params.status).await?;

    Ok(Json(vendors))
}

pub async fn review_kyc(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<KycReviewRequest>,
) -> Result<Json<Vendor>> {
    if payload.status == KycStatus::Pending {
        return Err(AppError::BadRequest(
            "Review status must be approved or rejected".to_string(),
        ));
    }

    let note = payload
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    if payload.status == KycStatus::Rejected && note.is_none() {
        return Err(AppError::BadRequest(
            "A note is required when rejecting KYC".to_string(),
        ));
    }

    let vendor = vendor_queries::review_kyc(&state.db, id, payload.status, note)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vendor {} not found", id)))?;

    tracing::info!("Vendor {} KYC marked {:?}", id, vendor.kyc_status);

    Ok(Json(vendor))
}

fn validate_submission(payload: &KycSubmission) -> Result<()> {
    let required = [
        ("business_name", &payload.business_name),
        ("contact_phone", &payload.contact_phone),
        ("tax_id", &payload.tax_id),
        ("address", &payload.address),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{} is required", field)));
        }
    }

    Ok(())
}
