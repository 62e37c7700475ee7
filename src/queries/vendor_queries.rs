use sqlx::PgPool;

use crate::{
    error::Result,
    models::{KycStatus, KycSubmission, Vendor},
};

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Vendor>> {
    let vendor = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(vendor)
}

pub async fn find_by_user(pool: &PgPool, user_id: i32) -> Result<Option<Vendor>> {
    let vendor = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(vendor)
}

pub async fn list_vendors(pool: &PgPool, status: Option<KycStatus>) -> Result<Vec<Vendor>> {
    let vendors = sqlx::query_as::<_, Vendor>(
        "SELECT * FROM vendors
         WHERE ($1::kyc_status IS NULL OR kyc_status = $1)
         ORDER BY created_at ASC",
    )
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(vendors)
}

/// First submission inserts; a resubmission after rejection overwrites the
/// details and returns the record to `pending`. Returns `None` when a record
/// exists that is not rejected, so a pending or approved vendor is untouched.
pub async fn submit_kyc(
    pool: &PgPool,
    user_id: i32,
    req: &KycSubmission,
) -> Result<Option<Vendor>> {
    let vendor = sqlx::query_as::<_, Vendor>(
        r#"
        INSERT INTO vendors (user_id, business_name, contact_phone, tax_id, address, document_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO UPDATE
        SET
            business_name = EXCLUDED.business_name,
            contact_phone = EXCLUDED.contact_phone,
            tax_id = EXCLUDED.tax_id,
            address = EXCLUDED.address,
            document_url = EXCLUDED.document_url,
            kyc_status = 'pending',
            review_note = NULL,
            reviewed_at = NULL,
            updated_at = NOW()
        WHERE vendors.kyc_status = 'rejected'
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(req.business_name.trim())
    .bind(req.contact_phone.trim())
    .bind(req.tax_id.trim().to_uppercase())
    .bind(req.address.trim())
    .bind(&req.document_url)
    .fetch_optional(pool)
    .await?;

    Ok(vendor)
}

pub async fn review_kyc(
    pool: &PgPool,
    id: i32,
    status: KycStatus,
    note: Option<&str>,
) -> Result<Option<Vendor>> {
    let vendor = sqlx::query_as::<_, Vendor>(
        "UPDATE vendors
         SET kyc_status = $2, review_note = $3, reviewed_at = NOW(), updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(note)
    .fetch_optional(pool)
    .await?;

    Ok(vendor)
}
