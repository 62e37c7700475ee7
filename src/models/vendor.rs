use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "kyc_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vendor {
    pub id: i32,
    pub user_id: i32,
    pub business_name: String,
    pub contact_phone: String,
    pub tax_id: String,
    pub address: String,
    pub document_url: Option<String>,
    pub kyc_status: KycStatus,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct KycSubmission {
    pub business_name: String,
    pub contact_phone: String,
    pub tax_id: String,
    pub address: String,
    pub document_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KycReviewRequest {
    pub status: KycStatus,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VendorQuery {
    pub status: Option<KycStatus>,
}
