pub mod image_generation_service;
pub mod storage_service;
pub mod upload_service;
pub mod variant_service;
