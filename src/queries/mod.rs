pub mod graphic_queries;
pub mod order_queries;
pub mod product_queries;
pub mod sticker_queries;
pub mod user_queries;
pub mod vendor_queries;
pub mod wishlist_queries;
