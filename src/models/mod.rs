mod graphic;
mod jersey;
mod order;
mod product;
mod sticker;
mod user;
mod vendor;
mod wishlist;

pub use graphic::*;
pub use jersey::*;
pub use order::*;
pub use product::*;
pub use sticker::*;
pub use user::*;
pub use vendor::*;
pub use wishlist::*;
