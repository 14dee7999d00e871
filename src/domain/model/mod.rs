pub mod depth;
pub mod order_book;
pub mod price_level;
pub mod zone;
