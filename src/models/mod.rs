pub mod cache;
pub mod payload;
