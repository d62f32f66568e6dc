//! Domain model shared by the lookup pipeline and its consumers.

pub mod category;
pub mod product;
pub mod types;
