pub mod batches;
pub mod errors;
pub mod import_export;
pub mod main;
pub mod normalize;
pub mod products;

pub use errors::{ServiceError, ServiceResult};
