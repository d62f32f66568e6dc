pub mod import_export;
pub mod products;
