pub mod config;
pub mod keepa;
