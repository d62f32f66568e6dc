//! Core library exports for the BSR lookup service.
//!
//! The crate validates Amazon product identifiers, fetches product records
//! from the Keepa API in paced batches and normalizes them into Best Sellers
//! Rank summaries. The `server` feature adds the HTTP surface, the Keepa
//! client and the upload/export helpers on top of the domain types.

#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod error_conversions;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod keepa;
#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "server")]
pub mod models;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;
