//! Core types and shared functionality for the BNSS pipeline.
//!
//! This crate provides:
//! - URL cache and content-addressed raw HTML store
//! - Unified error types
//! - Configuration structures
//! - Output row models and dataset validation

pub mod cache;
pub mod config;
pub mod error;
pub mod fsio;
pub mod models;
pub mod validate;

pub use cache::{CacheEntry, ContentStore, UrlCache};
pub use config::AppConfig;
pub use error::Error;
pub use models::{BnssSectionIndexRow, CrosswalkRow, RawDocument};
