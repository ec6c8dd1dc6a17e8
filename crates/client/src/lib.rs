//! Client code for the BNSS pipeline.
//!
//! This crate provides the HTTP ingestion pipeline (conditional GET,
//! content-addressed caching, retry with backoff) and the structural
//! parsers that turn cached HTML into dataset rows.

pub mod fetch;
pub mod parse;

pub use fetch::{FetchClient, RETRY_STATUS};
pub use parse::{parse_crosswalk, parse_index};
