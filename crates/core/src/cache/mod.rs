//! Content cache for fetched pages.
//!
//! Two cooperating stores, both under the pipeline's project root:
//!
//! - The URL cache: one JSON document mapping URL to validator tokens and
//!   the last-known content hash, rewritten whole on every update.
//! - The content store: raw bodies addressed by the SHA-256 of their bytes,
//!   with a JSON sidecar per hash. Writes are idempotent.

pub mod hash;
pub mod store;
pub mod url_cache;

pub use hash::sha256_hex;
pub use store::{ContentStore, StoredMeta, write_fetch_manifest};
pub use url_cache::{CacheEntry, URL_CACHE_NAME, UrlCache};
