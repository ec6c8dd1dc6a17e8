//! Per-URL fetch metadata, persisted as a single JSON document.
//!
//! No partial-entry update is exposed: callers load the whole mapping,
//! mutate it in memory, and save it back. The save path uses the atomic
//! temp-then-rename discipline from `fsio`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fsio;

/// File name of the URL cache document inside the manifests directory.
pub const URL_CACHE_NAME: &str = "url_cache.json";

/// Cached metadata for a previously fetched URL.
///
/// If `last_hash` is absent, no successful fetch has ever completed for
/// this URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_hash: Option<String>,
    pub last_seen_at: Option<String>,
}

/// The URL cache document: URL -> `CacheEntry`.
#[derive(Debug)]
pub struct UrlCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl UrlCache {
    /// Load the cache from `manifests_dir`.
    ///
    /// Returns an empty cache if the document does not yet exist.
    /// Tolerates a leading byte-order-mark in the stored file.
    pub fn load(manifests_dir: &Path) -> Result<Self, Error> {
        let path = manifests_dir.join(URL_CACHE_NAME);
        if !path.exists() {
            return Ok(Self { path, entries: BTreeMap::new() });
        }
        let text = fsio::read_to_string_bom(&path)?;
        let entries: BTreeMap<String, CacheEntry> = serde_json::from_str(&text)
            .map_err(|e| Error::Cache(format!("corrupt url cache at {}: {e}", path.display())))?;
        Ok(Self { path, entries })
    }

    /// Serialize the full mapping and write it atomically.
    pub fn save(&self) -> Result<(), Error> {
        fsio::write_json_atomic(&self.path, &self.entries)
    }

    pub fn get(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    /// Overwrite (not merge) the entry for `url`.
    pub fn insert(&mut self, url: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(url.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content hash of the last successful fetch for `url`.
    ///
    /// # Errors
    ///
    /// `Error::Cache` when the URL has no entry or no recorded hash, which
    /// means ingestion has not completed for it yet.
    pub fn latest_hash_for(&self, url: &str) -> Result<&str, Error> {
        self.entries
            .get(url)
            .and_then(|e| e.last_hash.as_deref())
            .ok_or_else(|| Error::Cache(format!("no last_hash in url cache for url={url}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entry(hash: &str) -> CacheEntry {
        CacheEntry {
            etag: Some("\"abc\"".into()),
            last_modified: Some("Mon, 05 Jan 2026 00:00:00 GMT".into()),
            last_hash: Some(hash.into()),
            last_seen_at: Some("2026-01-05T00:00:00Z".into()),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = UrlCache::load(tmp.path()).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = UrlCache::load(tmp.path()).unwrap();
        cache.insert("https://example.com/a", entry("hash-a"));
        cache.save().unwrap();

        let reloaded = UrlCache::load(tmp.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("https://example.com/a"), Some(&entry("hash-a")));
    }

    #[test]
    fn test_insert_overwrites_whole_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = UrlCache::load(tmp.path()).unwrap();
        cache.insert("u", entry("old"));
        cache.insert("u", CacheEntry { last_hash: Some("new".into()), ..Default::default() });

        let e = cache.get("u").unwrap();
        assert_eq!(e.last_hash.as_deref(), Some("new"));
        assert_eq!(e.etag, None);
    }

    #[test]
    fn test_load_tolerates_bom() {
        let tmp = tempfile::tempdir().unwrap();
        let payload = "\u{feff}{\"u\": {\"etag\": null, \"last_modified\": null, \"last_hash\": \"h\", \"last_seen_at\": null}}";
        fs::write(tmp.path().join(URL_CACHE_NAME), payload).unwrap();

        let cache = UrlCache::load(tmp.path()).unwrap();
        assert_eq!(cache.latest_hash_for("u").unwrap(), "h");
    }

    #[test]
    fn test_load_rejects_corrupt_document() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(URL_CACHE_NAME), "not json").unwrap();
        let err = UrlCache::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("CACHE_ERROR"));
    }

    #[test]
    fn test_latest_hash_for_missing_url() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = UrlCache::load(tmp.path()).unwrap();
        let err = cache.latest_hash_for("https://nope").unwrap_err();
        assert!(err.to_string().contains("no last_hash"));
    }

    #[test]
    fn test_latest_hash_for_entry_without_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = UrlCache::load(tmp.path()).unwrap();
        cache.insert("u", CacheEntry::default());
        assert!(cache.latest_hash_for("u").is_err());
    }
}
