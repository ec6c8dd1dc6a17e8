//! Content-addressed store for raw response bodies.
//!
//! Bodies live at `<sha256-hex>.html` with a JSON sidecar at
//! `<sha256-hex>.json`. Identical bytes hash identically, so a pre-existing
//! file at a hash is never overwritten and writes are safe to repeat.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fsio;
use crate::models::RawDocument;

/// Sidecar metadata written once per content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMeta {
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub status: i32,
    pub headers: BTreeMap<String, String>,
    pub content_hash: String,
    pub raw_html_path: String,
}

/// Directory of content-addressed raw HTML bodies.
#[derive(Debug, Clone)]
pub struct ContentStore {
    raw_dir: PathBuf,
}

impl ContentStore {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self { raw_dir: raw_dir.into() }
    }

    /// Path of the body file for `content_hash`.
    pub fn html_path(&self, content_hash: &str) -> PathBuf {
        self.raw_dir.join(format!("{content_hash}.html"))
    }

    /// Path of the sidecar metadata for `content_hash`.
    pub fn meta_path(&self, content_hash: &str) -> PathBuf {
        self.raw_dir.join(format!("{content_hash}.json"))
    }

    /// Save raw HTML and its sidecar by content hash. Idempotent:
    /// a file that already exists at that hash is left untouched.
    pub fn persist(
        &self, body: &[u8], content_hash: &str, url: &str, fetched_at: DateTime<Utc>, status: i32,
        headers: &BTreeMap<String, String>,
    ) -> Result<(PathBuf, PathBuf), Error> {
        fs::create_dir_all(&self.raw_dir)?;

        let html_path = self.html_path(content_hash);
        let meta_path = self.meta_path(content_hash);

        if !html_path.exists() {
            fs::write(&html_path, body)?;
            tracing::info!("saved HTML: {} ({} bytes)", html_path.display(), body.len());
        }

        if !meta_path.exists() {
            let meta = StoredMeta {
                source_url: url.to_string(),
                fetched_at,
                status,
                headers: headers.clone(),
                content_hash: content_hash.to_string(),
                raw_html_path: html_path.to_string_lossy().replace('\\', "/"),
            };
            fsio::write_json_atomic(&meta_path, &meta)?;
        }

        Ok((html_path, meta_path))
    }

    /// Load a cached body by content hash, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// `Error::MissingPrerequisite` naming the missing path when the body
    /// has not been fetched yet.
    pub fn load_html(&self, content_hash: &str) -> Result<String, Error> {
        let path = self.html_path(content_hash);
        if !path.exists() {
            return Err(Error::MissingPrerequisite(format!(
                "missing raw HTML for hash {content_hash}: {}. Run the fetch step before ETL.",
                path.display()
            )));
        }
        let bytes = fs::read(&path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Write the per-call fetch-attempt manifest: one file per fetch, named
/// with a filesystem-safe UTC timestamp, containing the serialized document.
pub fn write_fetch_manifest(manifests_dir: &Path, doc: &RawDocument) -> Result<PathBuf, Error> {
    let ts = doc.fetched_at.format("%Y-%m-%dT%H-%M-%SZ");
    let path = manifests_dir.join(format!("fetch_{ts}.json"));
    fsio::write_json_atomic(&path, doc)?;
    Ok(path)
}
