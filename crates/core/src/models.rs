//! Value models shared across the pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Fixed law tag carried by every section index row.
pub const LAW_TAG: &str = "BNSS";

/// The result of fetching a single URL.
///
/// `status` is the HTTP status code; negative sentinel values mark
/// transport-level failures that never produced a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub status: i32,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub as_of: Option<String>,

    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub raw_html_path: Option<String>,
    #[serde(default)]
    pub raw_meta_path: Option<String>,

    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub cached_content_hash: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl RawDocument {
    /// A minimal document with no body-derived fields set.
    pub fn new(source_url: impl Into<String>, fetched_at: DateTime<Utc>, status: i32) -> Self {
        Self {
            source_url: source_url.into(),
            fetched_at,
            status,
            headers: BTreeMap::new(),
            as_of: None,
            content_hash: None,
            raw_html_path: None,
            raw_meta_path: None,
            etag: None,
            last_modified: None,
            cached_content_hash: None,
            error: None,
        }
    }

    /// True when the fetch was successful (2xx/3xx, including 304).
    pub fn is_success(&self) -> bool {
        (100..400).contains(&self.status)
    }

    /// Whichever content hash is available: direct, then cached, then none.
    ///
    /// This is the single value the ETL step resolves to locate the
    /// cached body.
    pub fn effective_hash(&self) -> Option<&str> {
        self.content_hash.as_deref().or(self.cached_content_hash.as_deref())
    }
}

/// A single section from the BNSS index page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BnssSectionIndexRow {
    pub canonical_id: String,
    pub law: String,
    pub chapter_no: u32,
    pub chapter_title: String,
    pub section_no: u32,
    pub section_title: String,
    pub source_url: String,
    pub content_hash: String,
    pub version: String,
}

impl BnssSectionIndexRow {
    /// Build a row, deriving the canonical id from chapter and section numbers.
    pub fn new(
        chapter_no: u32, chapter_title: impl Into<String>, section_no: u32, section_title: impl Into<String>,
        source_url: impl Into<String>, content_hash: impl Into<String>, version: impl Into<String>,
    ) -> Self {
        Self {
            canonical_id: canonical_id(chapter_no, section_no),
            law: LAW_TAG.to_string(),
            chapter_no,
            chapter_title: chapter_title.into(),
            section_no,
            section_title: section_title.into(),
            source_url: source_url.into(),
            content_hash: content_hash.into(),
            version: version.into(),
        }
    }
}

/// Maps a BNSS section to its corresponding CrPC section.
///
/// Section references stay opaque strings because the crosswalk table mixes
/// bare integers with sub-section notation like `497(2)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrosswalkRow {
    pub bnss_section_no: String,
    #[serde(default)]
    pub bnss_section_title: Option<String>,
    #[serde(default)]
    pub crpc_section_no: Option<String>,
    #[serde(default)]
    pub crpc_section_title: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    pub source_url: String,
    pub content_hash: String,
    pub version: String,
}

/// Generate a canonical ID like `BNSS:CH01:S001`.
pub fn canonical_id(chapter_no: u32, section_no: u32) -> String {
    format!("{LAW_TAG}:CH{chapter_no:02}:S{section_no:03}")
}

/// Validate that `as_of` is a `YYYY-MM-DD` date string.
pub fn validate_as_of(as_of: &str) -> Result<&str, Error> {
    NaiveDate::parse_from_str(as_of, "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput("as_of must be in YYYY-MM-DD format".into()))?;
    Ok(as_of)
}
