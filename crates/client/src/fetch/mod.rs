//! HTTP ingestion with conditional GET, content-addressable caching, and retry.
//!
//! ### Conditional GET
//! - Validators from the URL cache become `If-None-Match` / `If-Modified-Since`.
//! - A 304 refreshes validators and reuses the previously stored body.
//! - A 304 with no prior content hash is a cache-inconsistency error,
//!   never retried.
//!
//! ### Retry policy
//! - Statuses {408, 429, 500, 502, 503, 504} and connection-level failures
//!   are transient; everything else terminates the attempt loop.
//! - Exponential backoff per `backoff::retry_delay`, bounded by
//!   `max_attempts` total tries.
//!
//! ### Persistence
//! - Any response with a body is stored content-addressably before the
//!   success/failure branch, so error bodies survive for postmortems.
//! - One fetch-attempt manifest per call.

pub mod backoff;

use std::collections::BTreeMap;
use std::thread;

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use url::Url;

use bnss_core::cache::{sha256_hex, write_fetch_manifest};
use bnss_core::{AppConfig, CacheEntry, ContentStore, Error, RawDocument, UrlCache};

/// HTTP statuses treated as transient failures.
pub const RETRY_STATUS: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Blocking HTTP client for the ingestion step.
///
/// Constructed once and reused across fetches; `fetch_many` is sequential
/// by design, with the politeness delay as the rate-limiting mechanism.
pub struct FetchClient {
    http: Client,
    config: AppConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|e| Error::InvalidInput(format!("invalid accept_language: {e}")))?,
        );

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .default_headers(default_headers)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config: config.clone() })
    }

    /// Fetch a URL with conditional GET, caching, and retry.
    ///
    /// # Errors
    ///
    /// - `Error::HttpStatus` on terminal HTTP errors (non-retryable 4xx, or
    ///   retry budget exhausted on a retryable status). The response body
    ///   and a fetch manifest are still written before this is raised.
    /// - `Error::CacheInconsistent` on 304 without prior cached content.
    /// - `Error::Transport` when the connection itself failed after retries.
    pub fn fetch(&self, url: &str, as_of: Option<&str>) -> Result<RawDocument, Error> {
        // Reject malformed URLs before burning the politeness delay.
        Url::parse(url).map_err(|e| Error::InvalidInput(format!("invalid URL {url}: {e}")))?;
        self.config.ensure_dirs()?;
        let manifests_dir = self.config.manifests_path();
        let store = ContentStore::new(self.config.raw_html_path());

        // Politeness floor: fixed minimum sleep per call.
        thread::sleep(self.config.min_delay());

        let mut url_cache = UrlCache::load(&manifests_dir)?;
        let prior = url_cache.get(url).cloned();
        let cond = conditional_headers(prior.as_ref())?;
        tracing::info!("fetching {} (conditional={})", url, !cond.is_empty());

        let fetched_at = Utc::now();
        let resp = self.send_with_retry(url, &cond)?;
        let status = resp.status().as_u16();
        let headers = normalize_headers(resp.headers());
        let etag = headers.get("etag").cloned();
        let last_modified = headers.get("last-modified").cloned();

        if status == 304 {
            let entry =
                not_modified_entry(url, prior.as_ref(), etag.as_deref(), last_modified.as_deref(), fetched_at)?;
            tracing::info!("not modified (304): {}", url);

            let mut doc = RawDocument::new(url, fetched_at, 304);
            doc.headers = headers;
            doc.as_of = as_of.map(str::to_owned);
            doc.etag = entry.etag.clone();
            doc.last_modified = entry.last_modified.clone();
            doc.cached_content_hash = entry.last_hash.clone();

            url_cache.insert(url, entry);
            url_cache.save()?;
            write_fetch_manifest(&manifests_dir, &doc)?;
            return Ok(doc);
        }

        let body = resp
            .bytes()
            .map_err(|e| Error::Transport(format!("failed to read response body from {url}: {e}")))?;
        let content_hash = sha256_hex(&body);
        // Persist before branching so error bodies are cached for audit.
        let (html_path, meta_path) = store.persist(&body, &content_hash, url, fetched_at, i32::from(status), &headers)?;

        let mut doc = RawDocument::new(url, fetched_at, i32::from(status));
        doc.headers = headers;
        doc.as_of = as_of.map(str::to_owned);
        doc.content_hash = Some(content_hash.clone());
        doc.raw_html_path = Some(html_path.to_string_lossy().replace('\\', "/"));
        doc.raw_meta_path = Some(meta_path.to_string_lossy().replace('\\', "/"));
        doc.etag = etag.clone();
        doc.last_modified = last_modified.clone();

        if status >= 400 {
            tracing::error!("HTTP {} for {}", status, url);
            doc.error = Some(format!("HTTP {status} for {url}"));
            write_fetch_manifest(&manifests_dir, &doc)?;
            return Err(Error::HttpStatus { status, url: url.to_string() });
        }

        tracing::info!("fetched OK: {} (hash={})", url, &content_hash[..12]);
        url_cache.insert(
            url,
            CacheEntry {
                etag,
                last_modified,
                last_hash: Some(content_hash),
                last_seen_at: Some(fetched_at.to_rfc3339()),
            },
        );
        url_cache.save()?;
        write_fetch_manifest(&manifests_dir, &doc)?;
        Ok(doc)
    }

    /// Fetch multiple URLs sequentially.
    ///
    /// Terminal HTTP-status failures are converted into failure-flagged
    /// result records so the batch continues; transport-level failures
    /// abort the batch.
    pub fn fetch_many(&self, urls: &[String], as_of: Option<&str>) -> Result<Vec<RawDocument>, Error> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            match self.fetch(url, as_of) {
                Ok(doc) => results.push(doc),
                Err(err @ Error::HttpStatus { .. }) => {
                    tracing::error!("failed to fetch {}: {}", url, err);
                    let status = err.status().map(i32::from).unwrap_or(-1);
                    let mut doc = RawDocument::new(url, Utc::now(), status);
                    doc.as_of = as_of.map(str::to_owned);
                    doc.error = Some(err.to_string());
                    results.push(doc);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(results)
    }

    fn send_with_retry(&self, url: &str, cond: &HeaderMap) -> Result<Response, Error> {
        let mut attempt = 1u32;
        loop {
            let err = match self.http.get(url).headers(cond.clone()).send() {
                Ok(resp) if !RETRY_STATUS.contains(&resp.status().as_u16()) => return Ok(resp),
                Ok(resp) => Error::HttpStatus { status: resp.status().as_u16(), url: url.to_string() },
                Err(e) => Error::Transport(format!("request to {url} failed: {e}")),
            };
            if attempt >= self.config.max_attempts {
                return Err(err);
            }
            let delay = backoff::retry_delay(
                attempt,
                self.config.backoff_min(),
                self.config.backoff_max(),
                self.config.backoff_multiplier,
            );
            tracing::warn!(
                "attempt {}/{} for {} failed ({}); retrying in {:?}",
                attempt,
                self.config.max_attempts,
                url,
                err,
                delay
            );
            thread::sleep(delay);
            attempt += 1;
        }
    }
}

/// Build `If-None-Match` / `If-Modified-Since` headers from the cache entry.
fn conditional_headers(entry: Option<&CacheEntry>) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    if let Some(etag) = entry.and_then(|e| e.etag.as_deref()) {
        headers.insert(
            IF_NONE_MATCH,
            HeaderValue::from_str(etag).map_err(|e| Error::Cache(format!("invalid cached etag: {e}")))?,
        );
    }
    if let Some(last_modified) = entry.and_then(|e| e.last_modified.as_deref()) {
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(last_modified)
                .map_err(|e| Error::Cache(format!("invalid cached last-modified: {e}")))?,
        );
    }
    Ok(headers)
}

/// Lower-cased response headers; values that are not valid UTF-8 are dropped.
fn normalize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

/// The cache entry replacing the prior one after a 304 response.
///
/// Newly returned validators win; absent ones fall back to the stored
/// values. The unchanged content hash is carried forward.
///
/// # Errors
///
/// `Error::CacheInconsistent` when no prior hash exists: retrying cannot
/// fix a missing local record.
fn not_modified_entry(
    url: &str, prior: Option<&CacheEntry>, etag: Option<&str>, last_modified: Option<&str>,
    fetched_at: DateTime<Utc>,
) -> Result<CacheEntry, Error> {
    let Some(last_hash) = prior.and_then(|p| p.last_hash.clone()) else {
        return Err(Error::CacheInconsistent(url.to_string()));
    };
    Ok(CacheEntry {
        etag: etag.map(str::to_owned).or_else(|| prior.and_then(|p| p.etag.clone())),
        last_modified: last_modified.map(str::to_owned).or_else(|| prior.and_then(|p| p.last_modified.clone())),
        last_hash: Some(last_hash),
        last_seen_at: Some(fetched_at.to_rfc3339()),
    })
}
