//! ETL step: parse cached BNSS HTML into structured JSONL datasets.
//!
//! Read-only with respect to fetched content: bodies are looked up by the
//! hash currently recorded in the URL cache, and the step fails loudly if
//! ingestion has not populated the cache yet.

use std::path::PathBuf;

use bnss_client::parse::{parse_crosswalk, parse_index};
use bnss_core::cache::URL_CACHE_NAME;
use bnss_core::models::validate_as_of;
use bnss_core::validate::{CROSSWALK_DATASET, SECTIONS_DATASET};
use bnss_core::{AppConfig, ContentStore, Error, UrlCache, fsio};

/// Run the full ETL: read cached HTML, parse, write JSONL datasets.
///
/// Returns the paths of the written (sections, crosswalk) datasets.
pub fn run_etl(config: &AppConfig, as_of: &str) -> Result<(PathBuf, PathBuf), Error> {
    validate_as_of(as_of)?;
    let version = format!("bnss@{as_of}");

    let manifests_dir = config.manifests_path();
    let url_cache_path = manifests_dir.join(URL_CACHE_NAME);
    if !url_cache_path.exists() {
        return Err(Error::MissingPrerequisite(format!(
            "missing {}. Run the fetch step before ETL.",
            url_cache_path.display()
        )));
    }
    let url_cache = UrlCache::load(&manifests_dir)?;

    let index_hash = url_cache.latest_hash_for(&config.index_url)?.to_string();
    let table_hash = url_cache.latest_hash_for(&config.section_table_url)?.to_string();

    tracing::info!(
        "loading cached HTML (index={}, table={})",
        index_hash.get(..12).unwrap_or(&index_hash),
        table_hash.get(..12).unwrap_or(&table_hash)
    );

    let store = ContentStore::new(config.raw_html_path());
    let index_html = store.load_html(&index_hash)?;
    let table_html = store.load_html(&table_hash)?;

    let sections = parse_index(&index_html, &config.index_url, &index_hash, &version)?;
    let crosswalk = parse_crosswalk(&table_html, &config.section_table_url, &table_hash, &version)?;

    let ds_dir = config.datasets_path();
    let sections_path = ds_dir.join(SECTIONS_DATASET);
    let crosswalk_path = ds_dir.join(CROSSWALK_DATASET);

    fsio::write_jsonl(&sections_path, &sections)?;
    fsio::write_jsonl(&crosswalk_path, &crosswalk)?;

    Ok((sections_path, crosswalk_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnss_core::cache::{CacheEntry, sha256_hex};
    use serde_json::Value;
    use std::collections::BTreeMap;

    const INDEX_HTML: &str = "<html><body>\
        CHAPTER I PRELIMINARY \
        1. Short title, commencement and application. \
        2. Definitions. \
        CHAPTER II CONSTITUTION OF CRIMINAL COURTS \
        3. Classes of Criminal Courts.\
        </body></html>";

    const TABLE_HTML: &str = "<html><body><table>\
        <tr><th>BNSS</th><th>CrPC</th><th>Remarks</th></tr>\
        <tr><td>1. Short title</td><td>1. Short title</td><td>No change</td></tr>\
        <tr><td>2. Definitions</td><td>2. Definitions</td><td>Modified</td></tr>\
        </table></body></html>";

    fn seed(config: &AppConfig) {
        config.ensure_dirs().unwrap();
        let store = ContentStore::new(config.raw_html_path());
        let now = chrono::Utc::now();

        let mut cache = UrlCache::load(&config.manifests_path()).unwrap();
        for (url, html) in [(&config.index_url, INDEX_HTML), (&config.section_table_url, TABLE_HTML)] {
            let hash = sha256_hex(html.as_bytes());
            store.persist(html.as_bytes(), &hash, url, now, 200, &BTreeMap::new()).unwrap();
            cache.insert(
                url.clone(),
                CacheEntry { last_hash: Some(hash), last_seen_at: Some(now.to_rfc3339()), ..Default::default() },
            );
        }
        cache.save().unwrap();
    }

    #[test]
    fn test_run_etl_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(tmp.path());
        seed(&config);

        let (sections_path, crosswalk_path) = run_etl(&config, "2026-01-10").unwrap();

        let sections = fsio::read_jsonl(&sections_path).unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0]["canonical_id"], "BNSS:CH01:S001");
        assert_eq!(sections[2]["chapter_no"], 2);
        assert!(sections.iter().all(|r| r["version"] == "bnss@2026-01-10"));

        let crosswalk = fsio::read_jsonl(&crosswalk_path).unwrap();
        assert_eq!(crosswalk.len(), 2);
        assert_eq!(crosswalk[0]["bnss_section_no"], "1");
        assert_eq!(crosswalk[0]["remarks"], "No change");
    }

    #[test]
    fn test_run_etl_rows_carry_provenance() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(tmp.path());
        seed(&config);

        let (sections_path, _) = run_etl(&config, "2026-01-10").unwrap();
        let sections = fsio::read_jsonl(&sections_path).unwrap();
        let expected_hash = sha256_hex(INDEX_HTML.as_bytes());
        assert!(
            sections
                .iter()
                .all(|r| r["content_hash"] == Value::String(expected_hash.clone()))
        );
        assert!(sections.iter().all(|r| r["source_url"] == Value::String(config.index_url.clone())));
    }

    #[test]
    fn test_run_etl_without_fetch_is_prerequisite_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(tmp.path());

        let err = run_etl(&config, "2026-01-10").unwrap_err();
        assert!(matches!(err, Error::MissingPrerequisite(_)));
        assert!(err.to_string().contains(URL_CACHE_NAME));
    }

    #[test]
    fn test_run_etl_missing_hash_for_url() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(tmp.path());
        config.ensure_dirs().unwrap();

        // Cache document exists but records nothing for the index URL.
        let cache = UrlCache::load(&config.manifests_path()).unwrap();
        cache.save().unwrap();

        let err = run_etl(&config, "2026-01-10").unwrap_err();
        assert!(err.to_string().contains("no last_hash"));
    }

    #[test]
    fn test_run_etl_tolerates_short_cache_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(tmp.path());
        config.ensure_dirs().unwrap();

        // A hand-edited cache may record a truncated hash; the step must
        // fail with a missing-body error, not panic on the log line.
        let mut cache = UrlCache::load(&config.manifests_path()).unwrap();
        for url in [&config.index_url, &config.section_table_url] {
            cache.insert(
                url.clone(),
                CacheEntry { last_hash: Some("abc".into()), ..Default::default() },
            );
        }
        cache.save().unwrap();

        let err = run_etl(&config, "2026-01-10").unwrap_err();
        assert!(matches!(err, Error::MissingPrerequisite(_)));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_run_etl_rejects_bad_as_of() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(tmp.path());
        assert!(run_etl(&config, "not-a-date").is_err());
    }
}
