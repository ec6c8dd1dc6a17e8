//! Atomic file write helpers and line-delimited JSON I/O.
//!
//! Every mutable document in the pipeline (URL cache, sidecar metadata,
//! datasets) is written via write-to-sibling-temp-then-rename so a crash
//! mid-write never leaves a partially written file visible to readers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;

fn tmp_sibling(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("{name}.tmp"))
}

/// Write `bytes` to `path` atomically, creating parent directories.
///
/// The temporary sibling is removed on failure so no orphan is left behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_sibling(path);
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Serialize `value` as pretty-printed JSON and write it atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

/// Write one JSON record per line, atomically. Returns the row count.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize, Error> {
    let mut buf = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut buf, row)?;
        buf.push(b'\n');
    }
    write_atomic(path, &buf)?;
    tracing::info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Read a JSONL file into JSON values, skipping blank lines.
pub fn read_jsonl(path: &Path) -> Result<Vec<serde_json::Value>, Error> {
    let text = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = serde_json::from_str(line)
            .map_err(|e| Error::InvalidInput(format!("invalid JSON at line {} in {}: {e}", i + 1, path.display())))?;
        rows.push(value);
    }
    Ok(rows)
}

/// Read a file to a string, tolerating a leading UTF-8 byte-order-mark.
pub fn read_to_string_bom(path: &Path) -> Result<String, Error> {
    let text = fs::read_to_string(path)?;
    Ok(text.strip_prefix('\u{feff}').map(str::to_owned).unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_atomic_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a/b/c.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_write_atomic_leaves_no_tmp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.json");
        write_atomic(&path, b"data").unwrap();
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.json");
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rows.jsonl");
        let rows = vec![json!({"a": 1}), json!({"a": 2})];
        let count = write_jsonl(&path, &rows).unwrap();
        assert_eq!(count, 2);

        let restored = read_jsonl(&path).unwrap();
        assert_eq!(restored, rows);
    }

    #[test]
    fn test_read_jsonl_skips_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rows.jsonl");
        fs::write(&path, "{\"a\":1}\n\n{\"a\":2}\n").unwrap();
        assert_eq!(read_jsonl(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_read_jsonl_reports_bad_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rows.jsonl");
        fs::write(&path, "{\"a\":1}\nnot json\n").unwrap();
        let err = read_jsonl(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_read_to_string_bom() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bom.json");
        fs::write(&path, "\u{feff}{\"k\": 1}").unwrap();
        assert_eq!(read_to_string_bom(&path).unwrap(), "{\"k\": 1}");
    }
}
