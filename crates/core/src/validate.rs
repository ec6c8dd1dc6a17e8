//! Dataset validation.
//!
//! Checks data integrity after ETL: gaps, duplicates, schema conformance,
//! and cross-dataset consistency. Checks operate on the raw JSON rows so
//! they catch schema drift that the typed models would mask.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

use crate::config::AppConfig;
use crate::error::Error;
use crate::fsio;
use crate::models::{LAW_TAG, validate_as_of};

/// File name of the section index dataset inside the datasets directory.
pub const SECTIONS_DATASET: &str = "bnss_sections_index.jsonl";

/// File name of the crosswalk dataset inside the datasets directory.
pub const CROSSWALK_DATASET: &str = "bnss_crosswalk.jsonl";

/// Result of a single validation check.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub check_name: String,
    pub passed: bool,
    pub message: String,
    pub details: Vec<String>,
}

impl ValidationResult {
    fn pass(check_name: &str, message: impl Into<String>) -> Self {
        Self { check_name: check_name.into(), passed: true, message: message.into(), details: Vec::new() }
    }

    fn fail(check_name: &str, message: impl Into<String>, details: Vec<String>) -> Self {
        Self { check_name: check_name.into(), passed: false, message: message.into(), details }
    }

    pub fn summary(&self) -> String {
        let status = if self.passed { "PASS" } else { "FAIL" };
        format!("[{status}] {}: {}", self.check_name, self.message)
    }
}

/// Aggregated validation report.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = self.results.iter().map(ValidationResult::summary).collect();
        lines.push(format!("\n{} passed, {} failed", self.passed_count(), self.failed_count()));
        lines.join("\n")
    }
}

/// Check that a dataset file exists and is non-empty.
pub fn check_file_exists(path: &Path, name: &str) -> ValidationResult {
    let check = format!("{name}_exists");
    match std::fs::metadata(path) {
        Err(_) => ValidationResult::fail(&check, format!("{} does not exist", path.display()), Vec::new()),
        Ok(meta) if meta.len() == 0 => {
            ValidationResult::fail(&check, format!("{} is empty (0 bytes)", path.display()), Vec::new())
        }
        Ok(meta) => ValidationResult::pass(&check, format!("{} exists ({} bytes)", path.display(), meta.len())),
    }
}

fn section_no(row: &Value) -> Option<i64> {
    row.get("section_no").and_then(Value::as_i64)
}

/// Check for duplicate section numbers in the index.
pub fn check_sections_no_duplicates(rows: &[Value]) -> ValidationResult {
    let mut seen: BTreeMap<i64, usize> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let Some(sec) = section_no(row) else { continue };
        if let Some(first) = seen.get(&sec) {
            duplicates.push(format!("Section {sec} appears at rows {} and {}", first + 1, i + 1));
        } else {
            seen.insert(sec, i);
        }
    }

    if duplicates.is_empty() {
        ValidationResult::pass("sections_no_duplicates", format!("{} unique sections, no duplicates", seen.len()))
    } else {
        let count = duplicates.len();
        duplicates.truncate(10);
        ValidationResult::fail("sections_no_duplicates", format!("{count} duplicate section(s) found"), duplicates)
    }
}

/// Check for gaps in section numbering.
pub fn check_sections_gaps(rows: &[Value]) -> ValidationResult {
    let section_nos: BTreeSet<i64> = rows.iter().filter_map(section_no).collect();
    let (Some(&first), Some(&last)) = (section_nos.first(), section_nos.last()) else {
        return ValidationResult::fail("sections_gaps", "No sections found", Vec::new());
    };

    let missing: Vec<i64> = (first..=last).filter(|n| !section_nos.contains(n)).collect();
    if missing.is_empty() {
        ValidationResult::pass("sections_gaps", format!("Sections {first}-{last} contiguous, no gaps"))
    } else {
        let shown: Vec<i64> = missing.iter().take(20).copied().collect();
        ValidationResult::fail(
            "sections_gaps",
            format!("{} gap(s) in section numbering", missing.len()),
            vec![format!("Missing section(s): {shown:?}")],
        )
    }
}

/// Validate that all section rows conform to the expected schema.
pub fn check_sections_schema(rows: &[Value]) -> ValidationResult {
    const REQUIRED: [&str; 9] = [
        "canonical_id",
        "law",
        "chapter_no",
        "chapter_title",
        "section_no",
        "section_title",
        "source_url",
        "content_hash",
        "version",
    ];

    let mut errors = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let n = i + 1;
        let missing: Vec<&str> = REQUIRED.iter().filter(|f| row.get(**f).is_none()).copied().collect();
        if !missing.is_empty() {
            errors.push(format!("Row {n}: missing fields {missing:?}"));
        }
        if row.get("law").and_then(Value::as_str) != Some(LAW_TAG) {
            errors.push(format!("Row {n}: law={:?}, expected '{LAW_TAG}'", row.get("law")));
        }
        if row.get("section_no").map(|v| !v.is_i64() && !v.is_u64()).unwrap_or(false) {
            errors.push(format!("Row {n}: section_no is not an integer"));
        }
        if row.get("chapter_no").map(|v| !v.is_i64() && !v.is_u64()).unwrap_or(false) {
            errors.push(format!("Row {n}: chapter_no is not an integer"));
        }
    }

    if errors.is_empty() {
        ValidationResult::pass("sections_schema", format!("All {} rows conform to schema", rows.len()))
    } else {
        let count = errors.len();
        errors.truncate(10);
        ValidationResult::fail("sections_schema", format!("{count} schema violation(s)"), errors)
    }
}

/// Check for duplicate BNSS section references in the crosswalk.
pub fn check_crosswalk_no_duplicates(rows: &[Value]) -> ValidationResult {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let key = row.get("bnss_section_no").and_then(Value::as_str).unwrap_or("").to_string();
        if let Some(first) = seen.get(&key) {
            duplicates.push(format!("BNSS section {key} at rows {} and {}", first + 1, i + 1));
        } else {
            seen.insert(key, i);
        }
    }

    if duplicates.is_empty() {
        ValidationResult::pass(
            "crosswalk_no_duplicates",
            format!("{} unique crosswalk entries, no duplicates", seen.len()),
        )
    } else {
        let count = duplicates.len();
        duplicates.truncate(10);
        ValidationResult::fail("crosswalk_no_duplicates", format!("{count} duplicate BNSS section(s)"), duplicates)
    }
}

/// Validate crosswalk rows conform to the expected schema.
pub fn check_crosswalk_schema(rows: &[Value]) -> ValidationResult {
    const REQUIRED: [&str; 4] = ["bnss_section_no", "source_url", "content_hash", "version"];

    let mut errors = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let n = i + 1;
        let missing: Vec<&str> = REQUIRED.iter().filter(|f| row.get(**f).is_none()).copied().collect();
        if !missing.is_empty() {
            errors.push(format!("Row {n}: missing fields {missing:?}"));
        }
        if row.get("bnss_section_no").and_then(Value::as_str).unwrap_or("").is_empty() {
            errors.push(format!("Row {n}: bnss_section_no is empty"));
        }
    }

    if errors.is_empty() {
        ValidationResult::pass("crosswalk_schema", format!("All {} rows conform to schema", rows.len()))
    } else {
        let count = errors.len();
        errors.truncate(10);
        ValidationResult::fail("crosswalk_schema", format!("{count} schema violation(s)"), errors)
    }
}

/// Check that all rows across both datasets share the same version.
pub fn check_version_consistency(sections: &[Value], crosswalk: &[Value]) -> ValidationResult {
    let versions: BTreeSet<String> = sections
        .iter()
        .chain(crosswalk)
        .map(|row| row.get("version").and_then(Value::as_str).unwrap_or("").to_string())
        .collect();

    if versions.len() == 1 {
        let v = versions.into_iter().next().unwrap_or_default();
        ValidationResult::pass("version_consistency", format!("All rows have version: {v}"))
    } else {
        ValidationResult::fail(
            "version_consistency",
            format!("Multiple versions found: {versions:?}"),
            vec![format!("Expected 1 version, found {}", versions.len())],
        )
    }
}

/// Run all validation checks on the latest datasets.
pub fn run_validation(config: &AppConfig, as_of: &str) -> Result<ValidationReport, Error> {
    validate_as_of(as_of)?;

    let ds_dir = config.datasets_path();
    let sections_path = ds_dir.join(SECTIONS_DATASET);
    let crosswalk_path = ds_dir.join(CROSSWALK_DATASET);

    let mut report = ValidationReport::default();
    report.results.push(check_file_exists(&sections_path, "sections"));
    report.results.push(check_file_exists(&crosswalk_path, "crosswalk"));

    if !sections_path.exists() || !crosswalk_path.exists() {
        tracing::error!("cannot run full validation, dataset files missing");
        return Ok(report);
    }

    let sections = fsio::read_jsonl(&sections_path)?;
    let crosswalk = fsio::read_jsonl(&crosswalk_path)?;

    tracing::info!("validating {} sections, {} crosswalk rows", sections.len(), crosswalk.len());

    report.results.push(check_sections_schema(&sections));
    report.results.push(check_sections_no_duplicates(&sections));
    report.results.push(check_sections_gaps(&sections));

    report.results.push(check_crosswalk_schema(&crosswalk));
    report.results.push(check_crosswalk_no_duplicates(&crosswalk));

    report.results.push(check_version_consistency(&sections, &crosswalk));

    Ok(report)
}
