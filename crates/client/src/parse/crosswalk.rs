//! Parser for the BNSS/CrPC crosswalk table page.
//!
//! The document may carry layout and navigation tables; the data table is
//! taken to be the one with the most rows (first wins on a tie). Each row's
//! first two cells decompose into (reference number, title) pairs; trailing
//! cells collapse into free-text remarks.

use scraper::{ElementRef, Html, Selector};

use bnss_core::{CrosswalkRow, Error};

use super::{clean_cell_text, plain_url, split_section_cell};

fn cell_text(td: ElementRef) -> String {
    let joined = td.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the BNSS/CrPC crosswalk HTML table.
///
/// # Errors
///
/// `Error::Parse` if the document contains no table element, or if every
/// extracted row is empty or unparseable.
pub fn parse_crosswalk(
    html: &str, source_url: &str, content_hash: &str, version: &str,
) -> Result<Vec<CrosswalkRow>, Error> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").expect("invalid selector");
    let tr_sel = Selector::parse("tr").expect("invalid selector");
    let td_sel = Selector::parse("td").expect("invalid selector");

    let tables: Vec<ElementRef> = document.select(&table_sel).collect();
    let Some(&first_table) = tables.first() else {
        return Err(Error::Parse("no <table> found in crosswalk HTML".into()));
    };

    // Largest table by row count; strict comparison keeps the first on ties.
    let mut table = first_table;
    let mut table_rows = table.select(&tr_sel).count();
    for &candidate in &tables[1..] {
        let n = candidate.select(&tr_sel).count();
        if n > table_rows {
            table = candidate;
            table_rows = n;
        }
    }
    tracing::debug!("selected crosswalk table with {} rows", table_rows);

    let source_url = plain_url(source_url);
    let mut out = Vec::new();
    for tr in table.select(&tr_sel) {
        let cells: Vec<String> = tr.select(&td_sel).map(cell_text).collect();
        // Header and decorative rows have th cells or a single spanning td.
        if cells.len() < 2 {
            continue;
        }

        let (bnss_no, bnss_title) = split_section_cell(&cells[0]);
        let (crpc_no, crpc_title) = split_section_cell(&cells[1]);
        let remarks = if cells.len() > 2 {
            let joined = clean_cell_text(&cells[2..].join(" "));
            (!joined.is_empty()).then_some(joined)
        } else {
            None
        };

        // The current-statute reference is mandatory; everything else is not.
        let Some(bnss_section_no) = bnss_no else { continue };

        out.push(CrosswalkRow {
            bnss_section_no,
            bnss_section_title: bnss_title,
            crpc_section_no: crpc_no,
            crpc_section_title: crpc_title,
            remarks,
            source_url: source_url.clone(),
            content_hash: content_hash.to_string(),
            version: version.to_string(),
        });
    }

    if out.is_empty() {
        return Err(Error::Parse("crosswalk parse produced 0 rows".into()));
    }
    tracing::info!("parsed {} crosswalk rows", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE_URL: &str = "https://example.com/test";
    const CONTENT_HASH: &str = "abc123";
    const VERSION: &str = "bnss@2026-01-01";

    const SAMPLE_CROSSWALK_HTML: &str = r#"
        <html><body>
        <table>
            <tr><th>BNSS</th><th>CrPC</th><th>Remarks</th></tr>
            <tr><td>1. Short title</td><td>1. Short title</td><td>No change</td></tr>
            <tr><td>2. Definitions</td><td>2. Definitions</td><td>Modified</td></tr>
            <tr><td>3. Classes of Criminal Courts</td><td>6. Classes of Criminal Courts</td><td>Renumbered</td></tr>
        </table>
        </body></html>
    "#;

    fn parse(html: &str) -> Result<Vec<CrosswalkRow>, Error> {
        parse_crosswalk(html, SOURCE_URL, CONTENT_HASH, VERSION)
    }

    #[test]
    fn test_happy_path() {
        let rows = parse(SAMPLE_CROSSWALK_HTML).unwrap();
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.bnss_section_no, "1");
        assert_eq!(first.bnss_section_title.as_deref(), Some("Short title"));
        assert_eq!(first.crpc_section_no.as_deref(), Some("1"));
        assert_eq!(first.source_url, SOURCE_URL);
        assert_eq!(first.content_hash, CONTENT_HASH);
    }

    #[test]
    fn test_remarks_captured() {
        let rows = parse(SAMPLE_CROSSWALK_HTML).unwrap();
        assert_eq!(rows[0].remarks.as_deref(), Some("No change"));
        assert_eq!(rows[1].remarks.as_deref(), Some("Modified"));
        assert_eq!(rows[2].remarks.as_deref(), Some("Renumbered"));
    }

    #[test]
    fn test_renumbered_mapping() {
        let rows = parse(SAMPLE_CROSSWALK_HTML).unwrap();
        assert_eq!(rows[2].bnss_section_no, "3");
        assert_eq!(rows[2].crpc_section_no.as_deref(), Some("6"));
    }

    #[test]
    fn test_version_propagated() {
        let rows = parse(SAMPLE_CROSSWALK_HTML).unwrap();
        assert!(rows.iter().all(|r| r.version == VERSION));
    }

    #[test]
    fn test_no_table_raises() {
        let err = parse("<html><body><p>No tables here.</p></body></html>").unwrap_err();
        assert!(err.to_string().contains("no <table> found"));
    }

    #[test]
    fn test_empty_rows_raises() {
        let html = r#"
            <html><body>
            <table>
                <tr><th>BNSS</th><th>CrPC</th></tr>
                <tr><td></td><td></td></tr>
                <tr><td>  </td><td>  </td></tr>
            </table>
            </body></html>
        "#;
        let err = parse(html).unwrap_err();
        assert!(err.to_string().contains("produced 0 rows"));
    }

    #[test]
    fn test_largest_table_wins() {
        let html = r#"
            <html><body>
            <table>
                <tr><td>nav</td><td>nav</td></tr>
            </table>
            <table>
                <tr><td>1. Short title</td><td>1. Short title</td></tr>
                <tr><td>2. Definitions</td><td>2. Definitions</td></tr>
                <tr><td>3. Scope</td><td>3. Scope</td></tr>
            </table>
            </body></html>
        "#;
        let rows = parse(html).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].bnss_section_no, "1");
    }

    #[test]
    fn test_subsection_reference_kept_opaque() {
        let html = r#"
            <html><body>
            <table>
                <tr><td>497(2) Bail conditions</td><td>439 Bail powers</td></tr>
            </table>
            </body></html>
        "#;
        let rows = parse(html).unwrap();
        assert_eq!(rows[0].bnss_section_no, "497(2)");
        assert_eq!(rows[0].bnss_section_title.as_deref(), Some("Bail conditions"));
    }

    #[test]
    fn test_rows_without_reference_dropped() {
        let html = r#"
            <html><body>
            <table>
                <tr><td>Omitted provision</td><td>removed</td></tr>
                <tr><td>2. Definitions</td><td>2. Definitions</td></tr>
            </table>
            </body></html>
        "#;
        let rows = parse(html).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bnss_section_no, "2");
    }

    #[test]
    fn test_markdown_wrapped_source_url_unwrapped() {
        let rows = parse_crosswalk(
            SAMPLE_CROSSWALK_HTML,
            "[Table](https://example.com/table.html)",
            CONTENT_HASH,
            VERSION,
        )
        .unwrap();
        assert_eq!(rows[0].source_url, "https://example.com/table.html");
    }
}
