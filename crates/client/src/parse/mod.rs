//! Structural parsers for the two known BNSS document shapes.
//!
//! Shared text helpers live here; the index and crosswalk parsers are in
//! their own modules. Both recover structure positionally: the source
//! pages have no reliable sentinel between a heading and the next one, so
//! the next match's start position is the delimiter.

pub mod crosswalk;
pub mod index;

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use bnss_core::Error;

pub use crosswalk::parse_crosswalk;
pub use index::parse_index;

static CHANGE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s*\(Change\)\s*").unwrap());

// Leading reference token of a crosswalk cell: 1-4 digits, optional decimal
// suffix, optional parenthesized sub-index, optional trailing uppercase
// letter. The \b keeps a title's first capital ("Bail ...") out of the token.
static CROSSWALK_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,4}(?:\.\d+)?(?:\s*\(\d+\))?(?:\s*[A-Z]\b)?)\s*\.?\s*(.*)$").unwrap());

static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[[^\]]*\]\(([^)]*)\)$").unwrap());

/// Convert a Roman numeral string to an integer.
///
/// Right-to-left subtractive accumulation: a digit smaller than the running
/// maximum seen so far is subtracted, otherwise added.
pub fn roman_to_int(roman: &str) -> Result<u32, Error> {
    let mut total: i64 = 0;
    let mut prev: i64 = 0;
    for ch in roman.trim().chars().rev() {
        let v: i64 = match ch.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            other => return Err(Error::Parse(format!("invalid roman numeral digit '{other}' in '{roman}'"))),
        };
        if v < prev {
            total -= v;
        } else {
            total += v;
            prev = v;
        }
    }
    u32::try_from(total).map_err(|_| Error::Parse(format!("roman numeral '{roman}' is not a positive value")))
}

/// Normalize whitespace, drop the literal `(Change)` annotation, and strip
/// a single trailing period.
pub fn clean_cell_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_tag = CHANGE_TAG_RE.replace_all(&collapsed, " ");
    let trimmed = without_tag.trim();
    trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end().to_string()
}

/// Split a crosswalk cell into (reference number, title).
///
/// A non-empty cell that doesn't start with a reference token becomes a
/// bare title with no number.
pub fn split_section_cell(text: &str) -> (Option<String>, Option<String>) {
    let cleaned = clean_cell_text(text);
    if cleaned.is_empty() {
        return (None, None);
    }
    match CROSSWALK_CELL_RE.captures(&cleaned) {
        Some(caps) => {
            let sec_no = caps[1].trim().to_string();
            let title = caps[2].trim();
            (Some(sec_no), (!title.is_empty()).then(|| title.to_string()))
        }
        None => (None, Some(cleaned)),
    }
}

/// Unwrap a Markdown-style link (`[text](href)` -> `href`).
///
/// Upstream provenance values sometimes arrive pre-wrapped; anything else
/// passes through unchanged.
pub fn plain_url(value: &str) -> String {
    let trimmed = value.trim();
    match MARKDOWN_LINK_RE.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

/// Strip all markup, collapsing the page to single-spaced plain text.
pub(crate) fn flatten_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let joined = document.root_element().text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
