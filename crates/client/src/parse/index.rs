//! Parser for the BNSS section index page.
//!
//! The page is flattened to plain text and segmented positionally:
//! chapter headings (`CHAPTER <roman numeral>`) delimit chapter spans, and
//! `<number>.` markers delimit section rows within each span.

use std::sync::LazyLock;

use regex::Regex;

use bnss_core::{BnssSectionIndexRow, Error};

use super::{clean_cell_text, flatten_text, roman_to_int};

static CHAPTER_HEAD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bCHAPTER\s+([IVXLCDM]+)\b").unwrap());

static SECTION_MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,3})\s*\.+\s*").unwrap());

#[derive(Debug)]
struct ChapterHeading {
    start: usize,
    end: usize,
    no: u32,
}

#[derive(Debug)]
struct SectionMark {
    start: usize,
    end: usize,
    no: u32,
}

/// Parse the BNSS index HTML into structured section rows.
///
/// # Errors
///
/// `Error::Parse` if no chapter headings are found, or if headings exist
/// but zero section rows result — both signal the upstream page format
/// changed.
pub fn parse_index(
    html: &str, source_url: &str, content_hash: &str, version: &str,
) -> Result<Vec<BnssSectionIndexRow>, Error> {
    let text = flatten_text(html);

    let mut chapters = Vec::new();
    for caps in CHAPTER_HEAD_RE.captures_iter(&text) {
        let m = caps.get(0).expect("whole match");
        chapters.push(ChapterHeading { start: m.start(), end: m.end(), no: roman_to_int(&caps[1])? });
    }
    if chapters.is_empty() {
        return Err(Error::Parse("no CHAPTER headings found in index HTML".into()));
    }
    // Matches are already in order; sort anyway.
    chapters.sort_by_key(|c| c.start);
    tracing::info!("found {} chapters in index HTML", chapters.len());

    let mut rows = Vec::new();
    for (i, chapter) in chapters.iter().enumerate() {
        let span_end = chapters.get(i + 1).map(|c| c.start).unwrap_or(text.len());
        let span = &text[chapter.end..span_end];

        let marks: Vec<SectionMark> = SECTION_MARK_RE
            .captures_iter(span)
            .filter_map(|caps| {
                let m = caps.get(0).expect("whole match");
                let no = caps[1].parse().ok()?;
                Some(SectionMark { start: m.start(), end: m.end(), no })
            })
            .collect();

        // The chapter title runs from the heading to the first section
        // marker, or to the next heading when the chapter lists none.
        let title_end = marks.first().map(|m| m.start).unwrap_or(span.len());
        let chapter_title = span[..title_end].trim().to_string();

        for (j, mark) in marks.iter().enumerate() {
            let next_start = marks.get(j + 1).map(|m| m.start).unwrap_or(span.len());
            let raw_title = &span[mark.end..next_start];
            // A bare "CHAPTER" word also ends a title, even when no roman
            // numeral follows it and it therefore opens no new span.
            let raw_title = raw_title.find("CHAPTER").map_or(raw_title, |i| &raw_title[..i]);
            let section_title = clean_cell_text(raw_title);
            // A bare index number or stray punctuation is not a section.
            if section_title.chars().count() < 3 {
                continue;
            }
            rows.push(BnssSectionIndexRow::new(
                chapter.no,
                chapter_title.as_str(),
                mark.no,
                section_title,
                source_url,
                content_hash,
                version,
            ));
        }
    }

    if rows.is_empty() {
        return Err(Error::Parse("index parse produced 0 rows".into()));
    }
    tracing::info!("parsed {} section index rows", rows.len());
    Ok(rows)
}
