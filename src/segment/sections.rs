use crate::rules::YearRuleSet;

use super::pages::PAGE_BREAK;
use super::{Boundary, SegmentError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections<'a> {
    pub front_matter: &'a str,
    pub entry_body: &'a str,
    pub appendix: &'a str,
    pub page_offset: i64,
}

pub fn split_sections<'a>(raw: &'a str, rules: &YearRuleSet) -> Result<Sections<'a>, SegmentError> {
    let front = rules
        .front_matter_anchor
        .find(raw)
        .ok_or_else(|| SegmentError::BoundaryNotFound {
            year: rules.year.clone(),
            boundary: Boundary::FrontMatter,
            pattern: rules.front_matter_anchor.as_str().to_string(),
        })?;

    let front_matter = &raw[..front.start()];
    let remainder = &raw[front.end()..];

    let appendix = rules
        .appendix_anchor
        .find(remainder)
        .ok_or_else(|| SegmentError::BoundaryNotFound {
            year: rules.year.clone(),
            boundary: Boundary::Appendix,
            pattern: rules.appendix_anchor.as_str().to_string(),
        })?;

    Ok(Sections {
        front_matter,
        entry_body: &remainder[..appendix.start()],
        appendix: &remainder[appendix.end()..],
        page_offset: page_offset(front_matter),
    })
}

pub fn page_offset(front_matter: &str) -> i64 {
    // the anchor line does not open a new printed page
    let pages = front_matter.matches(PAGE_BREAK).count() as i64 + 1;
    pages - 2
}
