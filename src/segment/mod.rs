//! Entry segmentation for one catalogue year.
//!
//! The year's OCR text is cut at the front-matter and appendix anchors, the
//! entry body is split into pages on form feeds, page furniture is stripped,
//! and every line ending in the year suffix (`Jan '17`) closes an entry. Each
//! entry is stamped with its print page and document page, and entries that
//! OCR fused onto one line are split apart again.

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::rules::YearRuleSet;

mod boundary;
mod error;
mod flatten;
mod line_merge;
mod noise;
mod pages;
mod sections;
#[cfg(test)]
mod tests;

pub use boundary::{tag_pages, terminator_pattern};
pub use error::{Boundary, SegmentError, SegmentWarning};
pub use flatten::EntryFlattener;
pub use line_merge::LineMergeCorrector;
pub use noise::strip;
pub use pages::to_pages;
pub use sections::split_sections;

pub const ENTRY_CUT: &str = "<ENTRY_CUT>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    #[serde(rename = "entry")]
    pub text: String,
    #[serde(rename = "page_num")]
    pub page_number: Option<u32>,
    #[serde(rename = "doc_page_num")]
    pub document_page_number: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentationStats {
    pub page_offset: i64,
    pub page_count: usize,
    pub raw_entry_count: usize,
    pub untagged_entry_count: usize,
    pub merged_entry_count: usize,
    pub entry_count: usize,
}

impl SegmentationStats {
    pub fn merged_ratio(&self) -> f64 {
        if self.raw_entry_count == 0 {
            return 0.0;
        }
        self.merged_entry_count as f64 / self.raw_entry_count as f64
    }
}

#[derive(Debug, Clone)]
pub struct Segmentation {
    pub entries: Vec<Entry>,
    pub stats: SegmentationStats,
    pub warnings: Vec<SegmentWarning>,
}

#[derive(Debug, Clone)]
pub struct Segmenter {
    rules: YearRuleSet,
    flattener: EntryFlattener,
    corrector: LineMergeCorrector,
}

impl Segmenter {
    pub fn new(rules: YearRuleSet) -> Result<Self, SegmentError> {
        let flattener = EntryFlattener::new(&rules.year)?;
        let corrector = LineMergeCorrector::new(&rules.year)?;
        Ok(Self {
            rules,
            flattener,
            corrector,
        })
    }

    pub fn year(&self) -> &str {
        &self.rules.year
    }

    pub fn segment(&self, raw: &str) -> Result<Segmentation, SegmentError> {
        let sections = split_sections(raw, &self.rules)?;
        debug!(
            year = %self.rules.year,
            front_matter_chars = sections.front_matter.len(),
            entry_body_chars = sections.entry_body.len(),
            appendix_chars = sections.appendix.len(),
            page_offset = sections.page_offset,
            year_suffix_variants = ?self.rules.year_suffix_variants,
            "split sections"
        );

        let pages = to_pages(sections.entry_body)
            .into_iter()
            .map(|page| strip(page, &self.rules.header_noise_patterns))
            .collect::<Vec<String>>();
        let tagged = tag_pages(&pages, &self.rules.entry_terminator, sections.page_offset);
        let entries = self.flattener.flatten(&tagged);

        let raw_entry_count = entries.len();
        let untagged_entry_count = entries
            .iter()
            .filter(|entry| entry.page_number.is_none())
            .count();

        let correction = self.corrector.correct(entries);

        Ok(Segmentation {
            stats: SegmentationStats {
                page_offset: sections.page_offset,
                page_count: pages.len(),
                raw_entry_count,
                untagged_entry_count,
                merged_entry_count: correction.merged_count,
                entry_count: correction.entries.len(),
            },
            entries: correction.entries,
            warnings: correction.warnings,
        })
    }
}

fn compile_pattern(year: &str, pattern: &str) -> Result<Regex, SegmentError> {
    Regex::new(pattern).map_err(|source| SegmentError::InvalidPattern {
        year: year.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}
