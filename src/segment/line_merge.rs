use regex::Regex;
use tracing::warn;

use super::{Entry, SegmentError, SegmentWarning, compile_pattern};

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "June", "July", "Aug", "Sept", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Default)]
pub struct Correction {
    pub entries: Vec<Entry>,
    pub merged_count: usize,
    pub warnings: Vec<SegmentWarning>,
}

/// Splits entries that OCR fused onto one physical line, right after the first
/// entry's closing date.
#[derive(Debug, Clone)]
pub struct LineMergeCorrector {
    year: String,
    date: Regex,
}

impl LineMergeCorrector {
    pub fn new(year: &str) -> Result<Self, SegmentError> {
        let pattern = format!(
            r"\b(?:{})\.?\W{{1,3}}{}\.?",
            MONTH_ABBREVIATIONS.join("|"),
            regex::escape(year)
        );

        Ok(Self {
            year: year.to_string(),
            date: compile_pattern(year, &pattern)?,
        })
    }

    pub fn is_merged(&self, text: &str) -> bool {
        self.internal_date_end(text).is_some()
    }

    /// Byte offset just past the first month+year date that is followed by
    /// more entry text. The next entry may start right after the year with no
    /// space between them, but a following digit means a longer number.
    pub fn internal_date_end(&self, text: &str) -> Option<usize> {
        self.date
            .find_iter(text)
            .map(|date| date.end())
            .filter(|&end| !text[end..].starts_with(|character: char| character.is_ascii_digit()))
            .find(|&end| {
                text[end..]
                    .chars()
                    .any(|character| character != '.' && !character.is_whitespace())
            })
    }

    pub fn correct(&self, entries: Vec<Entry>) -> Correction {
        let mut correction = Correction {
            entries: Vec::with_capacity(entries.len()),
            ..Correction::default()
        };

        for (index, entry) in entries.into_iter().enumerate() {
            let Some(cut) = self.internal_date_end(&entry.text) else {
                correction.entries.push(entry);
                continue;
            };

            if entry.page_number.is_none() || entry.document_page_number.is_none() {
                self.record(
                    &mut correction.warnings,
                    SegmentWarning::MissingPageTag {
                        index,
                        text: entry.text.clone(),
                    },
                );
            }

            let (head, tail) = entry.text.split_at(cut);
            let first = head.trim_end().to_string();
            let second = strip_leading_junk(tail.trim()).to_string();

            if self.is_merged(&second) {
                self.record(
                    &mut correction.warnings,
                    SegmentWarning::UnexpectedFragment {
                        index,
                        remainder: second.clone(),
                    },
                );
            }

            correction.entries.push(Entry {
                text: first,
                page_number: entry.page_number,
                document_page_number: entry.document_page_number,
            });
            correction.entries.push(Entry {
                text: second,
                page_number: entry.page_number,
                document_page_number: entry.document_page_number,
            });
            correction.merged_count += 1;
        }

        correction
    }

    fn record(&self, warnings: &mut Vec<SegmentWarning>, warning: SegmentWarning) {
        warn!(year = %self.year, warning = %warning, "line-merge anomaly");
        warnings.push(warning);
    }
}

// leading figures such as prices are kept
fn strip_leading_junk(text: &str) -> &str {
    let first_word = text
        .char_indices()
        .find(|(_, character)| character.is_alphanumeric() || *character == '_');

    match first_word {
        Some((start, character)) if start > 0 && character.is_ascii_uppercase() => &text[start..],
        _ => text,
    }
}
