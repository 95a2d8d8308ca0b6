use regex::Regex;
use tracing::debug;

use super::boundary::TaggedPage;
use super::{ENTRY_CUT, Entry, SegmentError, compile_pattern};

const PAGE_TAG_PATTERN: &str = r"<PAGE_NUM:([0-9]+)><DOCUMENT_PAGE_NUM:(-?[0-9]+)>";
const LINE_BREAK_PATTERN: &str = r"\s*\n\s*";

#[derive(Debug, Clone)]
pub struct EntryFlattener {
    page_tag: Regex,
    line_break: Regex,
}

impl EntryFlattener {
    pub fn new(year: &str) -> Result<Self, SegmentError> {
        Ok(Self {
            page_tag: compile_pattern(year, PAGE_TAG_PATTERN)?,
            line_break: compile_pattern(year, LINE_BREAK_PATTERN)?,
        })
    }

    pub fn flatten(&self, pages: &[TaggedPage]) -> Vec<Entry> {
        let mut entries = Vec::new();

        for page in pages {
            let mut fragments = page.text.split(ENTRY_CUT).collect::<Vec<&str>>();
            if fragments
                .last()
                .is_some_and(|fragment| fragment.trim().is_empty())
            {
                fragments.pop();
            }

            for fragment in fragments {
                let entry = self.entry_from_fragment(fragment);
                if entry.page_number.is_none() {
                    debug!(
                        page = page.page_number,
                        document_page = page.document_page_number,
                        text = %entry.text,
                        "fragment carries no page tag"
                    );
                }
                entries.push(entry);
            }
        }

        entries
    }

    fn entry_from_fragment(&self, fragment: &str) -> Entry {
        let (text, numbers) = match self.page_tag.captures(fragment) {
            Some(captures) => {
                let numbers = captures[1]
                    .parse::<u32>()
                    .ok()
                    .zip(captures[2].parse::<i64>().ok());
                let tag = captures.get(0).map_or(0..0, |tag| tag.range());
                let mut text = String::with_capacity(fragment.len());
                text.push_str(&fragment[..tag.start]);
                text.push_str(&fragment[tag.end..]);
                (text, numbers)
            }
            None => (fragment.to_string(), None),
        };

        let text = self
            .line_break
            .replace_all(text.trim(), " ")
            .into_owned();

        Entry {
            text,
            page_number: numbers.map(|(page, _)| page),
            document_page_number: numbers.map(|(_, document_page)| document_page),
        }
    }
}
