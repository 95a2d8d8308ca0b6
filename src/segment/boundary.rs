use regex::{Captures, Regex};
use tracing::debug;

use super::ENTRY_CUT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedPage {
    pub page_number: u32,
    pub document_page_number: i64,
    pub text: String,
}

pub fn terminator_pattern(year_suffix_variants: &[String]) -> String {
    format!(r"(\W(?:{})\.?$)", year_suffix_variants.join("|"))
}

pub fn page_tag(page_number: u32, document_page_number: i64) -> String {
    format!("<PAGE_NUM:{page_number}><DOCUMENT_PAGE_NUM:{document_page_number}>")
}

pub fn tag_pages<S: AsRef<str>>(pages: &[S], terminator: &Regex, page_offset: i64) -> Vec<TaggedPage> {
    pages
        .iter()
        .enumerate()
        .map(|(index, page)| {
            let page_number = (index + 1) as u32;
            let document_page_number = i64::from(page_number) + page_offset;
            tag_page(page.as_ref(), terminator, page_number, document_page_number)
        })
        .collect()
}

pub fn tag_page(
    page: &str,
    terminator: &Regex,
    page_number: u32,
    document_page_number: i64,
) -> TaggedPage {
    let tag = page_tag(page_number, document_page_number);
    let mut boundaries = 0usize;
    let text = terminator
        .replace_all(page, |captures: &Captures| {
            boundaries += 1;
            format!("{tag}{}{ENTRY_CUT}", &captures[0])
        })
        .into_owned();

    debug!(page = page_number, boundaries, "tagged page");

    TaggedPage {
        page_number,
        document_page_number,
        text,
    }
}
