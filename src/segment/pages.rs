pub const PAGE_BREAK: char = '\u{000C}';

pub fn to_pages(entry_body: &str) -> Vec<&str> {
    entry_body.split(PAGE_BREAK).collect()
}
