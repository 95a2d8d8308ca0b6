use regex::Regex;

pub fn strip(page: &str, patterns: &[Regex]) -> String {
    let mut cleaned = page.to_string();
    for pattern in patterns {
        if pattern.is_match(&cleaned) {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
    }
    cleaned
}
