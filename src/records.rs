use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Field record returned by the downstream extractor for one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(default)]
    pub opening_bits: String,
    #[serde(default, rename = "author(s)")]
    pub authors: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub little_bits: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub date: String,
}

pub const FIELD_COLUMNS: [&str; 7] = [
    "opening_bits",
    "author(s)",
    "title",
    "format",
    "little_bits",
    "publisher",
    "date",
];

impl FieldRecord {
    pub fn values(&self) -> [&str; 7] {
        [
            self.opening_bits.as_str(),
            self.authors.as_str(),
            self.title.as_str(),
            self.format.as_str(),
            self.little_bits.as_str(),
            self.publisher.as_str(),
            self.date.as_str(),
        ]
    }
}

/// The extractor answers with one record or, for some entries, a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParsedFields {
    Multiple(Vec<FieldRecord>),
    Single(FieldRecord),
}

impl ParsedFields {
    pub fn into_records(self) -> Vec<FieldRecord> {
        match self {
            Self::Multiple(records) => records,
            Self::Single(record) => vec![record],
        }
    }
}

/// Parses a completion, tolerating a surrounding ```json fence.
pub fn parse_completion(raw: &str) -> Result<ParsedFields> {
    let mut body = raw.trim();
    if let Some(stripped) = body.strip_prefix("```json") {
        body = stripped.trim();
    } else if let Some(stripped) = body.strip_prefix("```") {
        body = stripped.trim();
    }
    if let Some(stripped) = body.strip_suffix("```") {
        body = stripped.trim();
    }

    serde_json::from_str(body).context("failed to parse extractor completion")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_completion_strips_json_fence() {
        let raw = "```json\n{\"author(s)\": \"Pollock (John)\", \"title\": \"War and revolution in Russia.\", \"publisher\": \"CONSTABLE\", \"date\": \"Mar '18\"}\n```";

        let records = parse_completion(raw).expect("fenced json parses").into_records();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].authors, "Pollock (John)");
        assert_eq!(records[0].date, "Mar '18");
        assert!(records[0].format.is_empty());
    }

    #[test]
    fn parse_completion_accepts_record_lists() {
        let raw = r#"[{"title": "First"}, {"title": "Second"}]"#;

        let parsed = parse_completion(raw).expect("list parses");

        assert!(matches!(parsed, ParsedFields::Multiple(ref records) if records.len() == 2));
        let titles = parsed
            .into_records()
            .into_iter()
            .map(|record| record.title)
            .collect::<Vec<String>>();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn parse_completion_rejects_non_json() {
        assert!(parse_completion("Sorry, I cannot help with that.").is_err());
    }
}
