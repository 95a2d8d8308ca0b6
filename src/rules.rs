use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::info;

use crate::segment::{SegmentError, terminator_pattern};

/// On-disk rules file: one entry per two-digit catalogue year.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesFile {
    pub years: BTreeMap<String, YearRules>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YearRules {
    pub front_matter_anchor: String,
    pub appendix_anchor: String,
    pub year_suffix_variants: Vec<String>,
    #[serde(default)]
    pub header_noise_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub source_file: Option<String>,
}

/// Compiled structural rules for one catalogue year.
#[derive(Debug, Clone)]
pub struct YearRuleSet {
    pub year: String,
    pub front_matter_anchor: Regex,
    pub appendix_anchor: Regex,
    pub year_suffix_variants: Vec<String>,
    pub entry_terminator: Regex,
    pub header_noise_patterns: Vec<Regex>,
}

#[derive(Debug, Clone)]
pub struct RuleProvider {
    path: PathBuf,
    rules: RulesFile,
}

impl RuleProvider {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let rules: RulesFile = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        info!(
            path = %path.display(),
            years = rules.years.len(),
            "loaded year rules"
        );

        Ok(Self {
            path: path.to_path_buf(),
            rules,
        })
    }

    #[cfg(test)]
    pub fn from_rules(rules: RulesFile) -> Self {
        Self {
            path: PathBuf::new(),
            rules,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn years(&self) -> Vec<String> {
        self.rules.years.keys().cloned().collect()
    }

    pub fn source_file(&self, year: &str) -> Option<&str> {
        self.rules
            .years
            .get(year)
            .and_then(|rules| rules.source_file.as_deref())
    }

    pub fn rules_for(&self, year: &str) -> Result<YearRuleSet, SegmentError> {
        let rules = self
            .rules
            .years
            .get(year)
            .ok_or_else(|| SegmentError::MissingRuleSet {
                year: year.to_string(),
            })?;

        if rules.year_suffix_variants.is_empty() {
            return Err(SegmentError::NoYearSuffixVariants {
                year: year.to_string(),
            });
        }

        let front_matter_anchor = compile(year, &rules.front_matter_anchor, false, false)?;
        let appendix_anchor = compile(year, &rules.appendix_anchor, false, true)?;
        let entry_terminator =
            compile(year, &terminator_pattern(&rules.year_suffix_variants), true, false)?;

        let noise_sources = rules
            .header_noise_patterns
            .clone()
            .unwrap_or_else(|| default_header_noise_patterns(year));
        let header_noise_patterns = noise_sources
            .iter()
            .map(|pattern| compile(year, pattern, true, false))
            .collect::<Result<Vec<Regex>, SegmentError>>()?;

        Ok(YearRuleSet {
            year: year.to_string(),
            front_matter_anchor,
            appendix_anchor,
            year_suffix_variants: rules.year_suffix_variants.clone(),
            entry_terminator,
            header_noise_patterns,
        })
    }
}

/// Boilerplate lines every page of the catalogue carries, in removal order.
pub fn default_header_noise_patterns(year: &str) -> Vec<String> {
    vec![
        // alphabetical guide words, e.g. "ABBOTT—ADAMS"
        r"^[A-Z](?:[A-Z '\-—–]*[A-Z])?[ \t]?\n".to_string(),
        // page-number markers
        r"##(?s:.*?)$".to_string(),
        format!(r"^.?19{}.?\n", regex::escape(year)),
        r"^\d+\n".to_string(),
    ]
}

fn compile(
    year: &str,
    pattern: &str,
    multi_line: bool,
    dot_matches_new_line: bool,
) -> Result<Regex, SegmentError> {
    RegexBuilder::new(pattern)
        .multi_line(multi_line)
        .dot_matches_new_line(dot_matches_new_line)
        .build()
        .map_err(|source| SegmentError::InvalidPattern {
            year: year.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(raw: &str) -> RuleProvider {
        let rules: RulesFile = serde_json::from_str(raw).expect("rules json should parse");
        RuleProvider::from_rules(rules)
    }

    const RULES: &str = r#"
    {
      "years": {
        "17": {
          "front_matter_anchor": "ENGLISH CATALOGUE\\s+OF BOOKS",
          "appendix_anchor": "DIRECTORY OF.*?PUBLISHERS",
          "year_suffix_variants": ["17", "'17"],
          "source_file": "ecb_1917.txt"
        },
        "18": {
          "front_matter_anchor": "(unclosed",
          "appendix_anchor": "APPENDIX",
          "year_suffix_variants": ["18"]
        },
        "19": {
          "front_matter_anchor": "BOOKS",
          "appendix_anchor": "APPENDIX",
          "year_suffix_variants": []
        }
      }
    }
    "#;

    #[test]
    fn rules_for_compiles_configured_year() {
        let rules = provider(RULES).rules_for("17").expect("year 17 compiles");

        assert_eq!(rules.year, "17");
        assert_eq!(rules.year_suffix_variants, vec!["17", "'17"]);
        assert_eq!(rules.header_noise_patterns.len(), 4);
        assert!(rules.front_matter_anchor.is_match("ENGLISH CATALOGUE\nOF BOOKS"));
        assert!(rules.appendix_anchor.is_match("DIRECTORY OF\nLONDON PUBLISHERS"));
        assert!(rules.entry_terminator.is_match("Smith.\nJan '17\nnext"));
    }

    #[test]
    fn rules_for_unknown_year_is_configuration_error() {
        let error = provider(RULES).rules_for("05").expect_err("year 05 is missing");

        assert!(matches!(error, SegmentError::MissingRuleSet { ref year } if year == "05"));
        assert!(error.is_configuration());
    }

    #[test]
    fn rules_for_reports_offending_pattern() {
        let error = provider(RULES).rules_for("18").expect_err("bad pattern");

        match error {
            SegmentError::InvalidPattern { year, pattern, .. } => {
                assert_eq!(year, "18");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rules_for_rejects_empty_year_suffix_variants() {
        let error = provider(RULES).rules_for("19").expect_err("no variants");
        assert!(matches!(error, SegmentError::NoYearSuffixVariants { .. }));
    }

    #[test]
    fn source_file_override_is_exposed_per_year() {
        let provider = provider(RULES);
        assert_eq!(provider.source_file("17"), Some("ecb_1917.txt"));
        assert_eq!(provider.source_file("18"), None);
        assert_eq!(provider.years(), vec!["17", "18", "19"]);
    }

    #[test]
    fn default_noise_patterns_cover_year_header() {
        let patterns = default_header_noise_patterns("17");
        let year_header = Regex::new(&format!("(?m){}", patterns[2])).expect("compiles");

        assert!(year_header.is_match("1917\n"));
        assert!(year_header.is_match("[1917]\n"));
        assert!(!year_header.is_match("1918\n"));
    }
}
