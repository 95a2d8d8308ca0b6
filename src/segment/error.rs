use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    FrontMatter,
    Appendix,
}

impl Boundary {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FrontMatter => "front_matter",
            Self::Appendix => "appendix",
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("no rule set configured for year {year}")]
    MissingRuleSet { year: String },

    #[error("year {year}: pattern failed to compile: {pattern}")]
    InvalidPattern {
        year: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("year {year}: no year-suffix variants configured")]
    NoYearSuffixVariants { year: String },

    #[error("year {year}: {boundary} anchor did not match: {pattern}")]
    BoundaryNotFound {
        year: String,
        boundary: Boundary,
        pattern: String,
    },
}

impl SegmentError {
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::BoundaryNotFound { .. })
    }

    pub fn kind(&self) -> &'static str {
        if self.is_configuration() {
            "configuration"
        } else {
            "boundary_not_found"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentWarning {
    MissingPageTag { index: usize, text: String },
    UnexpectedFragment { index: usize, remainder: String },
}

impl fmt::Display for SegmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPageTag { index, text } => {
                write!(f, "merged entry {index} has no page tag: {text}")
            }
            Self::UnexpectedFragment { index, remainder } => {
                write!(
                    f,
                    "entry {index} has more than one merge point, left unsplit: {remainder}"
                )
            }
        }
    }
}
