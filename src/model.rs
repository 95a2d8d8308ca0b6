use serde::{Deserialize, Serialize};

use crate::segment::{SegmentWarning, SegmentationStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub year: String,
    pub scan: Option<String>,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub file_count: usize,
    pub sources: Vec<SourceFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPaths {
    pub source_dir: String,
    pub rules_path: String,
    pub output_dir: String,
    pub inventory_manifest_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: String,
    pub source_file: String,
    pub output_path: String,
    pub page_offset: i64,
    pub page_count: usize,
    pub raw_entry_count: usize,
    pub untagged_entry_count: usize,
    pub merged_entry_count: usize,
    pub entry_count: usize,
    pub warnings: Vec<String>,
}

impl YearSummary {
    pub fn new(
        year: &str,
        source_file: String,
        output_path: String,
        stats: &SegmentationStats,
        warnings: &[SegmentWarning],
    ) -> Self {
        Self {
            year: year.to_string(),
            source_file,
            output_path,
            page_offset: stats.page_offset,
            page_count: stats.page_count,
            raw_entry_count: stats.raw_entry_count,
            untagged_entry_count: stats.untagged_entry_count,
            merged_entry_count: stats.merged_entry_count,
            entry_count: stats.entry_count,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearFailure {
    pub year: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: SegmentPaths,
    pub years: Vec<YearSummary>,
    pub failures: Vec<YearFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldParseFailure {
    pub row: usize,
    pub entry: String,
    pub completion: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldParseReport {
    pub generated_at: String,
    pub entries_path: String,
    pub completions_path: String,
    pub output_path: String,
    pub entry_count: usize,
    pub record_count: usize,
    pub failures: Vec<FieldParseFailure>,
}
