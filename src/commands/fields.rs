use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::FieldsArgs;
use crate::model::{FieldParseFailure, FieldParseReport};
use crate::records::{FIELD_COLUMNS, FieldRecord, parse_completion};
use crate::util::{ensure_directory, now_utc_string, write_json_pretty};

#[derive(Debug, Clone, Deserialize)]
struct EntryRow {
    entry: String,
    page_num: Option<u32>,
    doc_page_num: Option<i64>,
}

pub fn run(args: FieldsArgs) -> Result<()> {
    let entries = read_entries(&args.entries_path)?;
    let completions = read_completions(&args.completions_path)?;

    if entries.len() != completions.len() {
        bail!(
            "{} has {} entries but {} has {} completions",
            args.entries_path.display(),
            entries.len(),
            args.completions_path.display(),
            completions.len()
        );
    }

    info!(
        entries = entries.len(),
        path = %args.entries_path.display(),
        "parsing extractor completions"
    );

    if let Some(parent) = args.output_path.parent() {
        ensure_directory(parent)?;
    }
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(&args.output_path)
        .with_context(|| format!("failed to create {}", args.output_path.display()))?;

    let mut header = vec!["original_entry", "page_num", "doc_page_num"];
    header.extend(FIELD_COLUMNS);
    writer
        .write_record(&header)
        .with_context(|| format!("failed to write header to {}", args.output_path.display()))?;

    let mut failures = Vec::new();
    let mut record_count = 0usize;
    for (row, (entry, completion)) in entries.iter().zip(&completions).enumerate() {
        let records = match parse_completion(completion) {
            Ok(parsed) => parsed.into_records(),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(row, error = %error, "unparseable completion");
                failures.push(FieldParseFailure {
                    row,
                    entry: entry.entry.clone(),
                    completion: completion.clone(),
                    error,
                });
                vec![FieldRecord::default()]
            }
        };

        let page_num = entry.page_num.map(|page| page.to_string()).unwrap_or_default();
        let doc_page_num = entry
            .doc_page_num
            .map(|page| page.to_string())
            .unwrap_or_default();
        for record in &records {
            let mut fields = vec![entry.entry.as_str(), page_num.as_str(), doc_page_num.as_str()];
            fields.extend(record.values());
            writer
                .write_record(&fields)
                .with_context(|| format!("failed to write row to {}", args.output_path.display()))?;
        }
        record_count += records.len();
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", args.output_path.display()))?;

    let errors_path = args
        .errors_path
        .clone()
        .unwrap_or_else(|| default_errors_path(&args.output_path));
    let report = FieldParseReport {
        generated_at: now_utc_string(),
        entries_path: args.entries_path.display().to_string(),
        completions_path: args.completions_path.display().to_string(),
        output_path: args.output_path.display().to_string(),
        entry_count: entries.len(),
        record_count,
        failures,
    };
    write_json_pretty(&errors_path, &report)?;

    info!(
        records = report.record_count,
        failed = report.failures.len(),
        path = %args.output_path.display(),
        "wrote field records"
    );

    Ok(())
}

pub fn default_errors_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("errors.json")
}

fn read_entries(path: &Path) -> Result<Vec<EntryRow>> {
    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(row, result)| {
            result.with_context(|| format!("failed to read row {row} of {}", path.display()))
        })
        .collect()
}

// one JSON string per line, blank lines ignored
fn read_completions(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<String>(line).with_context(|| {
                format!("line {} of {} is not a JSON string", index + 1, path.display())
            })
        })
        .collect()
}
