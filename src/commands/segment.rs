use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use csv::{Terminator, WriterBuilder};
use tracing::{error, info, warn};

use crate::cli::SegmentArgs;
use crate::commands::inventory;
use crate::model::{
    SegmentPaths, SegmentRunManifest, SourceFile, SourceInventoryManifest, YearFailure,
    YearSummary,
};
use crate::rules::RuleProvider;
use crate::segment::{Entry, SegmentError, Segmenter};
use crate::util::{
    ensure_directory, now_utc_string, read_text_lossy, utc_compact_string, write_json_pretty,
};

pub fn run(args: SegmentArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("segment-{}", utc_compact_string(started_ts));

    ensure_directory(&args.output_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&args.source_dir));
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir(&args.output_dir).join(format!(
            "segment_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(source_dir = %args.source_dir.display(), run_id = %run_id, "starting segmentation");

    let inventory = load_or_refresh_inventory(
        &args.source_dir,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;
    let sources = inventory::select_sources(&inventory);
    let provider = RuleProvider::load(&args.rules_path)?;

    let years = if args.years.is_empty() {
        provider.years()
    } else {
        args.years.clone()
    };

    let mut summaries = Vec::with_capacity(years.len());
    let mut failures = Vec::new();
    for year in &years {
        match segment_year(&args, &provider, &sources, year) {
            Ok(summary) => summaries.push(summary),
            Err(err) => {
                let reason = format!("{err:#}");
                error!(year = %year, error = %reason, "year failed");
                failures.push(YearFailure {
                    year: year.clone(),
                    kind: failure_kind(&err).to_string(),
                    reason,
                });
            }
        }
    }

    let manifest = SegmentRunManifest {
        manifest_version: 1,
        run_id,
        status: if failures.is_empty() {
            "completed".to_string()
        } else {
            "completed_with_failures".to_string()
        },
        started_at,
        updated_at: now_utc_string(),
        command: render_segment_command(&args),
        paths: SegmentPaths {
            source_dir: args.source_dir.display().to_string(),
            rules_path: provider.path().display().to_string(),
            output_dir: args.output_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
        },
        years: summaries,
        failures,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    info!(path = %run_manifest_path.display(), "wrote segment run manifest");

    let entries_total = manifest
        .years
        .iter()
        .map(|summary| summary.entry_count)
        .sum::<usize>();
    info!(
        years = manifest.years.len(),
        failed = manifest.failures.len(),
        entries = entries_total,
        "segmentation completed"
    );

    if !manifest.failures.is_empty() {
        let failed = manifest
            .failures
            .iter()
            .map(|failure| failure.year.as_str())
            .collect::<Vec<&str>>()
            .join(", ");
        bail!(
            "{} of {} years failed ({failed}); see {}",
            manifest.failures.len(),
            years.len(),
            run_manifest_path.display()
        );
    }

    Ok(())
}

pub fn manifest_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("manifests")
}

fn segment_year(
    args: &SegmentArgs,
    provider: &RuleProvider,
    sources: &BTreeMap<String, &SourceFile>,
    year: &str,
) -> Result<YearSummary> {
    let rules = provider.rules_for(year)?;
    let source_path = resolve_source_path(&args.source_dir, provider, sources, year)?;
    let raw = read_text_lossy(&source_path)?;

    info!(year = %year, source = %source_path.display(), chars = raw.len(), "segmenting catalogue year");

    let segmenter = Segmenter::new(rules)?;
    let segmentation = segmenter.segment(&raw)?;
    let stats = &segmentation.stats;

    info!(
        year = %segmenter.year(),
        page_offset = stats.page_offset,
        pages = stats.page_count,
        entries = stats.raw_entry_count,
        untagged = stats.untagged_entry_count,
        merged = stats.merged_entry_count,
        merged_ratio = stats.merged_ratio(),
        entries_after_correction = stats.entry_count,
        "segmented catalogue year"
    );

    let output_path = args.output_dir.join(format!("entries_19{year}.csv"));
    write_entries_csv(&output_path, &segmentation.entries)?;
    info!(path = %output_path.display(), rows = segmentation.entries.len(), "wrote entries");

    Ok(YearSummary::new(
        year,
        source_path.display().to_string(),
        output_path.display().to_string(),
        stats,
        &segmentation.warnings,
    ))
}

fn resolve_source_path(
    source_dir: &Path,
    provider: &RuleProvider,
    sources: &BTreeMap<String, &SourceFile>,
    year: &str,
) -> Result<PathBuf> {
    if let Some(filename) = provider.source_file(year) {
        return Ok(source_dir.join(filename));
    }

    sources
        .get(year)
        .map(|source| source_dir.join(&source.filename))
        .with_context(|| {
            format!(
                "no OCR text file for year {year} in {}",
                source_dir.display()
            )
        })
}

pub fn write_entries_csv(path: &Path, entries: &[Entry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer
        .write_record(["entry", "page_num", "doc_page_num"])
        .with_context(|| format!("failed to write header to {}", path.display()))?;
    for entry in entries {
        writer
            .serialize(entry)
            .with_context(|| format!("failed to write entry to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}

fn failure_kind(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<SegmentError>()
        .map_or("io", SegmentError::kind)
}

fn load_or_refresh_inventory(
    source_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<SourceInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(source_dir)?;
        if manifest.sources.is_empty() {
            warn!(
                source_dir = %source_dir.display(),
                "no catalogue OCR text files found; years need a source_file override"
            );
        }
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            file_count = manifest.file_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: SourceInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        file_count = manifest.file_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

fn render_segment_command(args: &SegmentArgs) -> String {
    let mut command = vec![
        "ecb-entries".to_string(),
        "segment".to_string(),
        "--source-dir".to_string(),
        args.source_dir.display().to_string(),
        "--rules-path".to_string(),
        args.rules_path.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
    ];

    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.run_manifest_path {
        command.push("--run-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    for year in &args.years {
        command.push("--year".to_string());
        command.push(year.clone());
    }

    command.join(" ")
}
