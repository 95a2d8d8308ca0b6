use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{SourceFile, SourceInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir)?;
    if manifest.sources.is_empty() {
        bail!(
            "no catalogue OCR text files found in {}",
            args.source_dir.display()
        );
    }

    for (year, source) in select_sources(&manifest) {
        info!(year = %year, file = %source.filename, "selected OCR source");
    }

    if args.dry_run {
        info!(
            file_count = manifest.file_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.source_dir));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(file_count = manifest.file_count, "inventory completed");

    Ok(())
}

pub fn default_manifest_path(source_dir: &Path) -> PathBuf {
    source_dir.join("manifests").join("source_inventory.json")
}

pub fn build_manifest(source_dir: &Path) -> Result<SourceInventoryManifest> {
    let pattern = Regex::new(r"^ecb_19(\d{2})(?:_([A-Za-z]+))?(?:_\d+)?\.txt$")
        .context("failed to compile OCR filename regex")?;

    let mut text_paths = discover_text_files(source_dir)?;
    text_paths.sort();

    let mut sources = Vec::with_capacity(text_paths.len());
    for path in text_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let Some((year, scan)) = parse_year_scan(&filename, &pattern) else {
            continue;
        };
        let sha256 = sha256_file(&path)?;

        sources.push(SourceFile {
            filename,
            year,
            scan,
            sha256,
        });
    }

    sources.sort_by(|a, b| a.year.cmp(&b.year).then(a.filename.cmp(&b.filename)));

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        file_count: sources.len(),
        sources,
    })
}

/// Picks one OCR file per year: a named re-scan beats the plain scan, and the
/// latest-stamped re-scan wins among several.
pub fn select_sources(manifest: &SourceInventoryManifest) -> BTreeMap<String, &SourceFile> {
    let mut selected = BTreeMap::<String, &SourceFile>::new();
    for source in &manifest.sources {
        let replace = match selected.get(&source.year) {
            None => true,
            Some(current) => {
                (source.scan.is_some(), source.filename.as_str())
                    > (current.scan.is_some(), current.filename.as_str())
            }
        };
        if replace {
            selected.insert(source.year.clone(), source);
        }
    }
    selected
}

fn discover_text_files(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if is_text {
            files.push(path);
        }
    }

    Ok(files)
}

fn parse_year_scan(filename: &str, pattern: &Regex) -> Option<(String, Option<String>)> {
    let captures = pattern.captures(filename)?;
    let year = captures.get(1)?.as_str().to_string();
    let scan = captures
        .get(2)
        .map(|value| value.as_str().to_ascii_lowercase());
    Some((year, scan))
}
