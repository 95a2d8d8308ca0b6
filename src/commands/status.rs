use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::{inventory, segment};
use crate::model::{SegmentRunManifest, SourceInventoryManifest};

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = inventory::default_manifest_path(&args.source_dir);
    let manifest_dir = segment::manifest_dir(&args.output_dir);

    info!(output_dir = %args.output_dir.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: SourceInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            file_count = inventory.file_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    let Some(run_path) = latest_run_manifest(&manifest_dir)? else {
        warn!(path = %manifest_dir.display(), "no segment run manifest found");
        return Ok(());
    };

    let raw =
        fs::read(&run_path).with_context(|| format!("failed to read {}", run_path.display()))?;
    let manifest: SegmentRunManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", run_path.display()))?;

    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        updated_at = %manifest.updated_at,
        years = manifest.years.len(),
        failed = manifest.failures.len(),
        "loaded segment run manifest"
    );

    for summary in &manifest.years {
        info!(
            year = %summary.year,
            entries = summary.entry_count,
            merged = summary.merged_entry_count,
            untagged = summary.untagged_entry_count,
            warnings = summary.warnings.len(),
            output = %summary.output_path,
            "year segmented"
        );
    }
    for failure in &manifest.failures {
        warn!(
            year = %failure.year,
            kind = %failure.kind,
            reason = %failure.reason,
            "year failed"
        );
    }

    Ok(())
}

/// Run manifests carry a compact UTC stamp, so the last name is the newest.
fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("segment_run_") && name.ends_with(".json"));
        if is_run_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_run_manifest_picks_newest_stamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in [
            "segment_run_20240101T000000Z.json",
            "segment_run_20240301T120000Z.json",
            "segment_run_20240201T000000Z.json",
            "notes.json",
        ] {
            fs::write(dir.path().join(name), "{}").expect("write fixture");
        }

        let latest = latest_run_manifest(dir.path()).expect("reads dir");

        assert_eq!(
            latest,
            Some(dir.path().join("segment_run_20240301T120000Z.json"))
        );
    }

    #[test]
    fn latest_run_manifest_is_none_without_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("manifests");
        assert_eq!(latest_run_manifest(&missing).expect("no error"), None);
    }
}
