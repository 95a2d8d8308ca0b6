use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ecb-entries",
    version,
    about = "Segment OCR text of the English Catalogue of Books into entries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Segment(SegmentArgs),
    Status(StatusArgs),
    Fields(FieldsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "ecb_ocr_text")]
    pub source_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    #[arg(long, default_value = "ecb_ocr_text")]
    pub source_dir: PathBuf,

    #[arg(long, default_value = "ecb_rules.json")]
    pub rules_path: PathBuf,

    #[arg(long, default_value = "entries")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    /// Two-digit catalogue year, e.g. 17; repeatable. Defaults to every year in the rules file.
    #[arg(long = "year")]
    pub years: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "ecb_ocr_text")]
    pub source_dir: PathBuf,

    #[arg(long, default_value = "entries")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct FieldsArgs {
    /// Entries CSV written by `segment`.
    #[arg(long)]
    pub entries_path: PathBuf,

    /// JSON Lines file with one extractor completion string per entry row.
    #[arg(long)]
    pub completions_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,

    #[arg(long)]
    pub errors_path: Option<PathBuf>,
}
