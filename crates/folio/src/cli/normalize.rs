//! The `folio normalize` command: administrative tag cleanup over a catalog.
//!
//! Tags are normalized on entry, but catalogs imported from elsewhere may
//! carry several spellings of one tag. This reports them and, with
//! `--write`, rewrites the catalog with normalized, de-duplicated tags.

use std::path::PathBuf;

use clap::Args;
use folio_core::tags::{merge_report, TagMerge};
use folio_core::{ImageRecord, TagList};
use serde::Serialize;

use super::{read_catalog, OutputFormat};

/// Arguments for the `normalize` command.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Catalog JSON file (array of image records)
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Rewrite the catalog in place with normalized tags
    #[arg(long)]
    pub write: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct NormalizeReport {
    merges: Vec<TagMerge>,
    blank: Vec<String>,
    /// Records whose tag list changed
    changed_records: usize,
}

/// Execute the normalize command.
pub async fn execute(args: NormalizeArgs) -> anyhow::Result<()> {
    let mut records = read_catalog(&args.catalog)?;

    let spellings = records.iter().flat_map(|r| r.tags.iter());
    let (merges, blank) = merge_report(spellings);
    let changed_records = normalize_records(&mut records);
    let report = NormalizeReport {
        merges,
        blank,
        changed_records,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if args.write && report.changed_records > 0 {
        std::fs::write(&args.catalog, serde_json::to_string_pretty(&records)?)?;
        tracing::info!(
            "Rewrote {} records in {}",
            report.changed_records,
            args.catalog.display()
        );
    }
    Ok(())
}

/// Replace every record's tags with their normalized form. Returns the
/// number of records that changed.
fn normalize_records(records: &mut [ImageRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        let normalized: Vec<String> = TagList::from_raw(&record.tags).into();
        if normalized != record.tags {
            record.tags = normalized;
            changed += 1;
        }
    }
    changed
}

fn print_report(report: &NormalizeReport) {
    if report.merges.is_empty() && report.blank.is_empty() {
        println!("All tags are already normalized.");
    }
    for merge in &report.merges {
        println!("{} <- {}", merge.tag, merge.variants.join(" | "));
    }
    if !report.blank.is_empty() {
        println!("{} blank tag spellings will be dropped", report.blank.len());
    }
    println!("{} records need rewriting", report.changed_records);
}
