//! The `folio dedup` command: near-duplicate detection over a directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use folio_core::dedup::{ScanFailure, ScanOptions};
use folio_core::{
    CancelHandle, Config, DuplicateGroup, DuplicateScanner, FingerprintCache, Linkage,
    LocalObjectStore, ObjectStore, ScanEvent, ScanItem, ScanReport,
};
use serde::Serialize;

use super::OutputFormat;

/// Arguments for the `dedup` command.
#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Root directory of the image library
    #[arg(required = true)]
    pub root: PathBuf,

    /// Only scan this folder below the root
    #[arg(long, default_value = "")]
    pub folder: String,

    /// Maximum Hamming distance between duplicates (overrides config)
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// How new images link to existing groups (overrides config)
    #[arg(long, value_enum)]
    pub linkage: Option<LinkageArg>,

    /// Number of images fingerprinted concurrently (overrides config)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Fingerprint cache file, read before and written after the scan
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format for stdout
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Command-line spelling of [`Linkage`].
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LinkageArg {
    /// Within threshold of any group member
    AnyMember,
    /// Within threshold of the group's first member
    Representative,
}

impl From<LinkageArg> for Linkage {
    fn from(arg: LinkageArg) -> Self {
        match arg {
            LinkageArg::AnyMember => Linkage::AnyMember,
            LinkageArg::Representative => Linkage::Representative,
        }
    }
}

/// A group as written to the report, with storage paths instead of ids.
#[derive(Debug, Serialize)]
struct GroupOutput {
    keep: String,
    duplicates: Vec<DuplicateOutput>,
}

#[derive(Debug, Serialize)]
struct DuplicateOutput {
    path: String,
    distance: u32,
}

#[derive(Debug, Serialize)]
struct DedupOutput {
    scanned: usize,
    groups: Vec<GroupOutput>,
    failures: Vec<ScanFailure>,
    cancelled: bool,
}

/// Execute the dedup command.
pub async fn execute(args: DedupArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args)?;

    let store = Arc::new(LocalObjectStore::new(
        &args.root,
        config.scan.supported_formats.clone(),
    ));
    let paths = store.list(&args.folder).await?;
    if paths.is_empty() {
        anyhow::bail!(
            "No supported images under {}",
            args.root.join(&args.folder).display()
        );
    }
    let items: Vec<ScanItem> = paths
        .iter()
        .enumerate()
        .map(|(i, path)| ScanItem::new(i as u64 + 1, path.as_str()))
        .collect();

    let cache = Arc::new(load_cache(args.cache.as_deref()));
    let scanner = DuplicateScanner::new(store, cache.clone(), ScanOptions::from_config(&config));

    let cancel = CancelHandle::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing images in flight");
            on_signal.cancel();
        }
    });

    let progress = create_progress_bar(items.len() as u64);
    let bar = progress.clone();
    let report = scanner
        .scan(&items, &cancel, move |event| {
            if let ScanEvent::Failed(id) = event {
                bar.set_message(format!("failed: #{id}"));
            }
            bar.inc(1);
        })
        .await?;
    progress.finish_and_clear();

    if let Some(path) = &args.cache {
        cache.save(path)?;
        tracing::debug!("Saved {} fingerprints to {:?}", cache.len(), path);
    }

    let output = build_output(&items, report);
    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&output)?)?;
        tracing::info!("Report written to {:?}", path);
    }
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print_summary(&output),
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &DedupArgs) -> anyhow::Result<()> {
    if let Some(threshold) = args.threshold {
        config.dedup.threshold = threshold;
    }
    if let Some(linkage) = args.linkage {
        config.dedup.linkage = linkage.into();
    }
    if let Some(parallel) = args.parallel {
        config.scan.parallel_workers = parallel;
    }
    config.validate()?;
    Ok(())
}

/// A missing or unreadable cache starts empty rather than failing the scan.
fn load_cache(path: Option<&Path>) -> FingerprintCache {
    match path {
        Some(path) if path.exists() => FingerprintCache::load(path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring fingerprint cache {:?}: {e}", path);
            FingerprintCache::new()
        }),
        _ => FingerprintCache::new(),
    }
}

fn build_output(items: &[ScanItem], report: ScanReport) -> DedupOutput {
    // Ids are 1-based positions in `items`
    let path_of = |id: u64| {
        (id as usize)
            .checked_sub(1)
            .and_then(|i| items.get(i))
            .map(|item| item.path.clone())
            .unwrap_or_default()
    };
    let to_output = |group: &DuplicateGroup| GroupOutput {
        keep: path_of(group.canonical()),
        duplicates: group
            .duplicates()
            .map(|m| DuplicateOutput {
                path: path_of(m.id),
                distance: m.distance,
            })
            .collect(),
    };

    DedupOutput {
        scanned: items.len() - report.not_started,
        groups: report.groups.iter().map(to_output).collect(),
        failures: report.failures,
        cancelled: report.cancelled,
    }
}

/// Create a progress bar for the scan.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("fingerprinting...");
    pb
}

fn print_summary(output: &DedupOutput) {
    for group in &output.groups {
        println!("keep {}", group.keep);
        for dup in &group.duplicates {
            println!("  dup {} (distance {})", dup.path, dup.distance);
        }
    }

    let duplicates: usize = output.groups.iter().map(|g| g.duplicates.len()).sum();
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Scanned:      {:>8}", output.scanned);
    eprintln!("    Groups:       {:>8}", output.groups.len());
    eprintln!("    Duplicates:   {:>8}", duplicates);
    if !output.failures.is_empty() {
        eprintln!("    Failed:       {:>8}", output.failures.len());
    }
    if output.cancelled {
        eprintln!("    (scan cancelled before completion)");
    }
    eprintln!("  ====================================");
}
