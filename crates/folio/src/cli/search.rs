//! The `folio search` command: multi-tag AND search over a catalog file.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;
use folio_core::{search, ImageRecord, MemoryTagStore, RequiredTags, SearchFilter};

use super::OutputFormat;

/// Arguments for the `search` command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Catalog JSON file (array of image records)
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Required tag; repeat for AND. No tags matches every image.
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Case-insensitive text to find in filename or title
    #[arg(long)]
    pub text: Option<String>,

    /// Stop after this many results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Execute the search command.
pub async fn execute(args: SearchArgs) -> anyhow::Result<()> {
    let required = RequiredTags::parse(&args.tags)
        .map_err(|e| anyhow::anyhow!("Invalid --tag value: {e}"))?;
    let store = MemoryTagStore::load_catalog(&args.catalog)?;

    let mut filter = SearchFilter::new(required);
    if let Some(text) = &args.text {
        filter = filter.with_text(text);
    }

    let found = run(&store, &filter, args.limit).await?;
    tracing::info!(
        "{} of {} images match",
        found.len(),
        store.records().len()
    );

    match args.format {
        OutputFormat::Text => {
            for record in &found {
                println!("{}\t{}", record.id, record.file_name);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
    }
    Ok(())
}

/// Tag matches from the store, narrowed by the text filter, in catalog order.
async fn run<'a>(
    store: &'a MemoryTagStore,
    filter: &SearchFilter,
    limit: Option<usize>,
) -> anyhow::Result<Vec<&'a ImageRecord>> {
    let hits: HashSet<_> = search(store, &store.ids(), &filter.tags)
        .await?
        .into_iter()
        .collect();
    Ok(store
        .records()
        .iter()
        .filter(|r| hits.contains(&r.id) && filter.matches(r))
        .take(limit.unwrap_or(usize::MAX))
        .collect())
}
