//! The `folio classify` command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use folio_core::{
    ClassificationResult, Config, FileSequenceCounter, Folio, MemorySequenceCounter, TagList,
};

use super::OutputFormat;

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Tags on the image, in the order they were applied
    #[arg(required = true, num_args = 1..)]
    pub tags: Vec<String>,

    /// Use this sequence number instead of drawing one from the counter
    #[arg(short, long)]
    pub sequence: Option<u64>,

    /// Counter file to draw the sequence number from (overrides config)
    #[arg(long)]
    pub counter: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let result = match args.sequence {
        Some(sequence) => {
            // Explicit numbers never touch the durable counter
            let folio = Folio::new(config, Arc::new(MemorySequenceCounter::new()));
            folio.classify(&TagList::from_raw(&args.tags), sequence)
        }
        None => {
            let counter_path = args.counter.unwrap_or_else(|| config.sequence_path());
            let folio = Folio::new(config, Arc::new(FileSequenceCounter::new(counter_path)));
            folio.classify_next(&args.tags).await?
        }
    };

    print_result(&result, args.format)
}

fn print_result(result: &ClassificationResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", location(result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}

/// Folder and filename joined into one storage key.
fn location(result: &ClassificationResult) -> String {
    format!("{}/{}", result.folder_path, result.filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Category;

    #[test]
    fn test_location_joins_folder_and_filename() {
        let result = ClassificationResult {
            folder_path: "/Reference/Kitchens".to_string(),
            filename: "0003-reference-kitchens".to_string(),
            category: Category::Reference,
        };
        assert_eq!(location(&result), "/Reference/Kitchens/0003-reference-kitchens");
    }

    #[tokio::test]
    async fn test_classify_draws_from_counter_file() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("sequence");
        std::fs::write(&counter, "41\n").unwrap();

        let args = ClassifyArgs {
            tags: vec!["precedent".to_string(), "Kitchens".to_string()],
            sequence: None,
            counter: Some(counter.clone()),
            format: OutputFormat::Json,
        };
        execute(args, Config::default()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&counter).unwrap().trim(), "42");
    }
}
