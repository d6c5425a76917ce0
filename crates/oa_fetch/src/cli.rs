use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use clap::{Args, Subcommand};
use oa_core::{PageFetcher, Result, WorkSource};
use oa_tables::dataset::{DEFAULT_LINK_COLUMN, DEFAULT_TITLE_COLUMN};
use oa_tables::{create_sink, Dataset, DatasetColumns, OutputFormat, SubsetCriteria};
use tracing::info;
use crate::manager::{FetchManager, FetchOptions};
use crate::pipeline::{fetch_metadata, run_pipeline, PipelineOptions};

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Article spreadsheet exported as CSV
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory the result tables are written to
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    #[arg(long, default_value = DEFAULT_LINK_COLUMN)]
    pub link_column: String,

    #[arg(long, default_value = DEFAULT_TITLE_COLUMN)]
    pub title_column: String,

    /// Pause between rows (e.g. 10ms, 1s)
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10ms")]
    pub sleep: Duration,

    /// Hide the progress bar and per-row warnings
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

impl InputArgs {
    fn columns(&self) -> DatasetColumns {
        DatasetColumns {
            link: self.link_column.clone(),
            title: self.title_column.clone(),
        }
    }

    fn options(&self) -> FetchOptions {
        FetchOptions {
            sleep: self.sleep,
            verbose: !self.quiet,
            columns: self.columns(),
        }
    }

    fn load(&self) -> Result<Dataset> {
        Dataset::from_path(&self.input)?.clean(&self.columns())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum FetchCommands {
    /// Resolve a single article and print its metadata as JSON
    Resolve {
        /// Article link, usually a DOI or publisher URL
        #[arg(default_value = "")]
        link: String,

        #[arg(short, long, default_value = "")]
        title: String,
    },
    /// Fetch metadata for every article and write the metadata table
    Fetch(InputArgs),
    /// Fetch metadata for the study subset and write all derived tables
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Skip the study subset and enrich every cleaned row
        #[arg(long)]
        all_rows: bool,

        /// Add mean normalized citation scores to the combined table
        #[arg(long)]
        mncs: bool,
    },
}

pub async fn handle_command(
    command: FetchCommands,
    source: Arc<dyn WorkSource>,
    pages: Arc<dyn PageFetcher>,
) -> Result<()> {
    match command {
        FetchCommands::Resolve { link, title } => {
            let manager = FetchManager::new(source, pages, FetchOptions::default());
            let record = manager.fetch_single_metadata(0, link.trim(), title.trim()).await;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        FetchCommands::Fetch(input) => {
            let dataset = input.load()?;
            let sink = create_sink(input.format, &input.output)?;
            let manager = FetchManager::new(source, pages, input.options());
            fetch_metadata(&dataset, &manager, sink.as_ref()).await?;
        }
        FetchCommands::Run { input, all_rows, mncs } => {
            let dataset = input.load()?;
            let sink = create_sink(input.format, &input.output)?;
            let manager = FetchManager::new(source, pages, input.options());
            let options = PipelineOptions {
                subset: (!all_rows).then(SubsetCriteria::default),
                with_mncs: mncs,
            };
            let summary = run_pipeline(dataset, &manager, sink.as_ref(), &options).await?;
            info!(
                "✅ {} articles, {} resolved, {} in combined table, {} topics",
                summary.articles, summary.resolved, summary.combined, summary.topics
            );
        }
    }
    Ok(())
}
