use async_trait::async_trait;
use oa_core::Result;
use std::path::Path;
use std::sync::Arc;

pub mod backends;
pub mod citation;
pub mod dataset;
pub mod derived;
pub mod subset;
pub mod table;
pub mod topics;

pub use backends::*;
pub use dataset::{Dataset, DatasetColumns, SharingClass};
pub use subset::SubsetCriteria;
pub use table::{Cell, Table};

/// Destination for derived tables.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Where the tables end up, for log lines
    fn describe(&self) -> String;

    /// Write one table, replacing any earlier table of the same name
    async fn write_table(&self, table: &Table) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

pub fn create_sink(format: OutputFormat, dir: &Path) -> Result<Arc<dyn TableSink>> {
    let sink: Arc<dyn TableSink> = match format {
        OutputFormat::Csv => Arc::new(CsvSink::new(dir)?),
        OutputFormat::Json => Arc::new(JsonSink::new(dir)?),
    };
    Ok(sink)
}
