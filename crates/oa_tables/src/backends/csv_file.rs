use async_trait::async_trait;
use oa_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use crate::{Table, TableSink};

/// Writes each table to `<dir>/<name>.csv`.
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Output(format!("Failed to create output directory {}: {}", dir.display(), e)))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

#[async_trait]
impl TableSink for CsvSink {
    fn describe(&self) -> String {
        format!("csv files in {}", self.dir.display())
    }

    async fn write_table(&self, table: &Table) -> Result<()> {
        let path = self.path_for(&table.name);
        let mut writer = csv::WriterBuilder::new().has_headers(true).from_path(&path)?;

        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;

        info!("💾 Saved {} rows to {}", table.len(), path.display());
        Ok(())
    }
}
