use async_trait::async_trait;
use oa_core::{Error, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use crate::{Table, TableSink};

/// Writes each table to `<dir>/<name>.json` as an array of objects.
pub struct JsonSink {
    dir: PathBuf,
}

impl JsonSink {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Output(format!("Failed to create output directory {}: {}", dir.display(), e)))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl TableSink for JsonSink {
    fn describe(&self) -> String {
        format!("json files in {}", self.dir.display())
    }

    async fn write_table(&self, table: &Table) -> Result<()> {
        let path = self.path_for(&table.name);
        let records = table.to_json_records()?;
        let mut writer = BufWriter::new(std::fs::File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush()?;

        info!("💾 Saved {} rows to {}", table.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;
    use serde_json::Value;

    #[tokio::test]
    async fn test_json_sink_writes_records() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::new(dir.path()).unwrap();

        let mut table = Table::new("errors", vec!["idx".to_string(), "Error".to_string()]);
        table.push_row(vec![Cell::Int(3), Cell::text("no matching work found")]).unwrap();
        sink.write_table(&table).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(sink.path_for("errors")).unwrap()).unwrap();
        assert_eq!(written[0]["idx"], Value::from(3));
        assert_eq!(written[0]["Error"], Value::from("no matching work found"));
    }
}
