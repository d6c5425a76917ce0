use async_trait::async_trait;
use oa_core::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::{Table, TableSink};

/// Keeps written tables in memory, mostly for tests and dry runs.
#[derive(Clone, Default)]
pub struct MemorySink {
    tables: Arc<RwLock<Vec<Table>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<Table> {
        self.tables.read().await.iter().find(|t| t.name == name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.tables.read().await.iter().map(|t| t.name.clone()).collect()
    }
}

#[async_trait]
impl TableSink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn write_table(&self, table: &Table) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.iter_mut().find(|t| t.name == table.name) {
            *existing = table.clone();
        } else {
            tables.push(table.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;

    #[tokio::test]
    async fn test_memory_sink_replaces_by_name() {
        let sink = MemorySink::new();
        let mut table = Table::new("metadata", vec!["idx".to_string()]);
        sink.write_table(&table).await.unwrap();

        table.push_row(vec![Cell::Int(7)]).unwrap();
        sink.write_table(&table).await.unwrap();

        assert_eq!(sink.names().await, vec!["metadata".to_string()]);
        assert_eq!(sink.get("metadata").await.unwrap().len(), 1);
        assert!(sink.get("topics").await.is_none());
    }
}
