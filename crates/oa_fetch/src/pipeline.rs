use oa_core::{FetchRecord, Result};
use oa_tables::derived::{combined_table, errors_table, metadata_table};
use oa_tables::topics::{aggregate_topics, name_topics, topics_table};
use oa_tables::{Dataset, SubsetCriteria, TableSink};
use tracing::{info, warn};
use crate::manager::FetchManager;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Restrict the dataset to a study subset before fetching
    pub subset: Option<SubsetCriteria>,
    pub with_mncs: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub articles: usize,
    pub resolved: usize,
    pub failed: usize,
    pub combined: usize,
    pub topics: usize,
}

/// Fetch metadata for every row of a cleaned dataset and write the
/// `metadata` table.
pub async fn fetch_metadata(dataset: &Dataset, manager: &FetchManager, sink: &dyn TableSink) -> Result<Vec<FetchRecord>> {
    let records = manager.fetch_all_metadata(&dataset.rows).await?;
    sink.write_table(&metadata_table(&records)?).await?;
    Ok(records)
}

/// Full enrichment: subset, fetch, then the joined, error and topic tables.
pub async fn run_pipeline(
    dataset: Dataset,
    manager: &FetchManager,
    sink: &dyn TableSink,
    options: &PipelineOptions,
) -> Result<PipelineSummary> {
    let dataset = match &options.subset {
        Some(criteria) => {
            let subset = criteria.apply(&dataset, &manager.options().columns);
            if subset.is_empty() && !dataset.is_empty() {
                warn!("Study subset is empty; the dataset may lack the selection columns");
            }
            subset
        }
        None => dataset,
    };
    info!("🧾 Enriching {} articles into {}", dataset.len(), sink.describe());

    let records = fetch_metadata(&dataset, manager, sink).await?;

    let combined = combined_table(&records, &dataset, options.with_mncs)?;
    sink.write_table(&combined).await?;
    sink.write_table(&errors_table(&records, &dataset)?).await?;

    let mut topics = aggregate_topics(&records);
    name_topics(&mut topics, manager.source().as_ref()).await;
    sink.write_table(&topics_table(&topics)?).await?;

    let failed = records.iter().filter(|r| r.error().is_some()).count();
    Ok(PipelineSummary {
        articles: records.len(),
        resolved: records.len() - failed,
        failed,
        combined: combined.len(),
        topics: topics.len(),
    })
}
