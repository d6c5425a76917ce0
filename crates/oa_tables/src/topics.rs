use crate::table::{Cell, Table};
use oa_core::{FetchRecord, Result, WorkSource};
use std::collections::HashMap;
use tracing::warn;

pub const TOPICS_TABLE: &str = "topics";

/// How often a research topic was assigned across the resolved works.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub topic_id: String,
    pub name: Option<String>,
    pub count: usize,
    pub total_score: f64,
}

impl TopicSummary {
    pub fn average_score(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_score / self.count as f64
        }
    }
}

/// Count and sum topic scores over every resolved record, most frequent first.
pub fn aggregate_topics(records: &[FetchRecord]) -> Vec<TopicSummary> {
    let mut by_id: HashMap<&str, TopicSummary> = HashMap::new();
    for metadata in records.iter().filter_map(|r| r.metadata()) {
        for (topic_id, score) in &metadata.topics {
            let summary = by_id.entry(topic_id.as_str()).or_insert_with(|| TopicSummary {
                topic_id: topic_id.clone(),
                name: None,
                count: 0,
                total_score: 0.0,
            });
            summary.count += 1;
            summary.total_score += score;
        }
    }

    let mut summaries: Vec<TopicSummary> = by_id.into_values().collect();
    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic_id.cmp(&b.topic_id)));
    summaries
}

/// Fill in display names from the topic endpoint. A failed lookup leaves
/// the name empty rather than discarding the aggregate.
pub async fn name_topics(summaries: &mut [TopicSummary], source: &dyn WorkSource) {
    for summary in summaries.iter_mut() {
        match source.topic(&summary.topic_id).await {
            Ok(topic) => summary.name = Some(topic.display_name),
            Err(e) => warn!("Failed to look up topic {}: {}", summary.topic_id, e),
        }
    }
}

pub fn topics_table(summaries: &[TopicSummary]) -> Result<Table> {
    let columns = ["topic_id", "name", "count", "total_score", "average_score"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let mut table = Table::new(TOPICS_TABLE, columns);
    for summary in summaries {
        table.push_row(vec![
            Cell::text(&summary.topic_id),
            Cell::from(summary.name.clone()),
            Cell::Int(summary.count as i64),
            Cell::Float(summary.total_score),
            Cell::Float(summary.average_score()),
        ])?;
    }
    Ok(table)
}
