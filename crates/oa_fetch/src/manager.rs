use kdam::{tqdm, BarExt};
use oa_core::{ArticleRow, Error, FetchRecord, PageFetcher, Result, WorkSource};
use oa_tables::DatasetColumns;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use crate::logging::Logger;
use crate::resolver::{Resolution, Resolver};

/// Pause between rows. Keeps a single client under the API's limit of
/// 100 requests per second.
pub const DEFAULT_SLEEP: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub sleep: Duration,
    pub verbose: bool,
    pub columns: DatasetColumns,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            sleep: DEFAULT_SLEEP,
            verbose: true,
            columns: DatasetColumns::default(),
        }
    }
}

impl FetchOptions {
    /// Set the pause from a number of seconds, rejecting negative or
    /// non-finite values.
    pub fn with_sleep_secs(mut self, secs: f64) -> Result<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(Error::InvalidArgument("sleep period must be non-negative".to_string()));
        }
        self.sleep = Duration::from_secs_f64(secs);
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_columns(mut self, columns: DatasetColumns) -> Self {
        self.columns = columns;
        self
    }
}

/// Resolves spreadsheet rows one after another and captures failures per row.
pub struct FetchManager {
    resolver: Resolver,
    options: FetchOptions,
}

impl FetchManager {
    pub fn new(source: Arc<dyn WorkSource>, pages: Arc<dyn PageFetcher>, options: FetchOptions) -> Self {
        Self {
            resolver: Resolver::new(source, pages),
            options,
        }
    }

    pub fn source(&self) -> &Arc<dyn WorkSource> {
        self.resolver.source()
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Resolve one article. Never fails: errors end up in the record.
    pub async fn fetch_single_metadata(&self, index: usize, link: &str, title: &str) -> FetchRecord {
        let logger = Logger::new().with_prefix(format!("[row {}]", index));
        if link.is_empty() && title.is_empty() {
            return self.on_error(&logger, index, link, title, "missing link and title".to_string());
        }

        match self.resolver.resolve(link, title, &logger).await {
            Ok(Resolution::Found { via, work }) => {
                logger.debug(&format!("resolved via {} as {}", via, work.short_id()));
                FetchRecord::resolved(index, link, title, via, &work)
            }
            Ok(Resolution::NotFound { reason }) => {
                let message = reason.unwrap_or_else(|| "no matching work found".to_string());
                self.on_error(&logger, index, link, title, message)
            }
            Err(e) => self.on_error(&logger, index, link, title, e.to_string()),
        }
    }

    fn on_error(&self, logger: &Logger, index: usize, link: &str, title: &str, message: String) -> FetchRecord {
        let subject = if link.is_empty() { title } else { link };
        let line = format!("Error fetching metadata for {}: {}", subject, message);
        if self.options.verbose {
            logger.warn(&line);
        } else {
            logger.debug(&line);
        }
        FetchRecord::failed(index, link, title, message)
    }

    /// Resolve every row in order, pausing between rows.
    pub async fn fetch_all_metadata(&self, rows: &[ArticleRow]) -> Result<Vec<FetchRecord>> {
        let mut progress = self
            .options
            .verbose
            .then(|| tqdm!(total = rows.len(), desc = "Fetching metadata"));

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let link = row.text(&self.options.columns.link);
            let title = row.text(&self.options.columns.title);
            records.push(self.fetch_single_metadata(row.index, &link, &title).await);

            if let Some(bar) = progress.as_mut() {
                bar.update(1)?;
            }
            if !self.options.sleep.is_zero() {
                sleep(self.options.sleep).await;
            }
        }
        if progress.is_some() {
            eprintln!();
        }

        let failed = records.iter().filter(|r| r.error().is_some()).count();
        info!("🔎 Resolved {} of {} articles ({} failed)", records.len() - failed, records.len(), failed);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::{work, MockPages, MockSource};
    use oa_core::ResolvedVia;

    fn manager(source: MockSource) -> FetchManager {
        let options = FetchOptions::default().with_verbose(false).with_sleep_secs(0.0).unwrap();
        FetchManager::new(Arc::new(source), Arc::new(MockPages::default()), options)
    }

    #[test]
    fn test_sleep_must_be_non_negative() {
        assert!(FetchOptions::default().with_sleep_secs(-0.5).is_err());
        assert!(FetchOptions::default().with_sleep_secs(f64::NAN).is_err());
        let options = FetchOptions::default().with_sleep_secs(0.25).unwrap();
        assert_eq!(options.sleep, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_missing_link_and_title() {
        let record = manager(MockSource::default()).fetch_single_metadata(5, "", "").await;
        assert_eq!(record.index, 5);
        assert_eq!(record.error(), Some("missing link and title"));
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_order_and_captures_errors() {
        let mut source = MockSource::default();
        source.by_doi.insert("10.1167/jov.1.1.1".to_string(), work("W1", "First"));
        source.by_title.insert("third".to_string(), vec![work("W3", "Third")]);
        source.by_title.insert("dup".to_string(), vec![work("W4", "Dup"), work("W5", "dup")]);

        let rows = vec![
            ArticleRow::new(0)
                .with_value("PAPER_LINK", "https://doi.org/10.1167/jov.1.1.1")
                .with_value("PAPER_TITLE", "First"),
            ArticleRow::new(2).with_value("PAPER_LINK", "not a url"),
            ArticleRow::new(3).with_value("PAPER_TITLE", "Third"),
            ArticleRow::new(7).with_value("PAPER_TITLE", "Dup"),
        ];

        let records = manager(source).fetch_all_metadata(&rows).await.unwrap();
        let indices: Vec<usize> = records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2, 3, 7]);

        assert_eq!(records[0].via(), Some(ResolvedVia::Doi));
        assert_eq!(records[0].metadata().unwrap().openalex_id, "W1");
        assert_eq!(records[1].error(), Some("no matching work found"));
        assert_eq!(records[2].via(), Some(ResolvedVia::Title));
        assert!(records[3].error().unwrap().starts_with("multiple works found"));
    }

    #[tokio::test]
    async fn test_custom_columns() {
        let mut source = MockSource::default();
        source.by_title.insert("renamed".to_string(), vec![work("W1", "Renamed")]);
        let options = FetchOptions::default()
            .with_verbose(false)
            .with_sleep_secs(0.0)
            .unwrap()
            .with_columns(DatasetColumns {
                link: "url".to_string(),
                title: "name".to_string(),
            });
        let manager = FetchManager::new(Arc::new(source), Arc::new(MockPages::default()), options);

        let rows = vec![ArticleRow::new(0).with_value("name", "Renamed")];
        let records = manager.fetch_all_metadata(&rows).await.unwrap();
        assert_eq!(records[0].via(), Some(ResolvedVia::Title));
    }
}
