use async_trait::async_trait;
use crate::types::{Topic, Work};
use crate::Result;

#[async_trait]
pub trait WorkSource: Send + Sync {
    /// Look up a single work by DOI. `Ok(None)` when the database has no such work.
    async fn work_by_doi(&self, doi: &str) -> Result<Option<Work>>;

    /// Works whose locations include the given landing page URL
    async fn works_by_landing_page(&self, url: &str) -> Result<Vec<Work>>;

    /// Works matching a title search
    async fn works_by_title(&self, title: &str) -> Result<Vec<Work>>;

    /// Look up a topic by its short id (e.g. `T10066`)
    async fn topic(&self, id: &str) -> Result<Topic>;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of an article landing page
    async fn fetch_page(&self, url: &str) -> Result<String>;
}
