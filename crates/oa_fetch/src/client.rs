use async_trait::async_trait;
use oa_core::{Error, PageFetcher, Result, Topic, Work, WorkSource};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use crate::config::OpenAlexConfig;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Work>,
}

/// Client for the OpenAlex REST API.
#[derive(Clone)]
pub struct OpenAlexClient {
    http: reqwest::Client,
    config: OpenAlexConfig,
}

impl OpenAlexClient {
    pub fn new(config: OpenAlexConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }

    /// Endpoint URL with the polite-pool and key parameters attached.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(email) = &self.config.email {
                query.append_pair("mailto", email);
            }
            if let Some(key) = &self.config.api_key {
                query.append_pair("api_key", key);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    /// GET a JSON document. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!("GET {}", url.path());
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                url: url.path().to_string(),
            });
        }
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn filter_works(&self, filter: &str) -> Result<Vec<Work>> {
        let mut url = self.endpoint("works")?;
        url.query_pairs_mut().append_pair("filter", filter);
        let response: Option<ListResponse> = self.get_json(url).await?;
        Ok(response.map(|r| r.results).unwrap_or_default())
    }
}

/// Commas separate clauses in OpenAlex filters, so they cannot appear in a
/// search value.
fn filter_value(value: &str) -> String {
    value.replace(',', " ")
}

/// URLs must match exactly, so their commas are percent-encoded instead.
fn filter_url(url: &str) -> String {
    url.replace(',', "%2C")
}

#[async_trait]
impl WorkSource for OpenAlexClient {
    async fn work_by_doi(&self, doi: &str) -> Result<Option<Work>> {
        let url = self.endpoint(&format!("works/doi:{}", doi))?;
        self.get_json(url).await
    }

    async fn works_by_landing_page(&self, url: &str) -> Result<Vec<Work>> {
        self.filter_works(&format!("locations.landing_page_url:{}", filter_url(url))).await
    }

    async fn works_by_title(&self, title: &str) -> Result<Vec<Work>> {
        self.filter_works(&format!("title.search:{}", filter_value(title))).await
    }

    async fn topic(&self, id: &str) -> Result<Topic> {
        let url = self.endpoint(&format!("topics/{}", id))?;
        let path = url.path().to_string();
        self.get_json(url)
            .await?
            .ok_or_else(|| Error::Api { status: 404, url: path })
    }
}

/// Fetches publisher landing pages.
#[derive(Clone)]
pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(config: &OpenAlexConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.landing_page_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidUrl(url.to_string()));
        }
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::LandingPage(format!("{} ({})", url, e)))?;
        if !response.status().is_success() {
            return Err(Error::LandingPage(format!("{} ({})", url, response.status())));
        }
        Ok(response.text().await?)
    }
}
