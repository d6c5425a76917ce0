use oa_core::{Error, PageFetcher, ResolvedVia, Result, Work, WorkSource};
use std::sync::Arc;
use crate::doi::{extract_doi, extract_doi_from_html};
use crate::logging::Logger;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found { via: ResolvedVia, work: Work },
    /// No tier matched. `reason` carries a recoverable failure seen on the way,
    /// such as a landing page that refused the request.
    NotFound { reason: Option<String> },
}

fn is_http(link: &str) -> bool {
    link.starts_with("http://") || link.starts_with("https://")
}

/// Resolves an article to a work: DOI in the link, then landing page URL,
/// then a DOI found on the landing page, then exact title.
pub struct Resolver {
    source: Arc<dyn WorkSource>,
    pages: Arc<dyn PageFetcher>,
}

impl Resolver {
    pub fn new(source: Arc<dyn WorkSource>, pages: Arc<dyn PageFetcher>) -> Self {
        Self { source, pages }
    }

    pub fn source(&self) -> &Arc<dyn WorkSource> {
        &self.source
    }

    /// Walk the fallback chain. Errors from the metadata API abort the chain;
    /// an unreachable landing page only skips its tier.
    pub async fn resolve(&self, link: &str, title: &str, logger: &Logger) -> Result<Resolution> {
        let link_doi = extract_doi(link);
        if let Some(doi) = &link_doi {
            logger.debug(&format!("looking up DOI {}", doi));
            if let Some(work) = self.source.work_by_doi(doi).await? {
                return Ok(Resolution::Found { via: ResolvedVia::Doi, work });
            }
        }

        let mut reason = None;
        if is_http(link) {
            logger.debug("looking up landing page");
            if let Some(work) = self.source.works_by_landing_page(link).await?.into_iter().next() {
                return Ok(Resolution::Found { via: ResolvedVia::LandingPage, work });
            }

            match self.pages.fetch_page(link).await {
                Ok(html) => match extract_doi_from_html(&html) {
                    Some(doi) if !link_doi.as_deref().is_some_and(|d| d.eq_ignore_ascii_case(&doi)) => {
                        logger.debug(&format!("landing page names DOI {}", doi));
                        if let Some(work) = self.source.work_by_doi(&doi).await? {
                            return Ok(Resolution::Found { via: ResolvedVia::LandingPageDoi, work });
                        }
                    }
                    Some(_) => {}
                    None => logger.debug("no DOI on landing page"),
                },
                Err(e) => {
                    logger.debug(&format!("landing page unavailable: {}", e));
                    reason = Some(e.to_string());
                }
            }
        }

        if !title.is_empty() {
            logger.debug("searching by title");
            if let Some(work) = self.work_by_exact_title(title).await? {
                return Ok(Resolution::Found { via: ResolvedVia::Title, work });
            }
        }

        Ok(Resolution::NotFound { reason })
    }

    /// The single work whose title equals `title`, ignoring case and
    /// surrounding whitespace. Several exact matches are an error.
    async fn work_by_exact_title(&self, title: &str) -> Result<Option<Work>> {
        let normalized = title.trim().to_lowercase();
        let mut matches: Vec<Work> = self
            .source
            .works_by_title(&normalized)
            .await?
            .into_iter()
            .filter(|w| w.normalized_title().as_deref() == Some(normalized.as_str()))
            .collect();

        if matches.len() > 1 {
            return Err(Error::AmbiguousTitle(normalized));
        }
        Ok(matches.pop())
    }
}
