use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cell values a spreadsheet export uses for "no value".
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "#N/A", "<NA>"];

/// One row of the article spreadsheet.
///
/// `index` is the row's position in the source file and survives filtering,
/// so fetched metadata can always be joined back to the row it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleRow {
    pub index: usize,
    pub values: BTreeMap<String, String>,
}

impl ArticleRow {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, column: &str, value: &str) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.values.insert(column.to_string(), value.into());
    }

    /// Trimmed cell value, `None` when the cell is absent or holds a missing marker.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !MISSING_MARKERS.contains(v))
    }

    /// Cell value coerced to a string: missing cells become empty.
    pub fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }

    pub fn is_yes(&self, column: &str) -> bool {
        self.get(column) == Some("YES")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkTopic {
    pub id: String,
    pub display_name: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearCount {
    pub year: i32,
    pub cited_by_count: u64,
}

/// A work as returned by the OpenAlex works endpoint. Only the fields the
/// pipeline reads are modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Work {
    pub id: String,
    pub doi: Option<String>,
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub updated_date: Option<String>,
    #[serde(rename = "type")]
    pub work_type: Option<String>,
    pub publication_year: Option<i32>,
    pub publication_date: Option<String>,
    pub topics: Vec<WorkTopic>,
    pub fwci: Option<f64>,
    pub is_retracted: Option<bool>,
    pub cited_by_count: Option<u64>,
    pub counts_by_year: Vec<YearCount>,
}

impl Work {
    /// The OpenAlex id without its URL prefix (`https://openalex.org/W123` -> `W123`).
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Title trimmed and lowercased, falling back to `display_name`.
    pub fn normalized_title(&self) -> Option<String> {
        self.title
            .as_deref()
            .or(self.display_name.as_deref())
            .map(|t| t.trim().to_lowercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub id: String,
    pub display_name: String,
}

fn short_id(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

/// Parse an OpenAlex timestamp or date as UTC. Values without an offset are
/// taken to be UTC already; a bare date is midnight.
pub fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Flattened citation and topic metadata for one resolved work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkMetadata {
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
    #[serde(rename = "OpenAlexID")]
    pub openalex_id: String,
    #[serde(rename = "LastUpdate")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(rename = "PublicationType")]
    pub publication_type: Option<String>,
    #[serde(rename = "PublicationYear")]
    pub publication_year: Option<i32>,
    #[serde(rename = "PublicationDate")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(rename = "Topics")]
    pub topics: BTreeMap<String, f64>,
    #[serde(rename = "FieldWeightedCitationIndex")]
    pub fwci: Option<f64>,
    #[serde(rename = "IsRetracted")]
    pub is_retracted: Option<bool>,
    #[serde(rename = "TotalCitations")]
    pub total_citations: Option<u64>,
    #[serde(rename = "CitationsByYear")]
    pub citations_by_year: BTreeMap<i32, u64>,
}

impl WorkMetadata {
    pub fn from_work(work: &Work) -> Self {
        Self {
            doi: work.doi.clone(),
            openalex_id: work.short_id().to_string(),
            last_update: work.updated_date.as_deref().and_then(parse_utc),
            publication_type: work.work_type.clone(),
            publication_year: work.publication_year,
            publication_date: work.publication_date.as_deref().and_then(parse_utc),
            topics: work
                .topics
                .iter()
                .map(|t| (short_id(&t.id).to_string(), t.score))
                .collect(),
            fwci: work.fwci,
            is_retracted: work.is_retracted,
            total_citations: work.cited_by_count,
            citations_by_year: work
                .counts_by_year
                .iter()
                .map(|c| (c.year, c.cited_by_count))
                .collect(),
        }
    }

    /// Time between publication and the last database update.
    pub fn pub_to_update(&self) -> Option<chrono::Duration> {
        Some(self.last_update? - self.publication_date?)
    }
}

/// Which tier of the fallback chain produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    Doi,
    LandingPage,
    LandingPageDoi,
    Title,
}

impl fmt::Display for ResolvedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolvedVia::Doi => "doi",
            ResolvedVia::LandingPage => "landing_page",
            ResolvedVia::LandingPageDoi => "landing_page_doi",
            ResolvedVia::Title => "title",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Resolved { via: ResolvedVia, metadata: WorkMetadata },
    Failed { error: String },
}

/// The result of resolving one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub index: usize,
    pub link: String,
    pub title: String,
    pub outcome: FetchOutcome,
}

impl FetchRecord {
    pub fn resolved(index: usize, link: &str, title: &str, via: ResolvedVia, work: &Work) -> Self {
        Self {
            index,
            link: link.to_string(),
            title: title.to_string(),
            outcome: FetchOutcome::Resolved {
                via,
                metadata: WorkMetadata::from_work(work),
            },
        }
    }

    pub fn failed(index: usize, link: &str, title: &str, error: impl fmt::Display) -> Self {
        Self {
            index,
            link: link.to_string(),
            title: title.to_string(),
            outcome: FetchOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn metadata(&self) -> Option<&WorkMetadata> {
        match &self.outcome {
            FetchOutcome::Resolved { metadata, .. } => Some(metadata),
            FetchOutcome::Failed { .. } => None,
        }
    }

    pub fn via(&self) -> Option<ResolvedVia> {
        match &self.outcome {
            FetchOutcome::Resolved { via, .. } => Some(*via),
            FetchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Failed { error } => Some(error),
            FetchOutcome::Resolved { .. } => None,
        }
    }
}
