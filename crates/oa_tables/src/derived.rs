use crate::citation::mean_normalized_citation_scores;
use crate::dataset::Dataset;
use crate::table::{Cell, Table};
use oa_core::{ArticleRow, FetchRecord, Result, WorkMetadata};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

pub const METADATA_TABLE: &str = "metadata";
pub const COMBINED_TABLE: &str = "combined";
pub const ERRORS_TABLE: &str = "errors";
pub const MNCS_COLUMN: &str = "MeanNormalizedCitationScore";

const LEADING_COLUMNS: &[&str] = &[
    "idx",
    "link",
    "title",
    "DOI",
    "OpenAlexID",
    "LastUpdate",
    "PublicationType",
    "PublicationYear",
    "PublicationDate",
    "Pub2UpdateTime",
    "Topics",
    "FieldWeightedCitationIndex",
    "IsRetracted",
    "TotalCitations",
];

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Citation years seen across all records, ascending.
fn citation_years(records: &[FetchRecord]) -> Vec<i32> {
    records
        .iter()
        .filter_map(|r| r.metadata())
        .flat_map(|m| m.citations_by_year.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn metadata_columns(years: &[i32]) -> Vec<String> {
    LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(years.iter().map(|y| format!("Citations{}", y)))
        .chain(["ResolvedVia".to_string()])
        .collect()
}

fn metadata_cells(record: &FetchRecord, years: &[i32]) -> Result<Vec<Cell>> {
    let mut cells = vec![
        Cell::Int(record.index as i64),
        Cell::text(&record.link),
        Cell::text(&record.title),
    ];

    match record.metadata() {
        Some(m) => {
            let topics = if m.topics.is_empty() {
                Cell::Null
            } else {
                Cell::Text(serde_json::to_string(&m.topics)?)
            };
            cells.extend([
                Cell::from(m.doi.clone()),
                Cell::text(&m.openalex_id),
                Cell::from(m.last_update.map(|d| d.to_rfc3339())),
                Cell::from(m.publication_type.clone()),
                Cell::from(m.publication_year.map(i64::from)),
                Cell::from(m.publication_date.map(|d| d.to_rfc3339())),
                Cell::from(pub_to_update_days(m)),
                topics,
                Cell::from(m.fwci),
                Cell::from(m.is_retracted),
                Cell::from(m.total_citations.map(|c| c as i64)),
            ]);
            cells.extend(
                years
                    .iter()
                    .map(|y| Cell::from(m.citations_by_year.get(y).map(|c| *c as i64))),
            );
        }
        None => cells.extend(std::iter::repeat(Cell::Null).take(LEADING_COLUMNS.len() - 3 + years.len())),
    }

    cells.push(Cell::from(record.via().map(|v| v.to_string())));
    Ok(cells)
}

/// Publication-to-last-update interval in fractional days.
fn pub_to_update_days(metadata: &WorkMetadata) -> Option<f64> {
    metadata
        .pub_to_update()
        .map(|d| d.num_seconds() as f64 / SECONDS_PER_DAY)
}

/// Names for the article columns appended after `fixed`. A header that
/// clashes with a fixed column gets a `dataset_` prefix.
fn article_columns(fixed: &[String], headers: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = fixed.iter().chain(headers).cloned().collect();
    headers
        .iter()
        .map(|h| {
            if !fixed.contains(h) {
                return h.clone();
            }
            let mut name = format!("dataset_{}", h);
            while taken.contains(&name) {
                name = format!("dataset_{}", name);
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

fn article_cells(row: Option<&ArticleRow>, headers: &[String]) -> Vec<Cell> {
    headers
        .iter()
        .map(|h| Cell::from(row.and_then(|r| r.get(h)).map(String::from)))
        .collect()
}

/// One row per fetch record, failures included.
pub fn metadata_table(records: &[FetchRecord]) -> Result<Table> {
    let years = citation_years(records);
    let mut columns = metadata_columns(&years);
    columns.push("Error".to_string());

    let mut table = Table::new(METADATA_TABLE, columns);
    for record in records {
        let mut cells = metadata_cells(record, &years)?;
        cells.push(Cell::from(record.error().map(String::from)));
        table.push_row(cells)?;
    }
    Ok(table)
}

/// Successfully resolved records joined to their article rows.
///
/// Records without a DOI are dropped, duplicate DOIs keep their first
/// occurrence and only works known not to be retracted survive.
pub fn combined_table(records: &[FetchRecord], dataset: &Dataset, with_mncs: bool) -> Result<Table> {
    let rows = dataset.index();
    let mut seen = HashSet::new();

    let kept: Vec<(&FetchRecord, &WorkMetadata)> = records
        .iter()
        .filter_map(|r| r.metadata().map(|m| (r, m)))
        .filter(|(r, _)| rows.contains_key(&r.index))
        .filter(|(_, m)| match &m.doi {
            Some(doi) => seen.insert(doi.to_lowercase()),
            None => false,
        })
        .filter(|(_, m)| m.is_retracted == Some(false))
        .collect();

    let kept_records: Vec<FetchRecord> = kept.iter().map(|(r, _)| (*r).clone()).collect();
    let years = citation_years(&kept_records);
    let mut columns = metadata_columns(&years);
    let mut fixed = columns.clone();
    if with_mncs {
        fixed.push(MNCS_COLUMN.to_string());
    }
    columns.extend(article_columns(&fixed, &dataset.headers));
    if with_mncs {
        columns.push(MNCS_COLUMN.to_string());
    }

    let scores = if with_mncs {
        let metadata: Vec<&WorkMetadata> = kept.iter().map(|(_, m)| *m).collect();
        mean_normalized_citation_scores(&metadata)
    } else {
        Vec::new()
    };

    let mut table = Table::new(COMBINED_TABLE, columns);
    for (i, (record, _)) in kept.iter().enumerate() {
        let mut cells = metadata_cells(record, &years)?;
        cells.extend(article_cells(rows.get(&record.index).copied(), &dataset.headers));
        if with_mncs {
            cells.push(Cell::from(scores[i]));
        }
        table.push_row(cells)?;
    }

    debug!("Combined table holds {} of {} records", table.len(), records.len());
    Ok(table)
}

/// Failed records joined to their article rows.
pub fn errors_table(records: &[FetchRecord], dataset: &Dataset) -> Result<Table> {
    let rows = dataset.index();
    let mut columns: Vec<String> = ["idx", "link", "title", "Error"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let article = article_columns(&columns, &dataset.headers);
    columns.extend(article);

    let mut table = Table::new(ERRORS_TABLE, columns);
    for record in records {
        let Some(error) = record.error() else {
            continue;
        };
        let mut cells = vec![
            Cell::Int(record.index as i64),
            Cell::text(&record.link),
            Cell::text(&record.title),
            Cell::text(error),
        ];
        cells.extend(article_cells(rows.get(&record.index).copied(), &dataset.headers));
        table.push_row(cells)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oa_core::{ResolvedVia, Work, WorkTopic, YearCount};

    fn work(id: &str, doi: Option<&str>, retracted: Option<bool>, citations: u64) -> Work {
        Work {
            id: format!("https://openalex.org/{}", id),
            doi: doi.map(String::from),
            publication_year: Some(2019),
            publication_date: Some("2019-03-01".to_string()),
            updated_date: Some("2019-03-11T00:00:00".to_string()),
            is_retracted: retracted,
            cited_by_count: Some(citations),
            topics: vec![WorkTopic {
                id: "https://openalex.org/T1".to_string(),
                display_name: None,
                score: 0.9,
            }],
            counts_by_year: vec![YearCount { year: 2021, cited_by_count: citations }],
            ..Default::default()
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_reader(
            "PAPER_LINK,PAPER_TITLE,CODE\nl0,t0,YES\nl1,t1,NO\nl2,t2,YES\nl3,t3,NO\nl4,t4,NO\n".as_bytes(),
        )
        .unwrap()
    }

    fn records() -> Vec<FetchRecord> {
        vec![
            FetchRecord::resolved(0, "l0", "t0", ResolvedVia::Doi, &work("W0", Some("https://doi.org/10.1/A"), Some(false), 10)),
            FetchRecord::resolved(1, "l1", "t1", ResolvedVia::Title, &work("W1", Some("https://doi.org/10.1/a"), Some(false), 20)),
            FetchRecord::resolved(2, "l2", "t2", ResolvedVia::LandingPage, &work("W2", Some("https://doi.org/10.1/b"), Some(true), 30)),
            FetchRecord::resolved(3, "l3", "t3", ResolvedVia::Doi, &work("W3", None, Some(false), 40)),
            FetchRecord::failed(4, "l4", "t4", "no matching work found"),
        ]
    }

    #[test]
    fn test_metadata_table_includes_failures() {
        let table = metadata_table(&records()).unwrap();
        assert_eq!(table.len(), 5);
        assert!(table.column_index("Citations2021").is_some());
        assert_eq!(table.get(0, "OpenAlexID"), Some(&Cell::text("W0")));
        assert_eq!(table.get(0, "Pub2UpdateTime"), Some(&Cell::Float(10.0)));
        assert_eq!(table.get(0, "Topics"), Some(&Cell::text(r#"{"T1":0.9}"#)));
        assert_eq!(table.get(1, "ResolvedVia"), Some(&Cell::text("title")));
        assert_eq!(table.get(4, "DOI"), Some(&Cell::Null));
        assert_eq!(table.get(4, "Error"), Some(&Cell::text("no matching work found")));
    }

    #[test]
    fn test_combined_table_dedups_and_drops_retracted() {
        let table = combined_table(&records(), &dataset(), false).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "OpenAlexID"), Some(&Cell::text("W0")));
        assert_eq!(table.get(0, "CODE"), Some(&Cell::text("YES")));
        assert!(table.column_index(MNCS_COLUMN).is_none());
    }

    #[test]
    fn test_combined_table_with_mncs() {
        let table = combined_table(&records(), &dataset(), true).unwrap();
        assert_eq!(table.get(0, MNCS_COLUMN), Some(&Cell::Float(1.0)));
    }

    #[test]
    fn test_clashing_article_headers_are_prefixed() {
        let dataset = Dataset::from_reader("link,title,DOI\nl0,t0,x\nl1,t1,y\nl2,t2,z\nl3,t3,w\nl4,t4,v\n".as_bytes()).unwrap();

        let combined = combined_table(&records(), &dataset, false).unwrap();
        assert_eq!(combined.columns.iter().filter(|c| *c == "link").count(), 1);
        assert_eq!(combined.get(0, "dataset_link"), Some(&Cell::text("l0")));
        assert_eq!(combined.get(0, "dataset_DOI"), Some(&Cell::text("x")));
        assert_eq!(combined.get(0, "DOI"), Some(&Cell::text("https://doi.org/10.1/A")));

        let errors = errors_table(&records(), &dataset).unwrap();
        assert_eq!(errors.columns, vec!["idx", "link", "title", "Error", "dataset_link", "dataset_title", "DOI"]);
        assert_eq!(errors.get(0, "dataset_title"), Some(&Cell::text("t4")));
        assert_eq!(errors.to_json_records().unwrap()[0].len(), 7);
    }

    #[test]
    fn test_errors_table() {
        let table = errors_table(&records(), &dataset()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "idx"), Some(&Cell::Int(4)));
        assert_eq!(table.get(0, "PAPER_TITLE"), Some(&Cell::text("t4")));
    }
}
