use oa_core::{ArticleRow, Error, Result};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_LINK_COLUMN: &str = "PAPER_LINK";
pub const DEFAULT_TITLE_COLUMN: &str = "PAPER_TITLE";
pub const SHARING_CLASS_COLUMN: &str = "data_sharing_class";

/// Marker the curators use for articles that never got a public link.
const UNPUBLISHED: &str = "UNPUBLISHED";

/// Names of the columns that identify an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetColumns {
    pub link: String,
    pub title: String,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            link: DEFAULT_LINK_COLUMN.to_string(),
            title: DEFAULT_TITLE_COLUMN.to_string(),
        }
    }
}

/// How much of its eye-movement data an article shares, coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SharingClass {
    None,
    Ppt,
    Trial,
    Fixation,
}

impl SharingClass {
    /// Finest granularity flagged on the row wins.
    pub fn classify(row: &ArticleRow) -> Self {
        if row.is_yes("BY_FIXATION") {
            SharingClass::Fixation
        } else if row.is_yes("BY_TRIAL") {
            SharingClass::Trial
        } else if row.is_yes("BY_PPT") {
            SharingClass::Ppt
        } else {
            SharingClass::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SharingClass::None => "NONE",
            SharingClass::Ppt => "PPT",
            SharingClass::Trial => "TRIAL",
            SharingClass::Fixation => "FIXATION",
        }
    }
}

impl fmt::Display for SharingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The article spreadsheet: ordered headers plus one [`ArticleRow`] per record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<ArticleRow>,
}

impl Dataset {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut row = ArticleRow::new(index);
            for (header, value) in headers.iter().zip(record.iter()) {
                row.set(header, value);
            }
            rows.push(row);
        }

        debug!("Read {} rows with {} columns", rows.len(), headers.len());
        Ok(Self { headers, rows })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InvalidArgument(format!(
                "The specified dataset file does not exist: {}",
                path.display()
            )));
        }
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!("📄 Loaded {} articles from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(Error::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Rows keyed by their source index.
    pub fn index(&self) -> HashMap<usize, &ArticleRow> {
        self.rows.iter().map(|r| (r.index, r)).collect()
    }

    /// Drop unusable rows and attach the sharing class label.
    ///
    /// Rows lacking both link and title go first, then duplicate
    /// (link, title) pairs, keeping the first occurrence. Unpublished
    /// articles are dropped last.
    pub fn clean(self, columns: &DatasetColumns) -> Result<Self> {
        self.require_columns(&[columns.link.as_str(), columns.title.as_str()])?;

        let before = self.rows.len();
        let mut seen = HashSet::new();
        let mut headers = self.headers;
        if !headers.iter().any(|h| h == SHARING_CLASS_COLUMN) {
            headers.push(SHARING_CLASS_COLUMN.to_string());
        }

        let rows: Vec<ArticleRow> = self
            .rows
            .into_iter()
            .filter(|row| row.get(&columns.link).is_some() || row.get(&columns.title).is_some())
            .filter(|row| seen.insert((row.text(&columns.link), row.text(&columns.title))))
            .map(|mut row| {
                let class = SharingClass::classify(&row);
                row.set(SHARING_CLASS_COLUMN, class.as_str());
                row
            })
            .filter(|row| row.get(&columns.link) != Some(UNPUBLISHED))
            .collect();

        debug!("Cleaning kept {} of {} rows", rows.len(), before);
        Ok(Self { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
PAPER_LINK,PAPER_TITLE,BY_PPT,BY_TRIAL,BY_FIXATION
https://doi.org/10.1167/jov.21.3.1,Search A,YES,NO,NO
,,YES,YES,YES
https://doi.org/10.1167/jov.21.3.1,Search A,NO,NO,NO
UNPUBLISHED,Search B,NO,NO,NO
https://example.org/c,Search C,YES,YES,NO
,Search D,YES,YES,YES
https://example.org/e,,NO,NO,NO
";

    fn load() -> Dataset {
        Dataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_from_reader_keeps_source_index() {
        let dataset = load();
        assert_eq!(dataset.len(), 7);
        assert_eq!(dataset.headers[0], "PAPER_LINK");
        assert_eq!(dataset.rows[4].index, 4);
        assert_eq!(dataset.rows[4].get("PAPER_TITLE"), Some("Search C"));
    }

    #[test]
    fn test_clean_filters_and_labels() {
        let cleaned = load().clean(&DatasetColumns::default()).unwrap();
        let indices: Vec<usize> = cleaned.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 4, 5, 6]);

        let classes: Vec<&str> = cleaned
            .rows
            .iter()
            .map(|r| r.get(SHARING_CLASS_COLUMN).unwrap())
            .collect();
        assert_eq!(classes, vec!["PPT", "TRIAL", "FIXATION", "NONE"]);
        assert!(cleaned.has_column(SHARING_CLASS_COLUMN));
    }

    #[test]
    fn test_clean_requires_identifying_columns() {
        let dataset = Dataset::from_reader("TITLE\nfoo\n".as_bytes()).unwrap();
        let err = dataset.clean(&DatasetColumns::default()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "PAPER_LINK"));
    }

    #[test]
    fn test_sharing_class_finest_wins() {
        let row = ArticleRow::new(0)
            .with_value("BY_PPT", "YES")
            .with_value("BY_FIXATION", "YES");
        assert_eq!(SharingClass::classify(&row), SharingClass::Fixation);
        assert_eq!(SharingClass::classify(&ArticleRow::new(1)), SharingClass::None);
        assert!(SharingClass::Trial > SharingClass::Ppt);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Dataset::from_path(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
